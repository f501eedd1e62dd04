// Progress records and their persistence

pub mod progress;
pub mod store;

pub use progress::{ProgressRecord, ProgressRecordBuilder, PROGRESS_FORMAT_VERSION};
pub use store::ResumptionStore;
