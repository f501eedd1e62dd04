//! CLI command implementations
//!
//! This module contains all CLI command implementations and the exit codes
//! they return.

pub mod burst;
pub mod control;
pub mod init;
pub mod resume;
pub mod status;
pub mod validate;

use crate::domain::BurstError;

/// The command completed
pub const EXIT_SUCCESS: i32 = 0;

/// The run finished but left tokens unprocessed (pause, cancel, license)
pub const EXIT_STOPPED_EARLY: i32 = 1;

/// Configuration or argument error
pub const EXIT_CONFIG: i32 = 2;

/// The run was aborted by a fatal error
pub const EXIT_FATAL: i32 = 3;

/// Unexpected failure outside a run
pub const EXIT_UNEXPECTED: i32 = 5;

/// Exit code of a run that failed with `error`
pub fn exit_code_for(error: &BurstError) -> i32 {
    if error.is_fatal_configuration() {
        EXIT_CONFIG
    } else {
        EXIT_FATAL
    }
}
