//! Configuration management for burstline.
//!
//! # Overview
//!
//! burstline uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`, upper-case names only)
//! - `BURSTLINE_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! Lower-case `${name}` placeholders are burst templates and are resolved per
//! token by the engine, not by the loader.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use burstline::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("burstline.toml")?;
//! println!("Burst file name: {}", config.burst.output_name);
//! println!("Temp folder: {}", config.state.temp_folder.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [burst]
//! output_name = "${id}.${output_type_extension}"
//! output_folder = "output/${input_document_name}/${now}"
//!
//! [datasource]
//! id_column = { name = "id" }
//!
//! [datasource.format]
//! type = "csv"
//!
//! [output.format]
//! type = "text"
//! template_path = "templates/letter.txt"
//!
//! [distribution]
//! email = true
//! email_to = "${email}"
//!
//! [license]
//! path = "license.toml"
//! key = "${BURSTLINE_LICENSE_KEY}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, BurstConfig, BurstlineConfig, DataSourceConfig, DataSourceKind,
    DistributionConfig, HooksConfig, IdColumn, LicenseConfig, LoggingConfig, OutputConfig,
    OutputKind, RetryConfig, StateConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
