//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::BurstlineConfig;
use crate::config::secret_string;
use crate::domain::errors::BurstError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into BurstlineConfig
/// 4. Applies environment variable overrides (BURSTLINE_* prefix)
/// 5. Validates the configuration
///
/// Only upper-case names are substituted, so burst templates such as
/// `${burst_token}` pass through untouched.
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use burstline::config::loader::load_config;
///
/// let config = load_config("burstline.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<BurstlineConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(BurstError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        BurstError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: BurstlineConfig = toml::from_str(&contents)
        .map_err(|e| BurstError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        BurstError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("environment variable pattern is valid")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        // env vars in comments are left alone
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(BurstError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    value.parse().map_err(|_| {
        BurstError::Configuration(format!("{} must be true or false, got '{}'", name, value))
    })
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| BurstError::Configuration(format!("{} must be a number, got '{}'", name, value)))
}

/// Applies environment variable overrides using BURSTLINE_* prefix
///
/// Environment variables follow the pattern: BURSTLINE_<SECTION>_<KEY>
/// For example: BURSTLINE_BURST_OUTPUT_FOLDER, BURSTLINE_LICENSE_KEY
fn apply_env_overrides(config: &mut BurstlineConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("BURSTLINE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Burst overrides
    if let Ok(val) = std::env::var("BURSTLINE_BURST_OUTPUT_NAME") {
        config.burst.output_name = val;
    }
    if let Ok(val) = std::env::var("BURSTLINE_BURST_OUTPUT_FOLDER") {
        config.burst.output_folder = val;
    }
    if let Ok(val) = std::env::var("BURSTLINE_BURST_QUARANTINE_FOLDER") {
        config.burst.quarantine_folder = val;
    }
    if let Ok(val) = std::env::var("BURSTLINE_BURST_BACKUP_FOLDER") {
        config.burst.backup_folder = val;
    }
    if let Ok(val) = std::env::var("BURSTLINE_BURST_LOGS_ARCHIVES_FOLDER") {
        config.burst.logs_archives_folder = val;
    }
    if let Ok(val) = std::env::var("BURSTLINE_BURST_DELETE_FILES") {
        config.burst.delete_files = parse_bool("BURSTLINE_BURST_DELETE_FILES", &val)?;
    }
    if let Ok(val) = std::env::var("BURSTLINE_BURST_QUARANTINE_FILES") {
        config.burst.quarantine_files = parse_bool("BURSTLINE_BURST_QUARANTINE_FILES", &val)?;
    }
    if let Ok(val) = std::env::var("BURSTLINE_BURST_FAIL_JOB_IF_ANY_DISTRIBUTION_FAILS") {
        config.burst.fail_job_if_any_distribution_fails =
            parse_bool("BURSTLINE_BURST_FAIL_JOB_IF_ANY_DISTRIBUTION_FAILS", &val)?;
    }
    if let Ok(val) = std::env::var("BURSTLINE_BURST_DELAY_EACH_DISTRIBUTION_BY") {
        config.burst.delay_each_distribution_by =
            parse_number("BURSTLINE_BURST_DELAY_EACH_DISTRIBUTION_BY", &val)?;
    }

    // Distribution overrides
    if let Ok(val) = std::env::var("BURSTLINE_DISTRIBUTION_EMAIL") {
        config.distribution.email = parse_bool("BURSTLINE_DISTRIBUTION_EMAIL", &val)?;
    }
    if let Ok(val) = std::env::var("BURSTLINE_DISTRIBUTION_UPLOAD") {
        config.distribution.upload = parse_bool("BURSTLINE_DISTRIBUTION_UPLOAD", &val)?;
    }
    if let Ok(val) = std::env::var("BURSTLINE_DISTRIBUTION_WEB") {
        config.distribution.web = parse_bool("BURSTLINE_DISTRIBUTION_WEB", &val)?;
    }
    if let Ok(val) = std::env::var("BURSTLINE_DISTRIBUTION_SMS") {
        config.distribution.sms = parse_bool("BURSTLINE_DISTRIBUTION_SMS", &val)?;
    }
    if let Ok(val) = std::env::var("BURSTLINE_DISTRIBUTION_OUTBOX_FOLDER") {
        config.distribution.outbox_folder = val;
    }
    if let Ok(val) = std::env::var("BURSTLINE_DISTRIBUTION_RETRY_ENABLED") {
        config.distribution.retry.enabled =
            parse_bool("BURSTLINE_DISTRIBUTION_RETRY_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("BURSTLINE_DISTRIBUTION_RETRY_MAX_RETRIES") {
        config.distribution.retry.max_retries =
            parse_number("BURSTLINE_DISTRIBUTION_RETRY_MAX_RETRIES", &val)?;
    }

    // License overrides
    if let Ok(val) = std::env::var("BURSTLINE_LICENSE_PATH") {
        config.license.path = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("BURSTLINE_LICENSE_KEY") {
        config.license.key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("BURSTLINE_LICENSE_DEMO_LIMIT") {
        config.license.demo_limit = parse_number("BURSTLINE_LICENSE_DEMO_LIMIT", &val)?;
    }

    // State overrides
    if let Ok(val) = std::env::var("BURSTLINE_STATE_TEMP_FOLDER") {
        config.state.temp_folder = PathBuf::from(val);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("BURSTLINE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_bool("BURSTLINE_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("BURSTLINE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("BURSTLINE_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
