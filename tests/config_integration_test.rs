//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with --test-threads=1
//! to avoid interference between tests.

use burstline::config::{load_config, DataSourceKind, IdColumn, OutputKind};
use burstline::domain::BurstError;
use secrecy::ExposeSecret;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("BURSTLINE_APPLICATION_LOG_LEVEL");
    std::env::remove_var("BURSTLINE_BURST_OUTPUT_FOLDER");
    std::env::remove_var("BURSTLINE_BURST_FAIL_JOB_IF_ANY_DISTRIBUTION_FAILS");
    std::env::remove_var("BURSTLINE_DISTRIBUTION_EMAIL");
    std::env::remove_var("BURSTLINE_DISTRIBUTION_RETRY_ENABLED");
    std::env::remove_var("BURSTLINE_DISTRIBUTION_RETRY_MAX_RETRIES");
    std::env::remove_var("BURSTLINE_LICENSE_DEMO_LIMIT");
    std::env::remove_var("BURSTLINE_STATE_TEMP_FOLDER");
    std::env::remove_var("TEST_BURSTLINE_LICENSE_KEY");
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[application]
log_level = "debug"

[burst]
output_name = "${customer_id}-${burst_index}.${output_type_extension}"
output_folder = "out/${input_document_name}"
quarantine_folder = "quarantine/${input_document_name}"
delete_files = true
quarantine_files = false
fail_job_if_any_distribution_fails = false
delay_each_distribution_by = 0.5
attachments = ["${extracted_file_path}", "terms.pdf"]
archive_attachments = true
archive_file_name = "${customer_id}.zip"

[datasource.format]
type = "csv"
delimiter = ";"
has_header = true

[datasource.id_column]
name = "customer_id"

[output]
extension = "txt"

[output.format]
type = "text"
template_path = "templates/statement.txt"

[distribution]
email = true
sms = true
email_to = "${email}"
sms_to = "${phone}"
outbox_folder = "spool"

[distribution.retry]
enabled = true
max_retries = 2
backoff_multiplier = 1.5

[hooks]
end_extract_document = "echo extracted"
quarantine_document = "echo quarantined"

[license]
path = "license.toml"
key = "plain-key"
demo_limit = 10

[state]
temp_folder = "/tmp/burstline-test"

[logging]
local_enabled = false
local_path = "/tmp/burstline-logs"
local_rotation = "hourly"
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.burst.output_folder, "out/${input_document_name}");
    assert!(config.burst.delete_files);
    assert!(!config.burst.quarantine_files);
    assert!(!config.burst.fail_job_if_any_distribution_fails);
    assert_eq!(config.burst.delay_each_distribution_by, 0.5);
    assert_eq!(config.burst.attachments.len(), 2);
    assert!(config.burst.archive_attachments);

    assert_eq!(
        config.datasource.format,
        DataSourceKind::Csv {
            delimiter: ';',
            has_header: true,
            quote: '"'
        }
    );
    assert_eq!(
        config.datasource.id_column,
        IdColumn::Name("customer_id".to_string())
    );
    assert_eq!(
        config.output.format,
        OutputKind::Text {
            template_path: PathBuf::from("templates/statement.txt")
        }
    );
    assert_eq!(config.output.extension(), "txt");

    assert!(config.distribution.email);
    assert!(!config.distribution.upload);
    assert!(config.distribution.sms);
    assert_eq!(config.distribution.outbox_folder, "spool");
    assert!(config.distribution.retry.enabled);
    assert_eq!(config.distribution.retry.max_retries, 2);
    assert_eq!(config.distribution.retry.backoff_multiplier, 1.5);

    assert_eq!(config.hooks.commands.len(), 2);
    assert_eq!(config.license.demo_limit, 10);
    assert!(config
        .license
        .key
        .as_ref()
        .unwrap()
        .expose_secret()
        .matches("plain-key"));
    assert_eq!(config.state.temp_folder, PathBuf::from("/tmp/burstline-test"));
    assert!(!config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[application]\nlog_level = \"info\"\n");
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.burst.output_name, "${burst_token}.${output_type_extension}");
    assert_eq!(config.burst.output_folder, "output/${input_document_name}/${now}");
    assert_eq!(config.burst.stats_file_name, "_${stats_info}.log");
    assert!(config.burst.quarantine_files);
    assert!(config.burst.fail_job_if_any_distribution_fails);
    assert_eq!(config.datasource.id_column, IdColumn::NotUsed);
    assert_eq!(config.output.extension(), "json");
    assert!(!config.distribution.any_enabled());
    assert!(!config.distribution.retry.enabled);
    assert_eq!(config.license.demo_limit, 25);
    assert_eq!(config.state.temp_folder, PathBuf::from("temp"));
}

#[test]
fn test_datasource_variants() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let json = write_config(
        "[datasource]\nid_column = \"last\"\n\n[datasource.format]\ntype = \"json\"\nrecords_pointer = \"/data/items\"\n",
    );
    let config = load_config(json.path()).unwrap();
    assert_eq!(config.datasource.id_column, IdColumn::Last);
    assert_eq!(
        config.datasource.format,
        DataSourceKind::Json {
            records_pointer: Some("/data/items".to_string())
        }
    );

    let fixed = write_config(
        "[datasource.id_column]\nindex = 1\n\n[datasource.format]\ntype = \"fixed_width\"\nwidths = [4, 10]\n",
    );
    let config = load_config(fixed.path()).unwrap();
    assert_eq!(config.datasource.id_column, IdColumn::Index(1));
    assert_eq!(
        config.datasource.format,
        DataSourceKind::FixedWidth {
            widths: vec![4, 10],
            has_header: false
        }
    );
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_BURSTLINE_LICENSE_KEY", "from-env");

    let temp_file = write_config(
        "# key = \"${NOT_SET_BUT_COMMENTED}\"\n[license]\nkey = \"${TEST_BURSTLINE_LICENSE_KEY}\"\n\n[burst]\noutput_name = \"${burst_token}.pdf\"\n",
    );
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert!(config
        .license
        .key
        .as_ref()
        .unwrap()
        .expose_secret()
        .matches("from-env"));
    // lower-case placeholders are templates, not environment variables
    assert_eq!(config.burst.output_name, "${burst_token}.pdf");

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[license]\nkey = \"${BURSTLINE_TEST_UNSET_VARIABLE}\"\n");
    let err = load_config(temp_file.path()).unwrap_err();

    assert!(matches!(err, BurstError::Configuration(_)));
    assert!(err.to_string().contains("BURSTLINE_TEST_UNSET_VARIABLE"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("BURSTLINE_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("BURSTLINE_BURST_OUTPUT_FOLDER", "/srv/out");
    std::env::set_var("BURSTLINE_BURST_FAIL_JOB_IF_ANY_DISTRIBUTION_FAILS", "false");
    std::env::set_var("BURSTLINE_DISTRIBUTION_EMAIL", "true");
    std::env::set_var("BURSTLINE_DISTRIBUTION_RETRY_ENABLED", "true");
    std::env::set_var("BURSTLINE_DISTRIBUTION_RETRY_MAX_RETRIES", "7");
    std::env::set_var("BURSTLINE_LICENSE_DEMO_LIMIT", "50");
    std::env::set_var("BURSTLINE_STATE_TEMP_FOLDER", "/srv/temp");

    let temp_file = write_config("[application]\nlog_level = \"info\"\n");
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.burst.output_folder, "/srv/out");
    assert!(!config.burst.fail_job_if_any_distribution_fails);
    assert!(config.distribution.email);
    assert!(config.distribution.retry.enabled);
    assert_eq!(config.distribution.retry.max_retries, 7);
    assert_eq!(config.license.demo_limit, 50);
    assert_eq!(config.state.temp_folder, PathBuf::from("/srv/temp"));

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_value_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("BURSTLINE_LICENSE_DEMO_LIMIT", "many");

    let temp_file = write_config("");
    let result = load_config(temp_file.path());

    cleanup_env_vars();
    assert!(matches!(result, Err(BurstError::Configuration(_))));
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let cases = [
        "[application]\nlog_level = \"loud\"\n",
        "[burst]\ndelay_each_distribution_by = -1.0\n",
        "[burst]\ndelay_each_distribution_by = 1e300\n",
        "[distribution.retry]\nbackoff_multiplier = 0.5\n",
        "[datasource.format]\ntype = \"fixed_width\"\nwidths = []\n",
        "[hooks]\nafter_lunch = \"echo\"\n",
        "[license]\ndemo_limit = 0\n",
        "[logging]\nlocal_rotation = \"weekly\"\n",
    ];

    for case in cases {
        let temp_file = write_config(case);
        let result = load_config(temp_file.path());
        assert!(
            matches!(result, Err(BurstError::Configuration(_))),
            "expected a validation error for {case:?}"
        );
    }
}

#[test]
fn test_missing_config_file() {
    let result = load_config("/nonexistent/burstline.toml");
    assert!(matches!(result, Err(BurstError::Configuration(_))));
}
