//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::commands::{EXIT_CONFIG, EXIT_SUCCESS, EXIT_UNEXPECTED};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "burstline.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing burstline configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Pick the id column holding the burst token under [datasource.id_column]");
                println!("  3. Enable the destinations you need under [distribution]");
                println!("  4. Validate configuration: burstline validate-config");
                println!("  5. Try a QA run: burstline burst <input> --test-all");
                println!("  6. Run the burst: burstline burst <input>");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(EXIT_UNEXPECTED)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Burstline Configuration File
# Splits a record-oriented input into one document per burst token

[application]
log_level = "info"

[burst]
output_name = "${burst_token}.${output_type_extension}"
output_folder = "output/${input_document_name}/${now}"
quarantine_folder = "quarantine/${input_document_name}/${now}"
backup_folder = "backup/${input_document_name}/${now}"
logs_archives_folder = "logs/archives/${input_document_name}/${now}"
stats_file_name = "_${stats_info}.log"
quarantine_files = true
fail_job_if_any_distribution_fails = true

[datasource.format]
type = "csv"
delimiter = ","
has_header = true

[datasource.id_column]
name = "id"

[output.format]
type = "json"
pretty = true

[distribution]
email = false
upload = false
web = false
sms = false

[state]
temp_folder = "temp"

[logging]
local_enabled = true
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Burstline Configuration File
#
# This file contains all configuration options with examples and explanations.
#
# Folder and file names are templates: ${name} placeholders are replaced per
# token. Useful variables include ${burst_token}, ${input_document_name},
# ${output_type_extension}, ${now}, ${row_number} and every column of the
# token's record by header name (or col0, col1, ...).

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Burst Settings
# ============================================================================
[burst]
# File name of each burst document (blank is an error)
output_name = "${burst_token}.${output_type_extension}"

# Where burst documents are written (blank is an error)
output_folder = "output/${input_document_name}/${now}"

# Where documents that failed distribution are copied
quarantine_folder = "quarantine/${input_document_name}/${now}"

# Where the input document is copied after the run
backup_folder = "backup/${input_document_name}/${now}"

# Statistics folder; must resolve to a new folder for every run
logs_archives_folder = "logs/archives/${input_document_name}/${now}"
stats_file_name = "_${stats_info}.log"

# Delete burst documents once they have been distributed
delete_files = false

# Copy documents whose distribution failed to the quarantine folder
quarantine_files = true

# Abort the run on the first transport failure (ignored in QA runs)
fail_job_if_any_distribution_fails = true

# Seconds to wait before each distribution
delay_each_distribution_by = 0.0

# Write the record of each token next to its document as <name>.data.json
dump_record_data = false

# Attachments sent with each document
attachments = ["${extracted_file_path}"]

# Zip the attachments into a single archive
archive_attachments = false
archive_file_name = "reports-${burst_token}.zip"

# ============================================================================
# Data Source
# ============================================================================
[datasource.format]
# csv | tsv | json | fixed_width
type = "csv"
delimiter = ","
quote = '"'
has_header = true

# For JSON input nested inside a document:
# type = "json"
# records_pointer = "/data/items"

# For fixed-width input:
# type = "fixed_width"
# widths = [10, 25, 8]
# has_header = false

# Column holding the burst token. One of:
#   name = "customer_id"   column by header name
#   index = 0              column by zero-based position
# or set id_column = "first" / "last" / "not_used" under [datasource].
# Blank or duplicate values fall back to sequential numbering.
[datasource.id_column]
name = "id"

# ============================================================================
# Output
# ============================================================================
[output]
# Override the document extension
# extension = "html"

[output.format]
# json: the token's record as JSON
type = "json"
pretty = true

# text: a template rendered with the token's variables
# type = "text"
# template_path = "templates/statement.txt"

# ============================================================================
# Distribution
# ============================================================================
[distribution]
email = false
upload = false
web = false
sms = false

# Recipient templates, resolved per token
email_to = "${email}"
email_subject = "Document ${burst_token}"
upload_folder = "upload/${burst_token}"
web_url = "https://portal.example.com/documents/${burst_token}"
sms_to = "${phone}"

# Delivery envelopes for e-mail, web and sms are spooled here for the
# transport daemon
outbox_folder = "outbox"

# Retry sends that fail at the transport level. Rejected recipients are
# never retried.
[distribution.retry]
enabled = false
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

# ============================================================================
# Lifecycle Hooks
# ============================================================================
# Shell commands run at lifecycle points. The run state is exposed as
# BURSTLINE_* environment variables.
[hooks]
# start_bursting = "echo starting $BURSTLINE_INPUT_DOCUMENT_NAME"
# end_extract_document = "./scripts/sign.sh $BURSTLINE_EXTRACTED_FILE_PATH"
# transform_fetched_data = "./scripts/enrich.py $BURSTLINE_RECORDS_FILE"

# ============================================================================
# License
# ============================================================================
[license]
# path = "license.toml"
# key = "${BURSTLINE_LICENSE_KEY}"

# Tokens processed per run without a paid license
demo_limit = 25

# ============================================================================
# State
# ============================================================================
[state]
# Pause/cancel markers and progress files
temp_folder = "temp"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local file logging (JSON lines)
local_enabled = true

# Local log directory
local_path = "logs"

# Log rotation (daily, hourly or never)
local_rotation = "daily"
"#
        .to_string()
    }
}
