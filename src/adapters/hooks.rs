//! Shell command extension hooks

use crate::adapters::fetch::JsonFetcher;
use crate::adapters::traits::ExtensionHooks;
use crate::config::HooksConfig;
use crate::domain::errors::BurstError;
use crate::domain::lifecycle::LifecyclePoint;
use crate::domain::run::RunContext;
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::process::Command;

/// Environment variable naming the records file of `transform_fetched_data`
pub const RECORDS_FILE_VAR: &str = "BURSTLINE_RECORDS_FILE";

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait]
impl ExtensionHooks for NoopHooks {
    async fn run(&self, _point: LifecyclePoint, _ctx: &mut RunContext) -> Result<()> {
        Ok(())
    }
}

/// Runs the configured `sh -c` command of each lifecycle point
///
/// The run state is exposed as `BURSTLINE_*` variables: every template
/// variable in upper case plus `BURSTLINE_HOOK`, `BURSTLINE_JOB_ID`,
/// `BURSTLINE_ARCHIVE_FILE_PATH` and `BURSTLINE_LAST_ERROR`. For
/// `transform_fetched_data` the records are written as a JSON array to the
/// file named by `BURSTLINE_RECORDS_FILE` and read back once the command
/// exits.
#[derive(Debug, Clone)]
pub struct CommandHooks {
    hooks: HooksConfig,
    work_folder: PathBuf,
}

impl CommandHooks {
    /// Create hooks writing their scratch files under `work_folder`
    pub fn new(hooks: HooksConfig, work_folder: impl Into<PathBuf>) -> Self {
        Self {
            hooks,
            work_folder: work_folder.into(),
        }
    }

    fn environment(point: LifecyclePoint, ctx: &RunContext) -> BTreeMap<String, String> {
        let mut env: BTreeMap<String, String> = ctx
            .scope()
            .into_iter()
            .filter(|(name, _)| name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
            .map(|(name, value)| (format!("BURSTLINE_{}", name.to_ascii_uppercase()), value))
            .collect();

        env.insert("BURSTLINE_HOOK".to_string(), point.as_str().to_string());
        env.insert("BURSTLINE_JOB_ID".to_string(), ctx.job_id.to_string());
        env.insert(
            "BURSTLINE_ARCHIVE_FILE_PATH".to_string(),
            ctx.archive_file_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );
        env.insert(
            "BURSTLINE_LAST_ERROR".to_string(),
            ctx.last_error.clone().unwrap_or_default(),
        );
        env
    }

    async fn execute(
        &self,
        point: LifecyclePoint,
        command: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<()> {
        tracing::debug!(hook = %point, command, "Running hook");

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .envs(env)
            .output()
            .await
            .map_err(|e| BurstError::Hook(format!("{}: failed to start '{}': {}", point, command, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(hook = %point, stdout = %stdout.trim(), "Hook output");
        }

        if !output.status.success() {
            return Err(BurstError::Hook(format!(
                "{} exited with {}: {}",
                point,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    async fn transform_records(&self, command: &str, ctx: &mut RunContext) -> Result<()> {
        let records_file = self.records_file(&ctx.job_id.to_string());
        tokio::fs::create_dir_all(&self.work_folder).await?;
        tokio::fs::write(&records_file, serde_json::to_vec(&ctx.records.to_json())?).await?;

        let mut env = Self::environment(LifecyclePoint::TransformFetchedData, ctx);
        env.insert(RECORDS_FILE_VAR.to_string(), records_file.display().to_string());

        let result = self
            .execute(LifecyclePoint::TransformFetchedData, command, &env)
            .await;

        let transformed = match result {
            Ok(()) => tokio::fs::read_to_string(&records_file)
                .await
                .map_err(BurstError::from)
                .and_then(|contents| JsonFetcher::default().parse(&contents)),
            Err(e) => Err(e),
        };

        if let Err(e) = tokio::fs::remove_file(&records_file).await {
            tracing::error!(file = %records_file.display(), error = %e, "Failed to delete records file");
        }

        let page_count = ctx.records.page_count();
        ctx.records = transformed
            .map_err(|e| e.with_context("transform_fetched_data"))?
            .with_page_count(page_count);
        tracing::info!(records = ctx.records.len(), "Records transformed by hook");
        Ok(())
    }

    fn records_file(&self, job: &str) -> PathBuf {
        self.work_folder.join(format!("{}.records.json", job))
    }
}

#[async_trait]
impl ExtensionHooks for CommandHooks {
    async fn run(&self, point: LifecyclePoint, ctx: &mut RunContext) -> Result<()> {
        let Some(command) = self.hooks.command_for(point).map(str::to_string) else {
            return Ok(());
        };

        if point == LifecyclePoint::TransformFetchedData {
            return self.transform_records(&command, ctx).await;
        }

        let env = Self::environment(point, ctx);
        self.execute(point, &command, &env).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{Record, RecordSet};
    use crate::domain::{JobId, Token};
    use tempfile::TempDir;

    fn hooks(pairs: &[(&str, &str)], dir: &TempDir) -> CommandHooks {
        let commands = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CommandHooks::new(HooksConfig { commands }, dir.path())
    }

    fn context() -> RunContext {
        let mut ctx = RunContext::new(JobId::new("invoices").unwrap(), "in/invoices.csv");
        ctx.current_token = Some(Token::new("a7"));
        ctx
    }

    #[tokio::test]
    async fn test_missing_hook_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context();
        hooks(&[], &dir)
            .run(LifecyclePoint::StartBursting, &mut ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_hook_sees_run_variables() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("seen.txt");
        let command = format!(
            "echo \"$BURSTLINE_HOOK $BURSTLINE_BURST_TOKEN $BURSTLINE_INPUT_DOCUMENT_NAME\" > {}",
            out.display()
        );
        let mut ctx = context();
        hooks(&[("end_extract_document", command.as_str())], &dir)
            .run(LifecyclePoint::EndExtractDocument, &mut ctx)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&out).unwrap().trim(),
            "end_extract_document a7 invoices.csv"
        );
    }

    #[tokio::test]
    async fn test_failing_hook_is_hook_error() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context();
        let err = hooks(&[("end_bursting", "echo boom >&2; exit 3")], &dir)
            .run(LifecyclePoint::EndBursting, &mut ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, BurstError::Hook(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_transform_replaces_records() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context();
        ctx.records = RecordSet::new(
            vec!["id".to_string()],
            vec![
                Record::new(vec!["1".to_string()]),
                Record::new(vec!["2".to_string()]),
            ],
        );

        let command = "echo '[{\"id\": \"9\"}]' > \"$BURSTLINE_RECORDS_FILE\"";
        let hooks = hooks(&[("transform_fetched_data", command)], &dir);
        hooks
            .run(LifecyclePoint::TransformFetchedData, &mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.records.len(), 1);
        assert_eq!(ctx.records.get(0).unwrap().get(0), Some("9"));
        assert!(!hooks.records_file("invoices").exists());
    }
}
