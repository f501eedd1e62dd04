//! Built-in extractors

use crate::adapters::traits::{ExtractRequest, ExtractScope, Extractor};
use crate::core::template;
use crate::domain::errors::BurstError;
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

async fn write_artifact(target: &Path, contents: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            BurstError::Extraction(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    tokio::fs::write(target, contents).await.map_err(|e| {
        BurstError::Extraction(format!("Failed to write {}: {}", target.display(), e))
    })?;
    Ok(target.to_path_buf())
}

/// Renders a `${variable}` text template per token
///
/// In whole-set scope the template additionally sees `records` (the record
/// set as JSON) and `record_count`.
#[derive(Debug, Clone)]
pub struct TextTemplateExtractor {
    template_path: PathBuf,
}

impl TextTemplateExtractor {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
        }
    }

    async fn load_template(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.template_path)
            .await
            .map_err(|e| {
                BurstError::Template(format!(
                    "Failed to read template {}: {}",
                    self.template_path.display(),
                    e
                ))
            })
    }
}

#[async_trait]
impl Extractor for TextTemplateExtractor {
    async fn extract(&self, request: ExtractRequest<'_>) -> Result<PathBuf> {
        let source = self.load_template().await?;

        let rendered = match request.scope {
            ExtractScope::Record(_) => template::render(&source, request.variables),
            ExtractScope::All => {
                let mut scope: BTreeMap<String, String> = request.variables.clone();
                scope.insert("records".to_string(), request.records.to_json().to_string());
                scope.insert("record_count".to_string(), request.records.len().to_string());
                template::render(&source, &scope)
            }
        };

        write_artifact(request.target, rendered.as_bytes()).await
    }
}

/// Writes the token's record (or the whole set) as JSON
#[derive(Debug, Clone)]
pub struct JsonRecordExtractor {
    pretty: bool,
}

impl JsonRecordExtractor {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

#[async_trait]
impl Extractor for JsonRecordExtractor {
    async fn extract(&self, request: ExtractRequest<'_>) -> Result<PathBuf> {
        let value = match request.scope {
            ExtractScope::Record(row) => {
                if request.records.get(row).is_none() {
                    return Err(BurstError::Extraction(format!(
                        "Row {} is out of range ({} records)",
                        row,
                        request.records.len()
                    )));
                }
                request.records.record_as_json(row)
            }
            ExtractScope::All => request.records.to_json(),
        };

        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&value)?
        } else {
            serde_json::to_vec(&value)?
        };

        write_artifact(request.target, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{Record, RecordSet};
    use tempfile::TempDir;

    fn records() -> RecordSet {
        RecordSet::new(
            vec!["id".to_string(), "name".to_string()],
            vec![
                Record::new(vec!["1".to_string(), "Ann".to_string()]),
                Record::new(vec!["2".to_string(), "Bo".to_string()]),
            ],
        )
    }

    #[tokio::test]
    async fn test_text_template_per_record() {
        let dir = TempDir::new().unwrap();
        let template_path = dir.path().join("letter.txt");
        std::fs::write(&template_path, "Dear ${name}, ref ${burst_token}${unknown}").unwrap();

        let mut variables = BTreeMap::new();
        variables.insert("name".to_string(), "Bo".to_string());
        variables.insert("burst_token".to_string(), "2".to_string());

        let set = records();
        let target = dir.path().join("out/nested/2.txt");
        let path = TextTemplateExtractor::new(&template_path)
            .extract(ExtractRequest {
                scope: ExtractScope::Record(1),
                records: &set,
                variables: &variables,
                target: &target,
            })
            .await
            .unwrap();

        assert_eq!(path, target);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Dear Bo, ref 2");
    }

    #[tokio::test]
    async fn test_text_template_whole_set() {
        let dir = TempDir::new().unwrap();
        let template_path = dir.path().join("summary.txt");
        std::fs::write(&template_path, "${record_count} records").unwrap();

        let set = records();
        let target = dir.path().join("1.txt");
        TextTemplateExtractor::new(&template_path)
            .extract(ExtractRequest {
                scope: ExtractScope::All,
                records: &set,
                variables: &BTreeMap::new(),
                target: &target,
            })
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "2 records");
    }

    #[tokio::test]
    async fn test_missing_template_is_template_error() {
        let dir = TempDir::new().unwrap();
        let set = records();
        let err = TextTemplateExtractor::new(dir.path().join("nope.txt"))
            .extract(ExtractRequest {
                scope: ExtractScope::Record(0),
                records: &set,
                variables: &BTreeMap::new(),
                target: &dir.path().join("1.txt"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BurstError::Template(_)));
    }

    #[tokio::test]
    async fn test_json_record() {
        let dir = TempDir::new().unwrap();
        let set = records();
        let target = dir.path().join("1.json");

        JsonRecordExtractor::new(false)
            .extract(ExtractRequest {
                scope: ExtractScope::Record(0),
                records: &set,
                variables: &BTreeMap::new(),
                target: &target,
            })
            .await
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(value["name"], "Ann");
    }
}
