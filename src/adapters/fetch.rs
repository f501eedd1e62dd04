//! Built-in data fetchers for delimited, JSON and fixed-width sources
//!
//! Record sources have no pages, so every fetched set reports a page count
//! of `-1`.

use crate::adapters::traits::DataFetcher;
use crate::domain::errors::BurstError;
use crate::domain::record::{Record, RecordSet};
use crate::domain::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

async fn read_source(source: &Path) -> Result<String> {
    tokio::fs::read_to_string(source).await.map_err(|e| {
        BurstError::DataSource(format!("Failed to read {}: {}", source.display(), e))
    })
}

/// Delimited text (CSV, TSV) via the `csv` crate
#[derive(Debug, Clone)]
pub struct DelimitedFetcher {
    delimiter: u8,
    quote: u8,
    has_header: bool,
}

impl DelimitedFetcher {
    /// Create a fetcher; delimiter and quote must be ASCII
    pub fn new(delimiter: char, quote: char, has_header: bool) -> Result<Self> {
        Ok(Self {
            delimiter: ascii_byte("delimiter", delimiter)?,
            quote: ascii_byte("quote", quote)?,
            has_header,
        })
    }

    /// Tab separated values
    pub fn tsv(has_header: bool) -> Self {
        Self {
            delimiter: b'\t',
            quote: b'"',
            has_header,
        }
    }

    fn parse(&self, contents: &str) -> Result<RecordSet> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .has_headers(self.has_header)
            .flexible(true)
            .from_reader(contents.as_bytes());

        let columns = if self.has_header {
            reader.headers()?.iter().map(|h| h.trim().to_string()).collect()
        } else {
            Vec::new()
        };

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            if row.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            records.push(Record::new(row.iter().map(str::to_string).collect()));
        }

        Ok(RecordSet::new(columns, records))
    }
}

fn ascii_byte(name: &str, c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(BurstError::Configuration(format!(
            "datasource {} must be an ASCII character, got '{}'",
            name, c
        )))
    }
}

#[async_trait]
impl DataFetcher for DelimitedFetcher {
    async fn fetch(&self, source: &Path) -> Result<RecordSet> {
        let contents = read_source(source).await?;
        let set = self.parse(&contents)?;
        tracing::info!(source = %source.display(), records = set.len(), "Fetched delimited records");
        Ok(set)
    }
}

/// A JSON array of objects, optionally nested under a JSON pointer
#[derive(Debug, Clone, Default)]
pub struct JsonFetcher {
    records_pointer: Option<String>,
}

impl JsonFetcher {
    /// Create a fetcher reading the array at `records_pointer` (document root if `None`)
    pub fn new(records_pointer: Option<String>) -> Self {
        Self { records_pointer }
    }

    /// Parse a JSON document into records
    pub(crate) fn parse(&self, contents: &str) -> Result<RecordSet> {
        let document: Value = serde_json::from_str(contents)
            .map_err(|e| BurstError::DataSource(format!("Invalid JSON: {}", e)))?;

        let array = match &self.records_pointer {
            Some(pointer) if !pointer.is_empty() => document.pointer(pointer).ok_or_else(|| {
                BurstError::DataSource(format!("JSON pointer '{}' does not resolve", pointer))
            })?,
            _ => &document,
        };

        let items = array.as_array().ok_or_else(|| {
            BurstError::DataSource("Expected a JSON array of records".to_string())
        })?;

        let mut columns: Vec<String> = Vec::new();
        for item in items {
            match item {
                Value::Object(map) => {
                    for key in map.keys() {
                        if !columns.contains(key) {
                            columns.push(key.clone());
                        }
                    }
                }
                _ => {
                    if !columns.iter().any(|c| c == "value") {
                        columns.push("value".to_string());
                    }
                }
            }
        }

        let records = items
            .iter()
            .map(|item| {
                let values = columns
                    .iter()
                    .map(|column| match item {
                        Value::Object(map) => map.get(column).map(scalar_text).unwrap_or_default(),
                        other if column == "value" => scalar_text(other),
                        _ => String::new(),
                    })
                    .collect();
                Record::new(values)
            })
            .collect();

        Ok(RecordSet::new(columns, records))
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl DataFetcher for JsonFetcher {
    async fn fetch(&self, source: &Path) -> Result<RecordSet> {
        let contents = read_source(source).await?;
        let set = self.parse(&contents)?;
        tracing::info!(source = %source.display(), records = set.len(), "Fetched JSON records");
        Ok(set)
    }
}

/// Fixed-width columns, widths counted in characters
#[derive(Debug, Clone)]
pub struct FixedWidthFetcher {
    widths: Vec<usize>,
    has_header: bool,
}

impl FixedWidthFetcher {
    /// Create a fetcher for the given column widths
    pub fn new(widths: Vec<usize>, has_header: bool) -> Self {
        Self { widths, has_header }
    }

    fn split(&self, line: &str) -> Vec<String> {
        let chars: Vec<char> = line.chars().collect();
        let mut start = 0;
        self.widths
            .iter()
            .map(|width| {
                let end = (start + width).min(chars.len());
                let begin = start.min(chars.len());
                start += width;
                chars[begin..end].iter().collect::<String>().trim().to_string()
            })
            .collect()
    }

    fn parse(&self, contents: &str) -> Result<RecordSet> {
        let mut lines = contents.lines().filter(|l| !l.trim().is_empty());

        let columns = if self.has_header {
            lines.next().map(|l| self.split(l)).unwrap_or_default()
        } else {
            Vec::new()
        };

        let records = lines.map(|l| Record::new(self.split(l))).collect();
        Ok(RecordSet::new(columns, records))
    }
}

#[async_trait]
impl DataFetcher for FixedWidthFetcher {
    async fn fetch(&self, source: &Path) -> Result<RecordSet> {
        let contents = read_source(source).await?;
        let set = self.parse(&contents)?;
        tracing::info!(source = %source.display(), records = set.len(), "Fetched fixed-width records");
        Ok(set)
    }
}
