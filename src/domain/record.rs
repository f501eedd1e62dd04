//! Fetched record sets and the token index derived from them

use crate::domain::ids::Token;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// One fetched record: an ordered row of string values
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    /// Creates a record from its column values
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Value at a positional column index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// All values in column order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of values in this record
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the record carries no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered sequence of records fetched from one data source
///
/// `page_count` is `-1` when the source has no notion of pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    columns: Vec<String>,
    records: Vec<Record>,
    page_count: i64,
}

impl Default for RecordSet {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            records: Vec::new(),
            page_count: -1,
        }
    }
}

impl RecordSet {
    /// Creates a record set with named columns (may be empty for headerless sources)
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            columns,
            records,
            page_count: -1,
        }
    }

    /// Sets the known page count of the underlying document
    pub fn with_page_count(mut self, page_count: i64) -> Self {
        self.page_count = page_count;
        self
    }

    /// Column names, empty when the source has no header
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All records in fetch order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Mutable access for the `transform_fetched_data` stage
    pub fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    /// Record at a row index
    pub fn get(&self, row: usize) -> Option<&Record> {
        self.records.get(row)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when nothing was fetched
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Page count of the underlying document, `-1` if unknown
    pub fn page_count(&self) -> i64 {
        self.page_count
    }

    /// Positional index of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Name of a column, falling back to `colN` for headerless sources
    pub fn column_name(&self, index: usize) -> String {
        match self.columns.get(index) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("col{}", index),
        }
    }

    /// The variables a record contributes: each column by name plus `colN`
    pub fn record_variables(&self, row: usize) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        if let Some(record) = self.records.get(row) {
            for (index, value) in record.values().iter().enumerate() {
                vars.insert(format!("col{}", index), value.clone());
                if let Some(name) = self.columns.get(index).filter(|n| !n.is_empty()) {
                    vars.insert(name.clone(), value.clone());
                }
            }
        }
        vars
    }

    /// A record as a JSON object keyed by column name
    pub fn record_as_json(&self, row: usize) -> Value {
        let mut object = Map::new();
        if let Some(record) = self.records.get(row) {
            for (index, value) in record.values().iter().enumerate() {
                object.insert(self.column_name(index), Value::String(value.clone()));
            }
        }
        Value::Object(object)
    }

    /// The whole record set as a JSON array of objects
    pub fn to_json(&self) -> Value {
        Value::Array(
            (0..self.records.len())
                .map(|row| self.record_as_json(row))
                .collect(),
        )
    }
}

/// Tokens derived from a record set by a metadata parser
///
/// Holds the ordered token sequence, the row each token came from and the
/// per-token user variables.
#[derive(Debug, Clone, Default)]
pub struct TokenIndex {
    tokens: Vec<Token>,
    rows: HashMap<Token, usize>,
    variables: HashMap<Token, BTreeMap<String, String>>,
}

impl TokenIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a token bound to `row` with its user variables
    pub fn push(&mut self, token: Token, row: usize, variables: BTreeMap<String, String>) {
        self.rows.insert(token.clone(), row);
        self.variables.insert(token.clone(), variables);
        self.tokens.push(token);
    }

    /// Ordered token sequence
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Row index a token was derived from
    pub fn row_of(&self, token: &Token) -> Option<usize> {
        self.rows.get(token).copied()
    }

    /// User variables of a token
    pub fn variables_of(&self, token: &Token) -> Option<&BTreeMap<String, String>> {
        self.variables.get(token)
    }

    /// Replaces the user variables of a token
    pub fn set_variables(&mut self, token: &Token, variables: BTreeMap<String, String>) {
        self.variables.insert(token.clone(), variables);
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if no token was derived
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordSet {
        RecordSet::new(
            vec!["id".to_string(), "email".to_string()],
            vec![
                Record::new(vec!["1".to_string(), "a@example.com".to_string()]),
                Record::new(vec!["2".to_string(), "b@example.com".to_string()]),
            ],
        )
    }

    #[test]
    fn test_record_set_defaults_to_unknown_pages() {
        assert_eq!(sample().page_count(), -1);
        assert_eq!(sample().with_page_count(12).page_count(), 12);
    }

    #[test]
    fn test_record_variables_by_name_and_position() {
        let vars = sample().record_variables(1);
        assert_eq!(vars.get("email").map(String::as_str), Some("b@example.com"));
        assert_eq!(vars.get("col1").map(String::as_str), Some("b@example.com"));
        assert_eq!(vars.get("col0").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_headerless_columns_fall_back_to_positional_names() {
        let set = RecordSet::new(vec![], vec![Record::new(vec!["x".to_string()])]);
        assert_eq!(set.column_name(0), "col0");
        assert_eq!(set.record_as_json(0), serde_json::json!({"col0": "x"}));
    }

    #[test]
    fn test_token_index_keeps_order_and_rows() {
        let mut index = TokenIndex::new();
        index.push(Token::new("b"), 0, BTreeMap::new());
        index.push(Token::new("a"), 1, BTreeMap::new());

        assert_eq!(index.tokens(), &[Token::new("b"), Token::new("a")]);
        assert_eq!(index.row_of(&Token::new("a")), Some(1));
        assert_eq!(index.row_of(&Token::new("zzz")), None);
    }
}
