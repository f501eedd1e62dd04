//! Token derivation from an id column

use crate::adapters::traits::MetadataParser;
use crate::config::IdColumn;
use crate::domain::ids::Token;
use crate::domain::record::{RecordSet, TokenIndex};
use std::collections::HashSet;

/// Derives one token per record from the configured id column
///
/// Falls back to sequential numbering (`1..n`) when the column cannot be
/// resolved or holds a blank or duplicated value.
#[derive(Debug, Clone, Default)]
pub struct ColumnTokenParser {
    id_column: IdColumn,
}

impl ColumnTokenParser {
    pub fn new(id_column: IdColumn) -> Self {
        Self { id_column }
    }

    fn resolve_column(&self, records: &RecordSet) -> Option<usize> {
        let width = records
            .columns()
            .len()
            .max(records.records().iter().map(|r| r.len()).max().unwrap_or(0));

        match &self.id_column {
            IdColumn::NotUsed => None,
            IdColumn::Index(index) if *index < width => Some(*index),
            IdColumn::Index(_) => None,
            IdColumn::Name(name) => records.column_index(name),
            IdColumn::First if width > 0 => Some(0),
            IdColumn::Last if width > 0 => Some(width - 1),
            IdColumn::First | IdColumn::Last => None,
        }
    }

    fn column_tokens(&self, records: &RecordSet, column: usize) -> Option<Vec<Token>> {
        let mut seen = HashSet::new();
        let mut tokens = Vec::with_capacity(records.len());
        for (row, record) in records.records().iter().enumerate() {
            let value = record.get(column).map(str::trim).unwrap_or_default();
            if value.is_empty() {
                tracing::warn!(row, column, "Blank burst token, falling back to sequential tokens");
                return None;
            }
            if !seen.insert(value.to_string()) {
                tracing::warn!(row, column, token = value, "Duplicate burst token, falling back to sequential tokens");
                return None;
            }
            tokens.push(Token::new(value));
        }
        Some(tokens)
    }
}

impl MetadataParser for ColumnTokenParser {
    fn derive_tokens(&self, records: &RecordSet) -> TokenIndex {
        let column_tokens = match self.resolve_column(records) {
            Some(column) => self.column_tokens(records, column),
            None => {
                if self.id_column != IdColumn::NotUsed {
                    tracing::warn!(id_column = ?self.id_column, "Id column not found, falling back to sequential tokens");
                }
                None
            }
        };

        let tokens = column_tokens.unwrap_or_else(|| {
            (1..=records.len())
                .map(|n| Token::new(n.to_string()))
                .collect()
        });

        let mut index = TokenIndex::new();
        for (row, token) in tokens.into_iter().enumerate() {
            let mut variables = records.record_variables(row);
            variables.insert("row_index".to_string(), row.to_string());
            variables.insert("row_number".to_string(), (row + 1).to_string());
            index.push(token, row, variables);
        }

        tracing::debug!(tokens = index.len(), "Derived burst tokens");
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Record;
    use test_case::test_case;

    fn records(rows: &[&[&str]]) -> RecordSet {
        RecordSet::new(
            vec!["id".to_string(), "email".to_string()],
            rows.iter()
                .map(|r| Record::new(r.iter().map(|v| v.to_string()).collect()))
                .collect(),
        )
    }

    fn token_strings(index: &TokenIndex) -> Vec<&str> {
        index.tokens().iter().map(Token::as_str).collect()
    }

    #[test_case(IdColumn::Name("id".to_string()), &["a7", "b9"] ; "by name")]
    #[test_case(IdColumn::Index(1), &["x@example.com", "y@example.com"] ; "by index")]
    #[test_case(IdColumn::First, &["a7", "b9"] ; "first column")]
    #[test_case(IdColumn::Last, &["x@example.com", "y@example.com"] ; "last column")]
    #[test_case(IdColumn::NotUsed, &["1", "2"] ; "not used")]
    #[test_case(IdColumn::Name("missing".to_string()), &["1", "2"] ; "unknown name")]
    #[test_case(IdColumn::Index(9), &["1", "2"] ; "index out of range")]
    fn test_id_column_policy(policy: IdColumn, expected: &[&str]) {
        let set = records(&[&["a7", "x@example.com"], &["b9", "y@example.com"]]);
        let index = ColumnTokenParser::new(policy).derive_tokens(&set);
        assert_eq!(token_strings(&index), expected);
    }

    #[test]
    fn test_duplicate_value_falls_back() {
        let set = records(&[&["a", "x"], &["a", "y"], &["b", "z"]]);
        let index = ColumnTokenParser::new(IdColumn::First).derive_tokens(&set);
        assert_eq!(token_strings(&index), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_blank_value_falls_back() {
        let set = records(&[&["a", "x"], &[" ", "y"]]);
        let index = ColumnTokenParser::new(IdColumn::First).derive_tokens(&set);
        assert_eq!(token_strings(&index), vec!["1", "2"]);
    }

    #[test]
    fn test_variables_carry_columns_and_row() {
        let set = records(&[&["a7", "x@example.com"], &["b9", "y@example.com"]]);
        let index = ColumnTokenParser::new(IdColumn::First).derive_tokens(&set);

        let token = Token::new("b9");
        assert_eq!(index.row_of(&token), Some(1));
        let vars = index.variables_of(&token).unwrap();
        assert_eq!(vars["email"], "y@example.com");
        assert_eq!(vars["col1"], "y@example.com");
        assert_eq!(vars["row_index"], "1");
        assert_eq!(vars["row_number"], "2");
    }

    #[test]
    fn test_empty_record_set_has_no_tokens() {
        let index = ColumnTokenParser::new(IdColumn::First).derive_tokens(&RecordSet::default());
        assert!(index.is_empty());
    }
}
