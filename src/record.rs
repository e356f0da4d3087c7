//! CSV schema and per-row records.
//!
//! The input CSV's header is parsed once into a [`CsvSchema`]; every row is a
//! [`RawRecord`] bound to that schema. Field access goes through the schema's
//! name index instead of per-row string maps, so a malformed row (wrong field
//! count) is rejected before any value is read.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::constants::{
    BASE_COLUMN, CONTEXT_NEXT_PREFIX, CONTEXT_PREV_PREFIX, DUPLICATED_FEATURES, NO_TRAIN_FEATURES,
};

/// Errors raised while building a schema or binding rows to it.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("duplicate column '{0}' in CSV header")]
    DuplicateColumn(String),

    #[error("missing required column '{0}' in CSV header")]
    MissingColumn(String),

    #[error("row {row} has {actual} fields, header has {expected}")]
    FieldCount {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Parsed CSV header: ordered column names plus a name-to-index map.
#[derive(Debug, Clone)]
pub struct CsvSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl CsvSchema {
    /// Build a schema from header column names. Duplicate names are an error;
    /// the base-identity column is mandatory.
    pub fn new<I, S>(columns: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(RecordError::DuplicateColumn(name.clone()));
            }
        }
        if !index.contains_key(BASE_COLUMN) {
            return Err(RecordError::MissingColumn(BASE_COLUMN.to_string()));
        }
        Ok(Self { columns, index })
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in header order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// True if the header contains the named column.
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Trainable numeric columns in header order: everything except the
    /// non-trainable set, duplicates, the base call, and sequence-context
    /// columns (the latter two are one-hot expanded, not numeric inputs).
    pub fn trainable_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|name| {
                let name = name.as_str();
                !NO_TRAIN_FEATURES.contains(&name)
                    && !DUPLICATED_FEATURES.contains(&name)
                    && name != BASE_COLUMN
                    && !is_context_column(name)
            })
            .cloned()
            .collect()
    }

    /// Sequence-context columns in header order.
    pub fn context_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|name| is_context_column(name))
            .cloned()
            .collect()
    }
}

/// True for local sequence-context columns (`CCSBasePrev<k>` / `CCSBaseNext<k>`).
pub fn is_context_column(name: &str) -> bool {
    name.starts_with(CONTEXT_PREV_PREFIX) || name.starts_with(CONTEXT_NEXT_PREFIX)
}

/// One CSV row bound to its schema.
#[derive(Debug, Clone)]
pub struct RawRecord {
    schema: Arc<CsvSchema>,
    values: Vec<String>,
}

impl RawRecord {
    /// Bind a row's field values to the schema, validating the field count.
    /// `row` is the 0-based data-row index, used only for error reporting.
    pub fn new(
        schema: Arc<CsvSchema>,
        values: Vec<String>,
        row: usize,
    ) -> Result<Self, RecordError> {
        if values.len() != schema.n_columns() {
            return Err(RecordError::FieldCount {
                row,
                expected: schema.n_columns(),
                actual: values.len(),
            });
        }
        Ok(Self { schema, values })
    }

    /// The schema this row is bound to.
    pub fn schema(&self) -> &CsvSchema {
        &self.schema
    }

    /// Value of a column by name, if the column exists.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.schema
            .column_index(name)
            .map(|i| self.values[i].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(cols: &[&str]) -> Arc<CsvSchema> {
        Arc::new(CsvSchema::new(cols.iter().copied()).unwrap())
    }

    #[test]
    fn schema_indexes_columns() {
        let s = schema(&["CCSBase", "F1", "F2"]);
        assert_eq!(s.n_columns(), 3);
        assert_eq!(s.column_index("F2"), Some(2));
        assert_eq!(s.column_index("missing"), None);
    }

    #[test]
    fn schema_rejects_duplicates() {
        let err = CsvSchema::new(["CCSBase", "F1", "F1"]).unwrap_err();
        assert!(matches!(err, RecordError::DuplicateColumn(name) if name == "F1"));
    }

    #[test]
    fn schema_requires_base_column() {
        let err = CsvSchema::new(["F1", "F2"]).unwrap_err();
        assert!(matches!(err, RecordError::MissingColumn(_)));
    }

    #[test]
    fn trainable_columns_drop_bookkeeping() {
        let s = schema(&[
            "CCSBase",
            "CCSLength",
            "F1",
            "CCSPos",
            "F2",
            "Movie",
            "ArrowQv",
            "CCSToGenomeCigar",
            "CcsToGenomePrevDeletions",
            "CCSBaseSNR",
            "CCSBasePrev1",
        ]);
        assert_eq!(s.trainable_columns(), vec!["F1", "F2"]);
        assert_eq!(s.context_columns(), vec!["CCSBasePrev1"]);
    }

    #[test]
    fn record_field_count_checked() {
        let s = schema(&["CCSBase", "F1"]);
        let err = RawRecord::new(s.clone(), vec!["A".into()], 3).unwrap_err();
        assert!(matches!(
            err,
            RecordError::FieldCount {
                row: 3,
                expected: 2,
                actual: 1
            }
        ));
        let rec = RawRecord::new(s, vec!["A".into(), "1.5".into()], 0).unwrap();
        assert_eq!(rec.get("F1"), Some("1.5"));
        assert_eq!(rec.get("nope"), None);
    }
}
