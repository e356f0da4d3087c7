//! Corpus-wide per-column statistics.
//!
//! One pass over the filtered corpus collects every trainable column; the
//! resulting [`FeatureStat`] records are immutable after creation and are the
//! only input the standardizer accepts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::RawRecord;

/// Mean, population stdev, min, and max of one numeric column across an
/// entire filtered corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStat {
    pub name: String,
    pub mean: f32,
    pub stdev: f32,
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("column '{column}' has non-numeric value '{value}'")]
    InvalidNumeric { column: String, value: String },

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("no rows passed the filter; cannot compute statistics")]
    EmptyCorpus,

    #[error(
        "feature sets differ between statistics manifest and CSV: \
         only in manifest {only_in_stats:?}, only in CSV {only_in_csv:?}"
    )]
    FeatureMismatch {
        only_in_stats: Vec<String>,
        only_in_csv: Vec<String>,
    },
}

/// Accumulates raw column values for a fixed, sorted feature set.
///
/// Column order here is alphabetical by feature name, which also fixes the
/// record order in the statistics manifest and keeps JSON diffs deterministic.
#[derive(Debug)]
pub struct StatsAccumulator {
    names: Vec<String>,
    columns: Vec<Vec<f32>>,
}

impl StatsAccumulator {
    /// Create an accumulator over the given trainable columns (sorted here).
    pub fn new(mut names: Vec<String>) -> Self {
        names.sort();
        let columns = names.iter().map(|_| Vec::new()).collect();
        Self { names, columns }
    }

    /// Feature names in accumulation (sorted) order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of accumulated rows.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Append one accepted record's trainable values.
    pub fn push(&mut self, record: &RawRecord) -> Result<(), StatsError> {
        for (name, column) in self.names.iter().zip(self.columns.iter_mut()) {
            let value = record
                .get(name)
                .ok_or_else(|| StatsError::MissingColumn(name.clone()))?;
            let parsed: f32 = value
                .trim()
                .parse()
                .map_err(|_| StatsError::InvalidNumeric {
                    column: name.clone(),
                    value: value.to_string(),
                })?;
            column.push(parsed);
        }
        Ok(())
    }

    /// Compute the per-column statistics. Fails on an empty corpus.
    pub fn finish(self) -> Result<Vec<FeatureStat>, StatsError> {
        if self.n_rows() == 0 {
            return Err(StatsError::EmptyCorpus);
        }
        let stats = self
            .names
            .into_iter()
            .zip(self.columns)
            .map(|(name, values)| column_stat(name, &values))
            .collect();
        Ok(stats)
    }
}

/// Two-pass population mean/stdev plus min/max of one column.
fn column_stat(name: String, values: &[f32]) -> FeatureStat {
    let n = values.len() as f64;
    let mean = values.iter().map(|v| f64::from(*v)).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|v| {
            let d = f64::from(*v) - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for v in values {
        min = min.min(*v);
        max = max.max(*v);
    }
    FeatureStat {
        name,
        mean: mean as f32,
        stdev: variance.sqrt() as f32,
        min,
        max,
    }
}

/// Validate that a stat manifest's feature-name set matches the CSV's
/// trainable columns, reporting the full symmetric difference on mismatch.
pub fn validate_feature_sets(
    stats: &[FeatureStat],
    trainable: &[String],
) -> Result<(), StatsError> {
    let stat_names: BTreeSet<&str> = stats.iter().map(|s| s.name.as_str()).collect();
    let csv_names: BTreeSet<&str> = trainable.iter().map(String::as_str).collect();
    if stat_names == csv_names {
        return Ok(());
    }
    Err(StatsError::FeatureMismatch {
        only_in_stats: stat_names
            .difference(&csv_names)
            .map(|s| s.to_string())
            .collect(),
        only_in_csv: csv_names
            .difference(&stat_names)
            .map(|s| s.to_string())
            .collect(),
    })
}
