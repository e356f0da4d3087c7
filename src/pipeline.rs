//! The two corpus passes: statistics computation and dataset conversion.
//!
//! Both passes stream the input CSV once, filtering and processing rows
//! inline. The conversion pass accumulates encoded rows in memory and commits
//! them with a single bulk write at the end; nothing is written on any error
//! path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use thiserror::Error;

use crate::constants::{PROGRESS_INTERVAL, STANDARDIZE_CAP};
use crate::dataset::{DatasetBuilder, DatasetError, FextractDataset};
use crate::encode::{EncodeError, RowEncoder};
use crate::filter::{is_good_row, FilterConfig, FilterError};
use crate::io::container::{save_dataset, SerializeError};
use crate::io::manifest::{
    save_feature_order, save_header_file, save_stat_manifest, ManifestError,
};
use crate::record::{CsvSchema, RawRecord, RecordError};
use crate::standardize::{standardize_column, ZeroStdev};
use crate::stats::{validate_feature_sets, FeatureStat, StatsAccumulator, StatsError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Standardize(#[from] ZeroStdev),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Output empty train data!")]
    EmptyTrainData,

    #[error("Output empty test data!")]
    EmptyTestData,

    #[error("output path '{path}' must end with '{expected}'")]
    InvalidPath { path: String, expected: &'static str },

    #[error("num_train_rows must be at least 1")]
    ZeroTrainBudget,
}

/// Require a path's final component to end with the given suffix.
pub fn require_suffix(path: &Path, expected: &'static str) -> Result<(), PipelineError> {
    let ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(expected));
    if !ok {
        return Err(PipelineError::InvalidPath {
            path: path.display().to_string(),
            expected,
        });
    }
    Ok(())
}

fn open_schema(
    in_csv: &Path,
) -> Result<(csv::Reader<std::fs::File>, Arc<CsvSchema>), PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(in_csv)?;
    let headers = reader.headers()?.clone();
    let schema = Arc::new(CsvSchema::new(headers.iter())?);
    Ok((reader, schema))
}

// ============================================================================
// First pass: statistics
// ============================================================================

/// Compute per-column statistics of the trainable columns over the filtered
/// corpus and write the statistics manifest.
pub fn compute_feature_stats(
    in_csv: &Path,
    out_json: &Path,
    config: &FilterConfig,
) -> Result<Vec<FeatureStat>, PipelineError> {
    require_suffix(out_json, ".json")?;

    let (mut reader, schema) = open_schema(in_csv)?;
    let mut acc = StatsAccumulator::new(schema.trainable_columns());

    for (idx, result) in reader.records().enumerate() {
        let values = result?.iter().map(str::to_string).collect();
        let record = RawRecord::new(schema.clone(), values, idx)?;
        if !is_good_row(&record, config)? {
            continue;
        }
        acc.push(&record)?;
        if idx % PROGRESS_INTERVAL == 0 {
            info!("processing row {idx}");
        }
    }

    info!("accumulated {} filtered rows from {}", acc.n_rows(), in_csv.display());
    let stats = acc.finish()?;
    save_stat_manifest(out_json, &stats)?;
    info!("wrote statistics manifest {}", out_json.display());
    Ok(stats)
}

// ============================================================================
// Second pass: conversion
// ============================================================================

/// Options for [`fextract_to_dataset`].
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Row budget for the training container.
    pub num_train_rows: usize,
    /// Suppress the remainder (test) container instead of requiring it.
    pub no_dump_remaining: bool,
    /// Statistics manifest enabling standardization; `None` leaves raw values.
    pub stat_json: Option<PathBuf>,
    /// Row-acceptance configuration.
    pub filter: FilterConfig,
    /// Outlier cap for standardization.
    pub cap: f32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            num_train_rows: 1_000_000,
            no_dump_remaining: false,
            stat_json: None,
            filter: FilterConfig::default(),
            cap: STANDARDIZE_CAP,
        }
    }
}

/// Files produced by one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertSummary {
    pub n_rows: usize,
    pub n_features: usize,
    pub train_container: PathBuf,
    pub test_container: Option<PathBuf>,
    pub header_file: PathBuf,
    pub order_manifest: PathBuf,
}

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Convert a raw fextract CSV into standardized dataset containers.
///
/// Streams the corpus once: filter, encode, accumulate. With a statistics
/// manifest the feature columns are standardized (capped z-score) before
/// serialization; one-hot columns carry no stat and pass through unchanged.
/// Rows up to the budget go to `<prefix>.train.fxds`, the remainder to
/// `<prefix>.test.fxds` unless suppressed.
pub fn fextract_to_dataset(
    in_csv: &Path,
    out_prefix: &Path,
    options: &ConvertOptions,
) -> Result<ConvertSummary, PipelineError> {
    if options.num_train_rows == 0 {
        return Err(PipelineError::ZeroTrainBudget);
    }
    let (mut reader, schema) = open_schema(in_csv)?;

    // Configuration errors surface before any row is processed.
    let stats_by_name: Option<HashMap<String, FeatureStat>> = match &options.stat_json {
        Some(path) => {
            let stats = crate::io::manifest::load_stat_manifest(path)?;
            validate_feature_sets(&stats, &schema.trainable_columns())?;
            Some(stats.into_iter().map(|s| (s.name.clone(), s)).collect())
        }
        None => None,
    };

    let mut encoder = RowEncoder::new();
    let mut builder = DatasetBuilder::new();

    for (idx, result) in reader.records().enumerate() {
        let values = result?.iter().map(str::to_string).collect();
        let record = RawRecord::new(schema.clone(), values, idx)?;
        if !is_good_row(&record, &options.filter)? {
            continue;
        }
        builder.push(encoder.encode(&record)?)?;
        if idx % PROGRESS_INTERVAL == 0 {
            info!("processing row {idx}");
        }
        // The row budget is a deterministic early stop when no remainder
        // container is requested.
        if options.no_dump_remaining && builder.n_rows() == options.num_train_rows {
            break;
        }
    }

    if builder.n_rows() == 0 {
        return Err(PipelineError::EmptyTrainData);
    }
    // The order is established by the first accepted row, so it exists here.
    let order = match encoder.order() {
        Some(order) if !order.is_empty() => order.clone(),
        _ => return Err(PipelineError::EmptyTrainData),
    };

    let mut dataset = builder.commit(order)?;
    info!(
        "encoded {} rows x {} features from {}",
        dataset.n_rows(),
        dataset.n_features(),
        in_csv.display()
    );

    if let Some(stats) = &stats_by_name {
        standardize_dataset(&mut dataset, stats, options.cap)?;
    }

    let n = dataset.n_rows();
    let train_end = options.num_train_rows.min(n);
    if !options.no_dump_remaining && n <= options.num_train_rows {
        // Checked before any file is written so a failed run leaves nothing.
        return Err(PipelineError::EmptyTestData);
    }

    let train_container = suffixed(out_prefix, ".train.fxds");
    let test_container = suffixed(out_prefix, ".test.fxds");
    let header_file = suffixed(out_prefix, ".train.header");
    let order_manifest = suffixed(out_prefix, ".features.order.json");

    save_header_file(&header_file, dataset.order())?;
    save_feature_order(&order_manifest, dataset.order())?;

    let train = dataset.rows(0, train_end)?;
    save_dataset(&train_container, &train)?;
    info!("wrote {} training rows to {}", train.n_rows(), train_container.display());

    let test_written = if n > train_end && !options.no_dump_remaining {
        let test = dataset.rows(train_end, n)?;
        save_dataset(&test_container, &test)?;
        info!("wrote {} test rows to {}", test.n_rows(), test_container.display());
        Some(test_container)
    } else {
        None
    };

    Ok(ConvertSummary {
        n_rows: n,
        n_features: dataset.n_features(),
        train_container,
        test_container: test_written,
        header_file,
        order_manifest,
    })
}

fn standardize_dataset(
    dataset: &mut FextractDataset,
    stats: &HashMap<String, FeatureStat>,
    cap: f32,
) -> Result<(), ZeroStdev> {
    let names: Vec<String> = dataset.order().names().to_vec();
    for (idx, name) in names.iter().enumerate() {
        if let Some(stat) = stats.get(name) {
            standardize_column(dataset.features_mut().column_mut(idx), stat, cap)?;
        }
    }
    Ok(())
}
