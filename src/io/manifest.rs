//! JSON side manifests and the plain-text header file.
//!
//! Two manifests accompany each container: the statistics manifest (ordered
//! `FeatureStat` records under `BaseFeatureStat`) and the feature-order
//! manifest (the ordered feature-name list under `OrderedFeatures`). Both are
//! stored as ordered lists, not maps, so JSON diffs stay deterministic.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::FeatureOrder;
use crate::stats::FeatureStat;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed manifest {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Statistics manifest: `{"BaseFeatureStat": [{name, mean, stdev, min, max}, ...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatManifest {
    #[serde(rename = "BaseFeatureStat")]
    pub base_feature_stat: Vec<FeatureStat>,
}

/// Feature-order manifest: `{"OrderedFeatures": ["F1", ...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureOrderManifest {
    #[serde(rename = "OrderedFeatures")]
    pub ordered_features: Vec<String>,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ManifestError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| ManifestError::Json {
        path: path.display().to_string(),
        source,
    })?;
    writer.flush()?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ManifestError> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|source| ManifestError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Persist computed statistics.
pub fn save_stat_manifest(path: &Path, stats: &[FeatureStat]) -> Result<(), ManifestError> {
    write_json(
        path,
        &StatManifest {
            base_feature_stat: stats.to_vec(),
        },
    )
}

/// Load a statistics manifest.
pub fn load_stat_manifest(path: &Path) -> Result<Vec<FeatureStat>, ManifestError> {
    let manifest: StatManifest = read_json(path)?;
    Ok(manifest.base_feature_stat)
}

/// Persist the feature order.
pub fn save_feature_order(path: &Path, order: &FeatureOrder) -> Result<(), ManifestError> {
    write_json(
        path,
        &FeatureOrderManifest {
            ordered_features: order.names().to_vec(),
        },
    )
}

/// Load a feature-order manifest.
pub fn load_feature_order(path: &Path) -> Result<FeatureOrder, ManifestError> {
    let manifest: FeatureOrderManifest = read_json(path)?;
    Ok(FeatureOrder::new(manifest.ordered_features))
}

/// Write the single-line comma-joined column header file.
pub fn save_header_file(path: &Path, order: &FeatureOrder) -> Result<(), ManifestError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(order.to_header_line().as_bytes())?;
    writer.flush()?;
    Ok(())
}
