//! In-memory dataset accumulation.
//!
//! Encoded rows are appended into four parallel flat buffers and committed
//! once into ndarray arrays. All four arrays share the leading dimension; a
//! disagreement anywhere is a construction error, not a warning.

use ndarray::{Array1, Array2, s};
use thiserror::Error;

use crate::constants::{CIGAR_CLASSES, QV_BINS};
use crate::encode::{EncodedRow, FeatureOrder};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("row has {actual} feature columns, expected {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("dataset arrays disagree on row count: {0}")]
    RowCountMismatch(String),

    #[error("dataset is empty")]
    Empty,
}

/// The corpus-level collection: four parallel arrays plus the feature order
/// binding the feature matrix's columns to names.
#[derive(Debug, Clone)]
pub struct FextractDataset {
    features: Array2<f32>,
    arrow_qvs: Array1<f32>,
    qv_bins: Array2<f32>,
    cigar_labels: Array2<f32>,
    order: FeatureOrder,
}

impl FextractDataset {
    /// Assemble a dataset from its four arrays, enforcing the shared
    /// row-count invariant and the expected label widths.
    pub fn new(
        features: Array2<f32>,
        arrow_qvs: Array1<f32>,
        qv_bins: Array2<f32>,
        cigar_labels: Array2<f32>,
        order: FeatureOrder,
    ) -> Result<Self, DatasetError> {
        let n = features.nrows();
        if arrow_qvs.len() != n || qv_bins.nrows() != n || cigar_labels.nrows() != n {
            return Err(DatasetError::RowCountMismatch(format!(
                "features={}, arrow_qvs={}, qv_bins={}, cigar_labels={}",
                n,
                arrow_qvs.len(),
                qv_bins.nrows(),
                cigar_labels.nrows()
            )));
        }
        if features.ncols() != order.len() {
            return Err(DatasetError::WidthMismatch {
                expected: order.len(),
                actual: features.ncols(),
            });
        }
        if qv_bins.ncols() != QV_BINS || cigar_labels.ncols() != CIGAR_CLASSES {
            return Err(DatasetError::WidthMismatch {
                expected: QV_BINS,
                actual: qv_bins.ncols(),
            });
        }
        Ok(Self {
            features,
            arrow_qvs,
            qv_bins,
            cigar_labels,
            order,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> &Array2<f32> {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut Array2<f32> {
        &mut self.features
    }

    pub fn arrow_qvs(&self) -> &Array1<f32> {
        &self.arrow_qvs
    }

    pub fn qv_bins(&self) -> &Array2<f32> {
        &self.qv_bins
    }

    pub fn cigar_labels(&self) -> &Array2<f32> {
        &self.cigar_labels
    }

    pub fn order(&self) -> &FeatureOrder {
        &self.order
    }

    /// Copy a contiguous row range into a new dataset.
    pub fn rows(&self, start: usize, end: usize) -> Result<Self, DatasetError> {
        if start >= end || end > self.n_rows() {
            return Err(DatasetError::Empty);
        }
        Ok(Self {
            features: self.features.slice(s![start..end, ..]).to_owned(),
            arrow_qvs: self.arrow_qvs.slice(s![start..end]).to_owned(),
            qv_bins: self.qv_bins.slice(s![start..end, ..]).to_owned(),
            cigar_labels: self.cigar_labels.slice(s![start..end, ..]).to_owned(),
            order: self.order.clone(),
        })
    }
}

/// Accumulates [`EncodedRow`]s for a single pipeline invocation.
///
/// `commit` consumes the builder, so a dataset is produced exactly once.
#[derive(Debug)]
pub struct DatasetBuilder {
    n_features: Option<usize>,
    n_rows: usize,
    features: Vec<f32>,
    arrow_qvs: Vec<f32>,
    qv_bins: Vec<f32>,
    cigar_labels: Vec<f32>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self {
            n_features: None,
            n_rows: 0,
            features: Vec::new(),
            arrow_qvs: Vec::new(),
            qv_bins: Vec::new(),
            cigar_labels: Vec::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Append one encoded row.
    pub fn push(&mut self, row: EncodedRow) -> Result<(), DatasetError> {
        match self.n_features {
            None => self.n_features = Some(row.features.len()),
            Some(expected) if expected != row.features.len() => {
                return Err(DatasetError::WidthMismatch {
                    expected,
                    actual: row.features.len(),
                });
            }
            Some(_) => {}
        }
        self.features.extend_from_slice(&row.features);
        self.arrow_qvs.push(row.arrow_qv);
        self.qv_bins.extend_from_slice(&row.qv_bin8);
        self.cigar_labels.extend_from_slice(&row.cigar_label);
        self.n_rows += 1;
        Ok(())
    }

    /// Commit the accumulated rows into a dataset.
    pub fn commit(self, order: FeatureOrder) -> Result<FextractDataset, DatasetError> {
        let n_features = self.n_features.ok_or(DatasetError::Empty)?;
        if self.n_rows == 0 {
            return Err(DatasetError::Empty);
        }
        let features = Array2::from_shape_vec((self.n_rows, n_features), self.features)
            .map_err(|e| DatasetError::RowCountMismatch(e.to_string()))?;
        let qv_bins = Array2::from_shape_vec((self.n_rows, QV_BINS), self.qv_bins)
            .map_err(|e| DatasetError::RowCountMismatch(e.to_string()))?;
        let cigar_labels = Array2::from_shape_vec((self.n_rows, CIGAR_CLASSES), self.cigar_labels)
            .map_err(|e| DatasetError::RowCountMismatch(e.to_string()))?;
        FextractDataset::new(
            features,
            Array1::from_vec(self.arrow_qvs),
            qv_bins,
            cigar_labels,
            order,
        )
    }
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
