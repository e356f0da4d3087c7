//! Reverse path: reconstruct human-readable predictions onto the input CSV.
//!
//! An external model consumes the dataset container and produces a per-row
//! 4-class probability matrix (stored in a predictions container). This
//! module verifies a container's label array against the CSV it came from and
//! appends the predicted operation plus its class probabilities as five
//! trailing columns.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use ndarray::Array2;
use thiserror::Error;

use crate::constants::{CIGAR_CLASSES, PREDICTION_COLUMNS};
use crate::encode::{encode_cigar_label, CigarOp, EncodeError};
use crate::record::{CsvSchema, RawRecord, RecordError};

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("probability matrix has {0} columns, expected 4")]
    WidthMismatch(usize),

    #[error("container has {container_rows} rows, CSV has {csv_rows} rows, must match")]
    RowCountMismatch {
        container_rows: usize,
        csv_rows: usize,
    },

    #[error("container row {row} has label '{container_label}', CSV row encodes to '{csv_label}'")]
    LabelMismatch {
        row: usize,
        container_label: char,
        csv_label: char,
    },

    #[error("malformed label vector at row {0}")]
    MalformedLabel(usize),
}

/// Verify a container's operation-label array against the CSV it was built
/// from: both must have the same row count and each row must encode to the
/// same label class.
pub fn verify_labels(labels: &Array2<f32>, in_csv: &Path) -> Result<(), PredictError> {
    if labels.ncols() != CIGAR_CLASSES {
        return Err(PredictError::WidthMismatch(labels.ncols()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(in_csv)?;
    let headers = reader.headers()?.clone();
    let schema = Arc::new(CsvSchema::new(headers.iter())?);

    let mut csv_rows = 0usize;
    for (idx, result) in reader.records().enumerate() {
        let values = result?.iter().map(str::to_string).collect();
        let record = RawRecord::new(schema.clone(), values, idx)?;
        if idx >= labels.nrows() {
            csv_rows += 1;
            continue;
        }
        let csv_label = CigarOp::from_one_hot(&encode_cigar_label(&record)?)
            .ok_or(PredictError::MalformedLabel(idx))?;
        let container_label = CigarOp::from_one_hot(&labels.row(idx).to_vec())
            .ok_or(PredictError::MalformedLabel(idx))?;
        if csv_label != container_label {
            return Err(PredictError::LabelMismatch {
                row: idx,
                container_label: container_label.to_char(),
                csv_label: csv_label.to_char(),
            });
        }
        csv_rows += 1;
    }

    if csv_rows != labels.nrows() {
        return Err(PredictError::RowCountMismatch {
            container_rows: labels.nrows(),
            csv_rows,
        });
    }
    Ok(())
}

/// Append the predicted operation and its four class probabilities to every
/// row of the input CSV, writing the result to `out_csv`.
///
/// Rows are copied verbatim; the five new trailing columns are the predicted
/// cigar code and the class probabilities formatted to six decimal places.
/// The probability matrix's row count must equal the CSV's data-row count.
pub fn merge_predictions(
    in_csv: &Path,
    probabilities: &Array2<f32>,
    out_csv: &Path,
) -> Result<usize, PredictError> {
    if probabilities.ncols() != CIGAR_CLASSES {
        return Err(PredictError::WidthMismatch(probabilities.ncols()));
    }

    // Count first so a mismatch writes nothing.
    let csv_rows = count_data_rows(in_csv)?;
    if csv_rows != probabilities.nrows() {
        return Err(PredictError::RowCountMismatch {
            container_rows: probabilities.nrows(),
            csv_rows,
        });
    }

    let reader = BufReader::new(File::open(in_csv)?);
    let mut writer = BufWriter::new(File::create(out_csv)?);
    let mut written = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if idx == 0 {
            writeln!(writer, "{line},{}", PREDICTION_COLUMNS.join(","))?;
            continue;
        }
        let row = probabilities.row(idx - 1);
        let predicted = CigarOp::from_one_hot(&row.to_vec())
            .ok_or(PredictError::MalformedLabel(idx - 1))?;
        writeln!(
            writer,
            "{line},{},{:.6},{:.6},{:.6},{:.6}",
            predicted.to_char(),
            row[0],
            row[1],
            row[2],
            row[3]
        )?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

fn count_data_rows(in_csv: &Path) -> Result<usize, PredictError> {
    let reader = BufReader::new(File::open(in_csv)?);
    let mut count = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        line?;
        if idx > 0 {
            count += 1;
        }
    }
    Ok(count)
}
