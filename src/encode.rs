//! Row encoding: categorical expansion, label assignment, QV quantization.
//!
//! An accepted [`RawRecord`] becomes an [`EncodedRow`]: a fixed-order numeric
//! feature vector plus the quality value, its 8-bin one-hot, and the 4-class
//! alignment-operation label.
//!
//! Column order for a run is fixed by the first accepted row (phase 1); every
//! subsequent row is validated against that order (phase 2). Any deviation is
//! a fatal encoding error, never a silent coercion.

use thiserror::Error;

use crate::constants::{BASE_COLUMN, CIGAR_CLASSES, GAP_SYMBOL, QV_BINS};
use crate::record::RawRecord;

// ============================================================================
// Alignment-operation label
// ============================================================================

/// Per-base alignment classification relative to the reference.
///
/// The discriminant doubles as the one-hot index, so encoding and decoding
/// share a single index assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum CigarOp {
    Match = 0,
    Insertion = 1,
    Substitution = 2,
    Deletion = 3,
}

impl CigarOp {
    /// Parse a single-character cigar code.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '=' => Some(Self::Match),
            'I' => Some(Self::Insertion),
            'X' => Some(Self::Substitution),
            'D' => Some(Self::Deletion),
            _ => None,
        }
    }

    /// The single-character cigar code.
    pub fn to_char(self) -> char {
        match self {
            Self::Match => '=',
            Self::Insertion => 'I',
            Self::Substitution => 'X',
            Self::Deletion => 'D',
        }
    }

    /// One-hot index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// 4-wide one-hot encoding.
    pub fn one_hot(self) -> [f32; CIGAR_CLASSES] {
        let mut out = [0.0; CIGAR_CLASSES];
        out[self.index()] = 1.0;
        out
    }

    /// Decode from a one-hot (or probability) vector by argmax.
    ///
    /// Returns `None` for vectors of the wrong width.
    pub fn from_one_hot(values: &[f32]) -> Option<Self> {
        if values.len() != CIGAR_CLASSES {
            return None;
        }
        let mut best = 0;
        for (i, v) in values.iter().enumerate() {
            if *v > values[best] {
                best = i;
            }
        }
        match best {
            0 => Some(Self::Match),
            1 => Some(Self::Insertion),
            2 => Some(Self::Substitution),
            _ => Some(Self::Deletion),
        }
    }
}

// ============================================================================
// Scalar encoders
// ============================================================================

/// Quantize an ArrowQv value into one of 8 contiguous bins of width 10
/// (bin 0 = [0, 10), ..., bin 7 = [70, +inf)), as an 8-wide one-hot.
pub fn arrowqv_bin8(qv: u32) -> [f32; QV_BINS] {
    let bin = ((qv / 10) as usize).min(QV_BINS - 1);
    let mut out = [0.0; QV_BINS];
    out[bin] = 1.0;
    out
}

/// One-hot a consensus base call (case-insensitive ACGT).
fn one_hot_base(base: char) -> Option<[f32; 4]> {
    let idx = match base.to_ascii_uppercase() {
        'A' => 0,
        'C' => 1,
        'G' => 2,
        'T' => 3,
        _ => return None,
    };
    let mut out = [0.0; 4];
    out[idx] = 1.0;
    Some(out)
}

/// One-hot a sequence-context symbol: ACGT plus the gap symbol.
fn one_hot_context(symbol: char) -> Option<[f32; 5]> {
    if symbol == GAP_SYMBOL {
        let mut out = [0.0; 5];
        out[4] = 1.0;
        return Some(out);
    }
    one_hot_base(symbol).map(|b| [b[0], b[1], b[2], b[3], 0.0])
}

/// Suffixes of the 5-way context expansion, in one-hot index order.
pub const CONTEXT_SUFFIXES: [&str; 5] = ["A", "C", "G", "T", "Gap"];

// ============================================================================
// Feature order
// ============================================================================

/// Ordered feature names: the binding contract between the encoder's output
/// and the container's feature-array columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureOrder {
    names: Vec<String>,
}

impl FeatureOrder {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Comma-joined names, the plain-text header file format.
    pub fn to_header_line(&self) -> String {
        self.names.join(",")
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}' has invalid base '{value}', expected ACGT or gap")]
    InvalidBase { column: String, value: String },

    #[error("column '{column}' has invalid cigar '{value}', expected one of =IXD")]
    InvalidCigar { column: String, value: String },

    #[error("column '{column}' has non-numeric value '{value}'")]
    InvalidNumeric { column: String, value: String },

    #[error(
        "row {row} encodes to a different feature set than the first accepted row \
         (expected {expected} columns, got {actual}; first difference at '{difference}')"
    )]
    InconsistentRow {
        row: usize,
        expected: usize,
        actual: usize,
        difference: String,
    },
}

// ============================================================================
// Encoded row and encoder
// ============================================================================

/// One encoded row: the ordered feature vector and its label fields.
#[derive(Debug, Clone)]
pub struct EncodedRow {
    /// Numeric feature columns in [`FeatureOrder`] order.
    pub features: Vec<f32>,
    /// Raw integer quality value, carried as f32.
    pub arrow_qv: f32,
    /// 8-bin one-hot of the quality value.
    pub qv_bin8: [f32; QV_BINS],
    /// 4-class one-hot alignment-operation label.
    pub cigar_label: [f32; CIGAR_CLASSES],
}

/// Two-phase row encoder.
///
/// The first accepted row establishes the [`FeatureOrder`]; every later row
/// must produce the identical column set in the identical order.
#[derive(Debug, Default)]
pub struct RowEncoder {
    order: Option<FeatureOrder>,
    rows_seen: usize,
}

impl RowEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The feature order established by the first accepted row, if any.
    pub fn order(&self) -> Option<&FeatureOrder> {
        self.order.as_ref()
    }

    /// Encode one accepted record.
    pub fn encode(&mut self, record: &RawRecord) -> Result<EncodedRow, EncodeError> {
        let schema = record.schema();
        let mut names: Vec<String> = Vec::new();
        let mut features: Vec<f32> = Vec::new();

        // Surviving numeric columns, header order.
        for column in schema.trainable_columns() {
            let value = record
                .get(&column)
                .ok_or_else(|| EncodeError::MissingColumn(column.clone()))?;
            let parsed: f32 =
                value
                    .trim()
                    .parse()
                    .map_err(|_| EncodeError::InvalidNumeric {
                        column: column.clone(),
                        value: value.to_string(),
                    })?;
            names.push(column);
            features.push(parsed);
        }

        // Base call one-hot.
        let base_value = record
            .get(BASE_COLUMN)
            .ok_or_else(|| EncodeError::MissingColumn(BASE_COLUMN.to_string()))?;
        let base_char = single_char(base_value).ok_or_else(|| EncodeError::InvalidBase {
            column: BASE_COLUMN.to_string(),
            value: base_value.to_string(),
        })?;
        let base_one_hot = one_hot_base(base_char).ok_or_else(|| EncodeError::InvalidBase {
            column: BASE_COLUMN.to_string(),
            value: base_value.to_string(),
        })?;
        for (suffix, value) in ["A", "C", "G", "T"].iter().zip(base_one_hot) {
            names.push(format!("{BASE_COLUMN}{suffix}"));
            features.push(value);
        }

        // Sequence-context one-hots, 5-way each.
        for column in schema.context_columns() {
            let value = record
                .get(&column)
                .ok_or_else(|| EncodeError::MissingColumn(column.clone()))?;
            let symbol = single_char(value).ok_or_else(|| EncodeError::InvalidBase {
                column: column.clone(),
                value: value.to_string(),
            })?;
            let one_hot = one_hot_context(symbol).ok_or_else(|| EncodeError::InvalidBase {
                column: column.clone(),
                value: value.to_string(),
            })?;
            for (suffix, v) in CONTEXT_SUFFIXES.iter().zip(one_hot) {
                names.push(format!("{column}{suffix}"));
                features.push(v);
            }
        }

        let arrow_qv = parse_u32(record, "ArrowQv")?;
        let cigar_label = encode_cigar_label(record)?;

        // Phase 1 establishes the order; phase 2 validates against it.
        match &self.order {
            None => self.order = Some(FeatureOrder::new(names)),
            Some(order) => {
                if order.names() != names.as_slice() {
                    let difference = first_difference(order.names(), &names);
                    return Err(EncodeError::InconsistentRow {
                        row: self.rows_seen,
                        expected: order.len(),
                        actual: names.len(),
                        difference,
                    });
                }
            }
        }
        self.rows_seen += 1;

        Ok(EncodedRow {
            features,
            arrow_qv: arrow_qv as f32,
            qv_bin8: arrowqv_bin8(arrow_qv),
            cigar_label,
        })
    }
}

/// Encode the 4-class label from the (cigar, prior-deletion-count) pair.
///
/// A nonzero prior-deletion count forces the deletion class regardless of the
/// current operation.
pub fn encode_cigar_label(record: &RawRecord) -> Result<[f32; CIGAR_CLASSES], EncodeError> {
    let cigar_value = record
        .get("CCSToGenomeCigar")
        .ok_or_else(|| EncodeError::MissingColumn("CCSToGenomeCigar".to_string()))?;
    let op = single_char(cigar_value)
        .and_then(CigarOp::from_char)
        .ok_or_else(|| EncodeError::InvalidCigar {
            column: "CCSToGenomeCigar".to_string(),
            value: cigar_value.to_string(),
        })?;

    let prev_deletions = match record.get("CcsToGenomePrevDeletions") {
        Some(_) => parse_u32(record, "CcsToGenomePrevDeletions")?,
        None => 0,
    };

    let label = if prev_deletions > 0 {
        CigarOp::Deletion
    } else {
        op
    };
    Ok(label.one_hot())
}

fn single_char(value: &str) -> Option<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn parse_u32(record: &RawRecord, column: &str) -> Result<u32, EncodeError> {
    let value = record
        .get(column)
        .ok_or_else(|| EncodeError::MissingColumn(column.to_string()))?;
    value
        .trim()
        .parse()
        .map_err(|_| EncodeError::InvalidNumeric {
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn first_difference(expected: &[String], actual: &[String]) -> String {
    for (i, e) in expected.iter().enumerate() {
        match actual.get(i) {
            Some(a) if a == e => continue,
            Some(a) => return format!("index {i}: expected '{e}', got '{a}'"),
            None => return format!("index {i}: expected '{e}', got end of row"),
        }
    }
    match actual.get(expected.len()) {
        Some(a) => format!("index {}: unexpected '{a}'", expected.len()),
        None => String::from("identical"),
    }
}
