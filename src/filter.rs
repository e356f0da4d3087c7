//! Row acceptance policy.
//!
//! A row participates in the dataset only if it survives every check in
//! [`is_good_row`]. The predicate is a pure function of the record and the
//! configuration so that statistics and encoded arrays are reproducible for
//! identical inputs.

use thiserror::Error;

use crate::constants::{
    ALLOWED_CIGARS, ALLOWED_STRANDS, COVERAGE_COLUMN, COVERAGE_FWD_COLUMN, COVERAGE_REV_COLUMN,
    MIN_DIST2END,
};
use crate::record::RawRecord;

/// A mandatory filter input was absent or did not parse as a number.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}' has non-numeric value '{value}'")]
    InvalidField { column: String, value: String },
}

/// Row-acceptance thresholds and allowed character sets.
///
/// Defaults match the production sampling configuration: forward-strand reads
/// only, at least 100 bp from either read end, cigar restricted to `=IX`.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Minimum distance from the base to the nearer read end.
    pub min_dist_to_end: u32,
    /// Accepted alignment-strand codes.
    pub allowed_strands: Vec<char>,
    /// Accepted alignment-operation codes.
    pub allowed_cigars: Vec<char>,
    /// Inclusive coverage-depth range; `None` leaves that side unbounded.
    pub min_coverage: Option<u32>,
    pub max_coverage: Option<u32>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_dist_to_end: MIN_DIST2END,
            allowed_strands: ALLOWED_STRANDS.chars().collect(),
            allowed_cigars: ALLOWED_CIGARS.chars().collect(),
            min_coverage: None,
            max_coverage: None,
        }
    }
}

impl FilterConfig {
    /// Accept both forward and reverse strands.
    pub fn both_strands(mut self) -> Self {
        self.allowed_strands = vec!['F', 'R'];
        self
    }

    fn strand_allowed(&self, strand: &str) -> bool {
        let mut chars = strand.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.allowed_strands.contains(&c),
            _ => false,
        }
    }

    fn cigar_allowed(&self, cigar: &str) -> bool {
        let mut chars = cigar.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.allowed_cigars.contains(&c),
            _ => false,
        }
    }
}

fn parse_u64(record: &RawRecord, column: &str) -> Result<u64, FilterError> {
    let value = record
        .get(column)
        .ok_or_else(|| FilterError::MissingColumn(column.to_string()))?;
    value.trim().parse().map_err(|_| FilterError::InvalidField {
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Decide whether a record participates in the dataset.
///
/// Checks run in order and short-circuit on the first failing condition:
/// alignment operation, distance to read end, strand, coverage depth.
pub fn is_good_row(record: &RawRecord, config: &FilterConfig) -> Result<bool, FilterError> {
    if let Some(cigar) = record.get("CCSToGenomeCigar") {
        if !config.cigar_allowed(cigar) {
            return Ok(false);
        }
    }

    let length = parse_u64(record, "CCSLength")?;
    let pos = parse_u64(record, "CCSPos")?;
    let dist_to_end = length.abs_diff(pos);
    if dist_to_end < u64::from(config.min_dist_to_end) {
        return Ok(false);
    }

    if let Some(strand) = record.get("CCSToGenomeStrand") {
        if !config.strand_allowed(strand) {
            return Ok(false);
        }
    }

    let coverage = if record.get(COVERAGE_COLUMN).is_some() {
        Some(parse_u64(record, COVERAGE_COLUMN)?)
    } else if record.get(COVERAGE_FWD_COLUMN).is_some() && record.get(COVERAGE_REV_COLUMN).is_some()
    {
        Some(parse_u64(record, COVERAGE_FWD_COLUMN)? + parse_u64(record, COVERAGE_REV_COLUMN)?)
    } else {
        None
    };
    if let Some(depth) = coverage {
        if let Some(min) = config.min_coverage {
            if depth < u64::from(min) {
                return Ok(false);
            }
        }
        if let Some(max) = config.max_coverage {
            if depth > u64::from(max) {
                return Ok(false);
            }
        }
    }

    Ok(true)
}
