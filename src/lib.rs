//! fextract: per-base feature extraction for consensus-read training data.
//!
//! This crate turns per-base feature CSVs into standardized numeric datasets
//! for model training, computes the corpus statistics that drive the
//! standardization, and merges model predictions back onto the source CSV.

pub mod constants;
pub mod dataset;
pub mod encode;
pub mod filter;
pub mod io;
pub mod pipeline;
pub mod predict;
pub mod record;
pub mod standardize;
pub mod stats;
