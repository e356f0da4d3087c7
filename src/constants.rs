//! Shared column names, filter defaults, and manifest keys.

/// Bookkeeping and label-bearing columns excluded from the trainable set.
///
/// These either identify the row (Movie, HoleNumber), carry the label
/// (ArrowQv, CCSToGenomeCigar, CcsToGenomePrevDeletions), or drive filtering
/// (CCSPos, CCSLength, CCSToGenomeStrand) and must never leak into the
/// feature matrix.
pub const NO_TRAIN_FEATURES: &[&str] = &[
    "Movie",
    "HoleNumber",
    "CCSPos",
    "CCSLength",
    "ArrowQv",
    "CCSToGenomeStrand",
    "CCSToGenomeCigar",
    "PrevCcsToGenomeCigar",
    "NextCcsToGenomeCigar",
    "CcsToGenomePrevDeletions",
    "Insertion0_FWD",
    "Insertion0_REV",
];

/// Columns already represented elsewhere in the feature set.
///
/// CCSBaseSNR duplicates SNR_A/SNR_C/SNR_G/SNR_T.
pub const DUPLICATED_FEATURES: &[&str] = &["CCSBaseSNR"];

/// The consensus base-call column, one-hot expanded by the encoder.
pub const BASE_COLUMN: &str = "CCSBase";

/// Name prefixes of local sequence-context columns.
///
/// A column `CCSBasePrev1` / `CCSBaseNext2` holds a single base or the gap
/// symbol `-` and expands into its own 5-way one-hot set.
pub const CONTEXT_PREV_PREFIX: &str = "CCSBasePrev";
pub const CONTEXT_NEXT_PREFIX: &str = "CCSBaseNext";

/// Gap symbol used in sequence-context columns.
pub const GAP_SYMBOL: char = '-';

/// Coverage-depth columns: a single combined field, or a fwd/rev pair summed.
pub const COVERAGE_COLUMN: &str = "NumPasses";
pub const COVERAGE_FWD_COLUMN: &str = "NumPasses_FWD";
pub const COVERAGE_REV_COLUMN: &str = "NumPasses_REV";

/// Filter defaults.
pub const MIN_DIST2END: u32 = 100;
pub const ALLOWED_STRANDS: &str = "F";
pub const ALLOWED_CIGARS: &str = "=IX";

/// Top-level key of the statistics manifest.
pub const BASE_FEATURE_STAT_KEY: &str = "BaseFeatureStat";

/// Top-level key of the feature-order manifest.
pub const ORDERED_FEATURES_KEY: &str = "OrderedFeatures";

/// Default outlier cap for standardization.
pub const STANDARDIZE_CAP: f32 = 4.0;

/// Number of ArrowQv quantization bins (width 10, last bin open-ended).
pub const QV_BINS: usize = 8;

/// Number of alignment-operation label classes.
pub const CIGAR_CLASSES: usize = 4;

/// Trailing columns appended to the prediction output CSV.
pub const PREDICTION_COLUMNS: &[&str] = &[
    "SamplingPredictedCigar",
    "SamplingPredictedMatch",
    "SamplingPredictedI",
    "SamplingPredictedX",
    "SamplingPredictedD",
];

/// Row-progress logging interval for corpus scans.
pub const PROGRESS_INTERVAL: usize = 500_000;
