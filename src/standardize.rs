//! Outlier-capped z-score normalization.

use thiserror::Error;

use crate::stats::FeatureStat;

/// A trainable feature with zero variance: a data or configuration defect,
/// surfaced instead of dividing by zero.
#[derive(Debug, Error)]
#[error("feature '{feature}' has zero standard deviation; cannot standardize")]
pub struct ZeroStdev {
    pub feature: String,
}

/// Standardize a column in place: `(v - mean) / stdev`, clipped to
/// `[-cap, cap]`. The cap bounds outlier influence without discarding rows.
pub fn cap_outlier_standardize(
    values: &mut [f32],
    stat: &FeatureStat,
    cap: f32,
) -> Result<(), ZeroStdev> {
    if stat.stdev == 0.0 {
        return Err(ZeroStdev {
            feature: stat.name.clone(),
        });
    }
    for v in values.iter_mut() {
        *v = ((*v - stat.mean) / stat.stdev).clamp(-cap, cap);
    }
    Ok(())
}

/// Standardize one (possibly strided) feature-matrix column in place.
pub fn standardize_column(
    mut column: ndarray::ArrayViewMut1<'_, f32>,
    stat: &FeatureStat,
    cap: f32,
) -> Result<(), ZeroStdev> {
    if stat.stdev == 0.0 {
        return Err(ZeroStdev {
            feature: stat.name.clone(),
        });
    }
    column.mapv_inplace(|v| ((v - stat.mean) / stat.stdev).clamp(-cap, cap));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STANDARDIZE_CAP;

    fn stat(mean: f32, stdev: f32) -> FeatureStat {
        FeatureStat {
            name: "F1".into(),
            mean,
            stdev,
            min: 0.0,
            max: 4.0,
        }
    }

    #[test]
    fn standardizes_and_caps_outliers() {
        let mut values = vec![0.0, 1.0, 2.0, 3.0, 7.0];
        cap_outlier_standardize(&mut values, &stat(2.0, 1.0), 3.0).unwrap();
        assert_eq!(values, vec![-2.0, -1.0, 0.0, 1.0, 3.0]);
    }

    #[test]
    fn output_is_bounded_by_default_cap() {
        let mut values = vec![-1000.0, -3.9, 0.0, 3.9, 1000.0];
        cap_outlier_standardize(&mut values, &stat(0.0, 1.0), STANDARDIZE_CAP).unwrap();
        assert!(values.iter().all(|v| (-4.0..=4.0).contains(v)));
        assert_eq!(values[0], -4.0);
        assert_eq!(values[4], 4.0);
    }

    #[test]
    fn zero_stdev_is_an_error() {
        let mut values = vec![1.0, 2.0];
        let err = cap_outlier_standardize(&mut values, &stat(1.5, 0.0), 4.0).unwrap_err();
        assert_eq!(err.feature, "F1");
        // Input untouched on error.
        assert_eq!(values, vec![1.0, 2.0]);
    }
}
