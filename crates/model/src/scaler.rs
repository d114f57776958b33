//! Fitted min-max scaling of the engineered feature vector.
//!
//! The scaler is fitted offline and loaded read-only. Its column order must
//! match [`ENGINEERED_FEATURE_NAMES`], and column [`POINTS_COLUMN`] carries
//! the points range used to de-scale the model output.

use serde::{Deserialize, Serialize};

use crate::error::ScalerError;

/// Number of engineered features the scaler is expected to be fitted on.
pub const ENGINEERED_FEATURE_COUNT: usize = 7;

/// Column order shared by training-time fitting and inference-time lookup.
pub const ENGINEERED_FEATURE_NAMES: [&str; ENGINEERED_FEATURE_COUNT] = [
    "avg_pts_5",
    "avg_min_5",
    "pts_trend",
    "home_next",
    "opp_def",
    "pts_rolling_5",
    "pts_rolling_10",
];

/// Fitted column whose range de-scales the model's points output.
pub const POINTS_COLUMN: usize = 0;

/// On-disk scaler export.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerArtifact {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    data_min: Vec<f64>,
    data_max: Vec<f64>,
}

/// Immutable per-feature min/max parameters. Never refitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ScalerArtifact")]
pub struct ScalerState {
    feature_names: Option<Vec<String>>,
    data_min: Vec<f64>,
    data_max: Vec<f64>,
}

impl TryFrom<ScalerArtifact> for ScalerState {
    type Error = ScalerError;

    fn try_from(artifact: ScalerArtifact) -> Result<Self, Self::Error> {
        Self::new(artifact.feature_names, artifact.data_min, artifact.data_max)
    }
}

impl ScalerState {
    /// Builds a scaler from fitted parameters.
    ///
    /// # Errors
    /// Returns `NotFitted` when the parameter vectors are empty, disagree in
    /// length, or hold non-finite values.
    pub fn new(
        feature_names: Option<Vec<String>>,
        data_min: Vec<f64>,
        data_max: Vec<f64>,
    ) -> Result<Self, ScalerError> {
        if data_min.is_empty() {
            return Err(ScalerError::NotFitted("no fitted features".to_string()));
        }
        if data_min.len() != data_max.len() {
            return Err(ScalerError::NotFitted(format!(
                "{} minimums but {} maximums",
                data_min.len(),
                data_max.len()
            )));
        }
        if data_min.iter().chain(&data_max).any(|v| !v.is_finite()) {
            return Err(ScalerError::NotFitted(
                "non-finite fitted bound".to_string(),
            ));
        }
        if let Some(names) = &feature_names {
            if names.len() != data_min.len() {
                return Err(ScalerError::NotFitted(format!(
                    "{} feature names for {} fitted features",
                    names.len(),
                    data_min.len()
                )));
            }
        }
        Ok(Self {
            feature_names,
            data_min,
            data_max,
        })
    }

    /// Number of fitted features.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.data_min.len()
    }

    #[must_use]
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Checks that the fitted columns line up with the engineered vector.
    ///
    /// # Errors
    /// Returns `FeatureMismatch` on a count difference and
    /// `FeatureNameMismatch` on the first differing name.
    pub fn check_alignment(&self) -> Result<(), ScalerError> {
        if self.feature_count() != ENGINEERED_FEATURE_COUNT {
            return Err(ScalerError::FeatureMismatch {
                expected: ENGINEERED_FEATURE_COUNT,
                actual: self.feature_count(),
            });
        }
        if let Some(names) = &self.feature_names {
            let mismatch = names
                .iter()
                .zip(ENGINEERED_FEATURE_NAMES)
                .enumerate()
                .find(|(_, (actual, expected))| actual.as_str() != *expected);
            if let Some((position, (actual, expected))) = mismatch {
                return Err(ScalerError::FeatureNameMismatch {
                    position,
                    expected: expected.to_string(),
                    actual: actual.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.check_alignment().is_ok()
    }

    /// Scales the engineered vector with `(x - min) / (max - min)` per feature.
    ///
    /// Zero-range features use a divisor of 1.0.
    ///
    /// # Errors
    /// Returns a feature mismatch when the scaler does not fit the vector.
    pub fn transform(
        &self,
        features: &[f64; ENGINEERED_FEATURE_COUNT],
    ) -> Result<[f64; ENGINEERED_FEATURE_COUNT], ScalerError> {
        self.check_alignment()?;
        let mut scaled = [0.0; ENGINEERED_FEATURE_COUNT];
        for (i, value) in features.iter().enumerate() {
            scaled[i] = (value - self.data_min[i]) / self.range(i);
        }
        Ok(scaled)
    }

    /// Maps a scaled points value back to physical points using the
    /// [`POINTS_COLUMN`] range.
    #[must_use]
    pub fn inverse_scale_points(&self, scaled: f64) -> f64 {
        let min = self.data_min[POINTS_COLUMN];
        let max = self.data_max[POINTS_COLUMN];
        scaled * (max - min) + min
    }

    fn range(&self, i: usize) -> f64 {
        let range = self.data_max[i] - self.data_min[i];
        if range == 0.0 {
            1.0
        } else {
            range
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> ScalerState {
        ScalerState::new(
            Some(ENGINEERED_FEATURE_NAMES.iter().map(ToString::to_string).collect()),
            vec![0.0, 10.0, -5.0, 0.0, 100.0, 0.0, 0.0],
            vec![40.0, 40.0, 5.0, 1.0, 120.0, 40.0, 40.0],
        )
        .unwrap()
    }

    #[test]
    fn test_transform_min_max() {
        let scaler = fitted();
        let scaled = scaler
            .transform(&[20.0, 25.0, 0.0, 1.0, 110.0, 10.0, 30.0])
            .unwrap();
        let expected = [0.5, 0.5, 0.5, 1.0, 0.5, 0.25, 0.75];
        for (a, b) in scaled.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12, "{a} != {b}");
        }
    }

    #[test]
    fn test_inverse_points_is_exact_inverse() {
        let scaler = fitted();
        for v in [0.0, 0.5, 13.25, 27.0, 40.0] {
            let scaled = scaler
                .transform(&[v, 20.0, 0.0, 0.0, 110.0, v, v])
                .unwrap();
            let restored = scaler.inverse_scale_points(scaled[POINTS_COLUMN]);
            assert!((restored - v).abs() < 1e-9, "{restored} != {v}");
        }
    }

    #[test]
    fn test_zero_range_feature_uses_unit_divisor() {
        let scaler = ScalerState::new(None, vec![5.0; 7], vec![5.0; 7]).unwrap();
        let scaled = scaler.transform(&[7.0; 7]).unwrap();
        assert!(scaled.iter().all(|v| (v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_count_mismatch_is_feature_mismatch() {
        let scaler = ScalerState::new(None, vec![0.0; 6], vec![1.0; 6]).unwrap();
        let err = scaler.transform(&[0.0; 7]).unwrap_err();
        assert_eq!(
            err,
            ScalerError::FeatureMismatch {
                expected: 7,
                actual: 6
            }
        );
        assert!(err.is_feature_mismatch());
        assert!(!scaler.is_aligned());
        // points range is still usable for the fallback path
        assert!((scaler.inverse_scale_points(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_name_mismatch_is_feature_mismatch() {
        let mut names: Vec<String> = ENGINEERED_FEATURE_NAMES.iter().map(ToString::to_string).collect();
        names.swap(0, 1);
        let scaler = ScalerState::new(Some(names), vec![0.0; 7], vec![1.0; 7]).unwrap();
        let err = scaler.check_alignment().unwrap_err();
        assert!(matches!(err, ScalerError::FeatureNameMismatch { position: 0, .. }));
        assert!(err.is_feature_mismatch());
    }

    #[test]
    fn test_unfitted_parameters_rejected() {
        assert!(matches!(
            ScalerState::new(None, vec![], vec![]),
            Err(ScalerError::NotFitted(_))
        ));
        assert!(matches!(
            ScalerState::new(None, vec![0.0; 7], vec![1.0; 6]),
            Err(ScalerError::NotFitted(_))
        ));
        assert!(matches!(
            ScalerState::new(None, vec![f64::NAN; 7], vec![1.0; 7]),
            Err(ScalerError::NotFitted(_))
        ));
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{"data_min":[0,0,0,0,0,0,0],"data_max":[50,48,10,1,125,50,50]}"#;
        let scaler: ScalerState = serde_json::from_str(json).unwrap();
        assert!(scaler.is_aligned());
        assert!(scaler.feature_names().is_none());
        assert!((scaler.inverse_scale_points(0.5) - 25.0).abs() < 1e-12);

        let bad = r#"{"data_min":[],"data_max":[]}"#;
        assert!(serde_json::from_str::<ScalerState>(bad).is_err());
    }
}
