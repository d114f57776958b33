use std::path::PathBuf;

use thiserror::Error;

/// The fitted scaler cannot be applied to the engineered feature vector.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScalerError {
    /// Fitted feature count differs from the engineered feature count.
    #[error("scaler fitted on {actual} features, expected {expected}")]
    FeatureMismatch { expected: usize, actual: usize },

    /// Fitted feature names are present and disagree with the engineered order.
    #[error("scaler feature {position} is '{actual}', expected '{expected}'")]
    FeatureNameMismatch {
        position: usize,
        expected: String,
        actual: String,
    },

    /// Minimum and maximum vectors are empty, of different lengths, or non-finite.
    #[error("scaler is not fitted: {0}")]
    NotFitted(String),
}

impl ScalerError {
    /// True for the alignment failures that route prediction to the fallback sequence.
    #[must_use]
    pub const fn is_feature_mismatch(&self) -> bool {
        matches!(
            self,
            Self::FeatureMismatch { .. } | Self::FeatureNameMismatch { .. }
        )
    }
}

/// Inference failures. Every variant aborts the prediction request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("input shape mismatch: expected {expected} features per timestep, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("input sequence is empty")]
    EmptyInput,

    #[error("model produced a non-finite output: {0}")]
    NonFiniteOutput(f64),

    #[error("invalid model weights: {0}")]
    InvalidWeights(String),
}

impl ModelError {
    pub fn invalid_weights(msg: impl Into<String>) -> Self {
        Self::InvalidWeights(msg.into())
    }
}

/// Failures while loading model or scaler artifacts at startup.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
