//! Startup loading of the exported model and scaler.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::ArtifactError;
use crate::lstm::LstmNetwork;
use crate::scaler::{ScalerState, ENGINEERED_FEATURE_COUNT};

/// Model and scaler loaded once and shared read-only afterwards.
#[derive(Debug)]
pub struct ModelArtifacts {
    pub model: LstmNetwork,
    pub scaler: ScalerState,
}

/// Loads both artifacts. Failure here is fatal for the service.
///
/// A scaler that does not line up with the engineered features is accepted
/// with a warning; predictions then take the fallback sequence path.
///
/// # Errors
/// Returns an error if either file is missing or does not parse.
pub fn load_artifacts(
    model_path: impl AsRef<Path>,
    scaler_path: impl AsRef<Path>,
) -> Result<ModelArtifacts, ArtifactError> {
    let model = load_model(model_path)?;
    let scaler = load_scaler(scaler_path)?;

    if let Err(e) = scaler.check_alignment() {
        warn!(error = %e, "Scaler does not match engineered features; predictions will use the fallback sequence");
    }
    if scaler.is_aligned() && model.input_size() != ENGINEERED_FEATURE_COUNT {
        warn!(
            model_features = model.input_size(),
            "Model input width differs from the engineered feature count"
        );
    }

    Ok(ModelArtifacts { model, scaler })
}

/// Loads the LSTM export.
///
/// # Errors
/// Returns an error if the file is missing or the weights are malformed.
pub fn load_model(path: impl AsRef<Path>) -> Result<LstmNetwork, ArtifactError> {
    let model: LstmNetwork = read_json(path.as_ref())?;
    info!(
        path = %path.as_ref().display(),
        input_features = model.input_size(),
        lstm_layers = model.lstm_depth(),
        dense_layers = model.dense_depth(),
        "Loaded model"
    );
    Ok(model)
}

/// Loads the fitted scaler.
///
/// # Errors
/// Returns an error if the file is missing or the parameters are not fitted.
pub fn load_scaler(path: impl AsRef<Path>) -> Result<ScalerState, ArtifactError> {
    let scaler: ScalerState = read_json(path.as_ref())?;
    info!(
        path = %path.as_ref().display(),
        features = scaler.feature_count(),
        "Loaded scaler"
    );
    Ok(scaler)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MODEL_JSON: &str = r#"{
        "lstm_layers": [{
            "units": 1,
            "kernel": [[0,0,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,0]],
            "recurrent_kernel": [[0,0,0,0]],
            "bias": [0,0,0,0]
        }],
        "dense_layers": [{"weights": [[1.0]], "bias": [0.5]}]
    }"#;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_artifacts() {
        let model = write_temp(MODEL_JSON);
        let scaler = write_temp(r#"{"data_min":[0,0,0,0,0,0,0],"data_max":[40,40,1,1,1,40,40]}"#);

        let artifacts = load_artifacts(model.path(), scaler.path()).unwrap();
        assert_eq!(artifacts.model.input_size(), 7);
        assert!(artifacts.scaler.is_aligned());
    }

    #[test]
    fn test_misaligned_scaler_still_loads() {
        let model = write_temp(MODEL_JSON);
        let scaler = write_temp(r#"{"data_min":[0,0,0,0,0,0],"data_max":[40,48,1,1,125,1]}"#);

        let artifacts = load_artifacts(model.path(), scaler.path()).unwrap();
        assert!(!artifacts.scaler.is_aligned());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let scaler = write_temp(r#"{"data_min":[0],"data_max":[1]}"#);
        let err = load_artifacts("/nonexistent/model.json", scaler.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn test_malformed_weights_are_json_error() {
        let model = write_temp(r#"{"lstm_layers": []}"#);
        let err = load_model(model.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Json { .. }));
        assert!(err.to_string().contains("at least one lstm layer"));
    }
}
