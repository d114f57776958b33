//! Startup wiring shared by every command.
//!
//! A dataset that fails to load degrades to an empty one. Model or scaler
//! artifacts that fail to load abort startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use hoops_core::{AppConfig, ConfigLoader};
use hoops_data::Dataset;
use hoops_model::load_artifacts;
use hoops_predictor::PredictionService;

/// Loads the layered configuration rooted at `path`.
///
/// # Errors
/// Returns an error if the file or environment values cannot be parsed.
pub fn load_config(path: &str) -> Result<AppConfig> {
    ConfigLoader::load_from(path).with_context(|| format!("Failed to load configuration from {path}"))
}

/// Loads the dataset and model artifacts into a ready prediction service.
///
/// # Errors
/// Returns an error if the model or scaler artifact cannot be loaded.
pub fn prediction_service(config: &AppConfig) -> Result<PredictionService> {
    let dataset = Dataset::load_or_empty(&config.dataset.path);

    let artifacts = load_artifacts(&config.model.model_path, &config.model.scaler_path)
        .with_context(|| {
            format!(
                "Failed to load model artifacts ({}, {})",
                config.model.model_path, config.model.scaler_path
            )
        })?;
    tracing::info!(
        model = %config.model.model_path,
        lstm_layers = artifacts.model.lstm_depth(),
        dense_layers = artifacts.model.dense_depth(),
        scaler_features = artifacts.scaler.feature_count(),
        "Loaded model artifacts"
    );

    Ok(PredictionService::new(
        Arc::new(dataset),
        Arc::new(artifacts.model),
        Arc::new(artifacts.scaler),
    ))
}
