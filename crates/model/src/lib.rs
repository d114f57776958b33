//! Inference side of the points model.
//!
//! [`ScalerState`] applies the offline-fitted min-max normalization and
//! recovers physical points from the scaled output. [`LstmNetwork`] loads
//! the exported recurrent network into burn modules behind the
//! [`SequenceModel`] trait so the predictor can be exercised with any model
//! implementation.

pub mod artifacts;
pub mod error;
pub mod lstm;
pub mod scaler;
pub mod tensor;
pub mod traits;

pub use artifacts::{load_artifacts, load_model, load_scaler, ModelArtifacts};
pub use error::{ArtifactError, ModelError, ScalerError};
pub use lstm::{Activation, DenseLayer, InferenceBackend, LstmLayer, LstmNetwork, RegressorNet};
pub use scaler::{ScalerState, ENGINEERED_FEATURE_COUNT, ENGINEERED_FEATURE_NAMES, POINTS_COLUMN};
pub use tensor::SequenceInput;
pub use traits::SequenceModel;
