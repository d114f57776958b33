use crate::error::ModelError;
use crate::tensor::SequenceInput;

/// A trained sequence regressor emitting one scaled points value.
///
/// Implementations are immutable after loading and shared across requests.
pub trait SequenceModel: Send + Sync {
    /// Runs inference on a `1 x T x F` input.
    ///
    /// # Errors
    /// Returns an error if the input shape is not accepted or the output is not finite.
    fn predict(&self, input: &SequenceInput) -> Result<f64, ModelError>;

    /// Features per timestep the model accepts, when fixed.
    fn input_features(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str;
}
