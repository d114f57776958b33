use crate::error::ModelError;

/// A single-batch `1 x timesteps x features` model input, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceInput {
    timesteps: usize,
    features: usize,
    data: Vec<f64>,
}

impl SequenceInput {
    /// Wraps row-major data.
    ///
    /// # Errors
    /// Returns `EmptyInput` for a zero dimension and `ShapeMismatch` when
    /// `data` does not hold exactly `timesteps * features` values.
    pub fn new(timesteps: usize, features: usize, data: Vec<f64>) -> Result<Self, ModelError> {
        if timesteps == 0 || features == 0 {
            return Err(ModelError::EmptyInput);
        }
        if data.len() != timesteps * features {
            return Err(ModelError::ShapeMismatch {
                expected: timesteps * features,
                actual: data.len(),
            });
        }
        Ok(Self {
            timesteps,
            features,
            data,
        })
    }

    /// One timestep holding `values`, i.e. shape `1 x 1 x N`.
    #[must_use]
    pub fn single_step<const N: usize>(values: [f64; N]) -> Self {
        Self {
            timesteps: 1,
            features: N,
            data: values.to_vec(),
        }
    }

    /// Stacks fixed-width rows into a `1 x rows x N` sequence.
    #[must_use]
    pub fn from_rows<const N: usize>(rows: &[[f64; N]]) -> Self {
        Self {
            timesteps: rows.len(),
            features: N,
            data: rows.iter().flatten().copied().collect(),
        }
    }

    /// `(batch, timesteps, features)`.
    #[must_use]
    pub const fn shape(&self) -> (usize, usize, usize) {
        (1, self.timesteps, self.features)
    }

    #[must_use]
    pub const fn timesteps(&self) -> usize {
        self.timesteps
    }

    #[must_use]
    pub const fn features(&self) -> usize {
        self.features
    }

    /// Features of timestep `t`.
    #[must_use]
    pub fn step(&self, t: usize) -> &[f64] {
        &self.data[t * self.features..(t + 1) * self.features]
    }

    pub fn steps(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.features)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_step_shape() {
        let input = SequenceInput::single_step([0.1; 7]);
        assert_eq!(input.shape(), (1, 1, 7));
        assert_eq!(input.step(0).len(), 7);
    }

    #[test]
    fn test_from_rows_keeps_order() {
        let input = SequenceInput::from_rows(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        assert_eq!(input.shape(), (1, 3, 2));
        assert_eq!(input.step(1), &[3.0, 4.0]);
        assert_eq!(input.steps().count(), 3);
    }

    #[test]
    fn test_new_validates_length() {
        assert!(SequenceInput::new(5, 6, vec![0.0; 30]).is_ok());
        assert_eq!(
            SequenceInput::new(5, 6, vec![0.0; 29]),
            Err(ModelError::ShapeMismatch {
                expected: 30,
                actual: 29
            })
        );
        assert_eq!(SequenceInput::new(0, 6, vec![]), Err(ModelError::EmptyInput));
    }
}
