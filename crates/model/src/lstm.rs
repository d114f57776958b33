//! Stacked LSTM regressor evaluated from exported weights.
//!
//! Weights follow the Keras export layout: for a layer with `h` units the
//! `kernel` is `input x 4h`, the `recurrent_kernel` is `h x 4h` and the
//! `bias` is `4h`, with gate blocks ordered input, forget, cell, output.
//! Each block is loaded into the matching gate of a burn [`Lstm`], so the
//! recurrence is burn's:
//!
//! ```text
//! i_t = σ(x_t·W_i + h_{t-1}·U_i + b_i)
//! f_t = σ(x_t·W_f + h_{t-1}·U_f + b_f)
//! g_t = tanh(x_t·W_c + h_{t-1}·U_c + b_c)
//! o_t = σ(x_t·W_o + h_{t-1}·U_o + b_o)
//! c_t = f_t * c_{t-1} + i_t * g_t
//! h_t = o_t * tanh(c_t)
//! ```
//!
//! Each LSTM layer feeds its full hidden sequence to the next; the final
//! hidden state of the last layer goes through the dense head.

use std::fmt;
use std::ops::Range;

use burn::backend::NdArray;
use burn::module::{Module, Param};
use burn::nn::{Linear, LinearConfig, Lstm, LstmConfig};
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor, TensorData};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ModelError;
use crate::tensor::SequenceInput;
use crate::traits::SequenceModel;

/// CPU backend used for inference.
pub type InferenceBackend = NdArray<f32>;

type Device = <InferenceBackend as Backend>::Device;

/// Activation of a dense layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    fn apply<B: Backend>(self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            Self::Linear => x,
            Self::Relu => burn::tensor::activation::relu(x),
            Self::Sigmoid => burn::tensor::activation::sigmoid(x),
            Self::Tanh => burn::tensor::activation::tanh(x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmLayer {
    pub units: usize,
    pub kernel: Vec<Vec<f64>>,
    pub recurrent_kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl LstmLayer {
    fn input_size(&self) -> usize {
        self.kernel.len()
    }

    fn validate(&self, index: usize, input_size: usize) -> Result<(), ModelError> {
        let h = self.units;
        if h == 0 {
            return Err(ModelError::invalid_weights(format!("lstm layer {index} has no units")));
        }
        if self.kernel.len() != input_size || self.kernel.iter().any(|row| row.len() != 4 * h) {
            return Err(ModelError::invalid_weights(format!(
                "lstm layer {index} kernel must be {input_size}x{}",
                4 * h
            )));
        }
        if self.recurrent_kernel.len() != h
            || self.recurrent_kernel.iter().any(|row| row.len() != 4 * h)
        {
            return Err(ModelError::invalid_weights(format!(
                "lstm layer {index} recurrent kernel must be {h}x{}",
                4 * h
            )));
        }
        if self.bias.len() != 4 * h {
            return Err(ModelError::invalid_weights(format!(
                "lstm layer {index} bias must have {} values",
                4 * h
            )));
        }
        Ok(())
    }

    /// Burn LSTM carrying these weights. Gate block `k` covers columns
    /// `k*h..(k+1)*h`; the recurrent transforms get a zero bias since Keras
    /// keeps a single bias per gate.
    fn to_module<B: Backend>(&self, device: &B::Device) -> Lstm<B> {
        let h = self.units;
        let block = |k: usize| k * h..(k + 1) * h;
        let gate = |k: usize| {
            (
                linear(
                    matrix(&self.kernel, block(k), device),
                    vector(&self.bias[block(k)], device),
                    device,
                ),
                linear(
                    matrix(&self.recurrent_kernel, block(k), device),
                    Tensor::zeros([h], device),
                    device,
                ),
            )
        };

        let mut lstm = LstmConfig::new(self.input_size(), h, true).init(device);
        (lstm.input_gate.input_transform, lstm.input_gate.hidden_transform) = gate(0);
        (lstm.forget_gate.input_transform, lstm.forget_gate.hidden_transform) = gate(1);
        (lstm.cell_gate.input_transform, lstm.cell_gate.hidden_transform) = gate(2);
        (lstm.output_gate.input_transform, lstm.output_gate.hidden_transform) = gate(3);
        lstm
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn validate(&self, index: usize, input_size: usize) -> Result<usize, ModelError> {
        let out = self.bias.len();
        if out == 0 {
            return Err(ModelError::invalid_weights(format!("dense layer {index} has no outputs")));
        }
        if self.weights.len() != input_size || self.weights.iter().any(|row| row.len() != out) {
            return Err(ModelError::invalid_weights(format!(
                "dense layer {index} weights must be {input_size}x{out}"
            )));
        }
        Ok(out)
    }

    fn to_module<B: Backend>(&self, device: &B::Device) -> Linear<B> {
        linear(
            matrix(&self.weights, 0..self.bias.len(), device),
            vector(&self.bias, device),
            device,
        )
    }
}

/// Recurrent stack plus dense head, as a burn module.
#[derive(Module, Debug)]
pub struct RegressorNet<B: Backend> {
    lstm: Vec<Lstm<B>>,
    dense: Vec<Linear<B>>,
}

impl<B: Backend> RegressorNet<B> {
    /// `[batch, steps, features]` in, `[batch, outputs]` out. `None` when the
    /// stack has no LSTM layer.
    fn forward(&self, input: Tensor<B, 3>, activations: &[Activation]) -> Option<Tensor<B, 2>> {
        let mut sequence = input;
        let mut hidden = None;
        for layer in &self.lstm {
            let (output, state) = layer.forward(sequence, None);
            sequence = output;
            hidden = Some(state.hidden);
        }

        let mut x = hidden?;
        for (layer, activation) in self.dense.iter().zip(activations) {
            x = activation.apply(layer.forward(x));
        }
        Some(x)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NetworkArtifact {
    lstm_layers: Vec<LstmLayer>,
    #[serde(default)]
    dense_layers: Vec<DenseLayer>,
}

/// A validated stacked LSTM with a dense regression head.
///
/// The burn module sits behind a mutex so the network can be shared across
/// request handlers; each prediction runs on a clone of it.
#[derive(Deserialize)]
#[serde(try_from = "NetworkArtifact")]
pub struct LstmNetwork {
    net: Mutex<RegressorNet<InferenceBackend>>,
    activations: Vec<Activation>,
    device: Device,
    input_size: usize,
    lstm_depth: usize,
}

impl TryFrom<NetworkArtifact> for LstmNetwork {
    type Error = ModelError;

    fn try_from(artifact: NetworkArtifact) -> Result<Self, Self::Error> {
        Self::new(artifact.lstm_layers, artifact.dense_layers)
    }
}

impl LstmNetwork {
    /// Validates layer shapes and builds the network.
    ///
    /// # Errors
    /// Returns `InvalidWeights` when consecutive layers do not chain or the
    /// head does not end in a single output.
    pub fn new(lstm_layers: Vec<LstmLayer>, dense_layers: Vec<DenseLayer>) -> Result<Self, ModelError> {
        let first = lstm_layers
            .first()
            .ok_or_else(|| ModelError::invalid_weights("at least one lstm layer is required"))?;

        let input_size = first.input_size();
        if input_size == 0 {
            return Err(ModelError::invalid_weights("lstm input width is zero"));
        }
        let mut width = input_size;
        for (index, layer) in lstm_layers.iter().enumerate() {
            layer.validate(index, width)?;
            width = layer.units;
        }
        for (index, layer) in dense_layers.iter().enumerate() {
            width = layer.validate(index, width)?;
        }
        if width != 1 {
            return Err(ModelError::invalid_weights(format!(
                "network must emit a single value, emits {width}"
            )));
        }

        let device = Device::default();
        let net = RegressorNet {
            lstm: lstm_layers.iter().map(|l| l.to_module(&device)).collect(),
            dense: dense_layers.iter().map(|l| l.to_module(&device)).collect(),
        };

        Ok(Self {
            net: Mutex::new(net),
            activations: dense_layers.iter().map(|l| l.activation).collect(),
            device,
            input_size,
            lstm_depth: lstm_layers.len(),
        })
    }

    /// Features per timestep accepted by the first layer.
    #[must_use]
    pub const fn input_size(&self) -> usize {
        self.input_size
    }

    #[must_use]
    pub const fn lstm_depth(&self) -> usize {
        self.lstm_depth
    }

    #[must_use]
    pub fn dense_depth(&self) -> usize {
        self.activations.len()
    }
}

impl fmt::Debug for LstmNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LstmNetwork")
            .field("input_size", &self.input_size)
            .field("lstm_depth", &self.lstm_depth)
            .field("activations", &self.activations)
            .finish_non_exhaustive()
    }
}

impl SequenceModel for LstmNetwork {
    fn predict(&self, input: &SequenceInput) -> Result<f64, ModelError> {
        if input.timesteps() == 0 {
            return Err(ModelError::EmptyInput);
        }
        if input.features() != self.input_size {
            return Err(ModelError::ShapeMismatch {
                expected: self.input_size,
                actual: input.features(),
            });
        }

        let (batch, steps, features) = input.shape();
        let values: Vec<f32> = input.as_slice().iter().map(|&v| v as f32).collect();
        let x = Tensor::<InferenceBackend, 3>::from_data(
            TensorData::new(values, [batch, steps, features]),
            &self.device,
        );
        trace!(batch, steps, features, "Running lstm forward pass");

        let net = self.net.lock().clone();
        let output = net
            .forward(x, &self.activations)
            .ok_or(ModelError::EmptyInput)?;
        let value = f64::from(output.into_scalar().elem::<f32>());
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::NonFiniteOutput(value))
        }
    }

    fn input_features(&self) -> Option<usize> {
        Some(self.input_size)
    }

    fn name(&self) -> &str {
        "lstm"
    }
}

/// `rows x cols` slice of a row-major weight matrix.
fn matrix<B: Backend>(rows: &[Vec<f64>], cols: Range<usize>, device: &B::Device) -> Tensor<B, 2> {
    let values: Vec<f32> = rows
        .iter()
        .flat_map(|row| row[cols.clone()].iter().map(|&v| v as f32))
        .collect();
    Tensor::from_data(TensorData::new(values, [rows.len(), cols.len()]), device)
}

fn vector<B: Backend>(values: &[f64], device: &B::Device) -> Tensor<B, 1> {
    let values: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    let len = values.len();
    Tensor::from_data(TensorData::new(values, [len]), device)
}

/// Linear layer with the given `[in, out]` weight and `[out]` bias.
fn linear<B: Backend>(weight: Tensor<B, 2>, bias: Tensor<B, 1>, device: &B::Device) -> Linear<B> {
    let [d_input, d_output] = weight.dims();
    let mut layer = LinearConfig::new(d_input, d_output).init(device);
    layer.weight = Param::from_tensor(weight);
    layer.bias = Some(Param::from_tensor(bias));
    layer
}
