use crate::error::{expect_dims, expect_positive, CaptionError, Result};
use burn::config::Config;
use burn::module::{Module, Param};
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use std::ops::Range;

/// The four regions of the combined gate pre-activation, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Gate {
    /// `i`, admits the candidate into the cell state (sigmoid)
    Input,
    /// `f`, decays the previous cell state (sigmoid)
    Forget,
    /// `g`, candidate information (tanh)
    Candidate,
    /// `o`, exposes the cell state as hidden state (sigmoid)
    Output,
}

impl Gate {
    /// Position of this gate's chunk inside the `4 * hidden_size` vector
    pub fn index(self) -> usize {
        match self {
            Gate::Input => 0,
            Gate::Forget => 1,
            Gate::Candidate => 2,
            Gate::Output => 3,
        }
    }

    /// Column range of this gate for the given hidden size
    pub fn region(self, hidden_size: usize) -> Range<usize> {
        let start = self.index() * hidden_size;
        start..start + hidden_size
    }
}

/// Hidden and cell state carried between steps, each of shape `[batch, hidden_size]`.
///
/// The pair is threaded by value through every loop in the crate; nothing keeps
/// a copy once a forward pass returns.
#[derive(Debug, Clone)]
pub struct LstmState<B: Backend> {
    pub hidden: Tensor<B, 2>,
    pub cell: Tensor<B, 2>,
}

impl<B: Backend> LstmState<B> {
    pub fn new(hidden: Tensor<B, 2>, cell: Tensor<B, 2>) -> Self {
        Self { hidden, cell }
    }

    /// Zero-filled state for a fresh forward pass
    pub fn zeros(batch_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            hidden: Tensor::zeros([batch_size, hidden_size], device),
            cell: Tensor::zeros([batch_size, hidden_size], device),
        }
    }

    pub(crate) fn check(&self, batch_size: usize, hidden_size: usize) -> Result<()> {
        expect_dims("hidden state", self.hidden.dims(), [batch_size, hidden_size])?;
        expect_dims("cell state", self.cell.dims(), [batch_size, hidden_size])
    }
}

/// Configuration for [`LstmCell`]
#[derive(Config, Debug)]
pub struct LstmCellConfig {
    /// Size of the input features
    pub input_size: usize,
    /// Size of the hidden and cell state
    pub hidden_size: usize,
    /// Initializer for both affine maps
    #[config(default = "Initializer::KaimingUniform{gain: 0.5773502691896258, fan_out_only: false}")]
    pub initializer: Initializer,
}

impl LstmCellConfig {
    /// Build the cell, rejecting zero sizes.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<LstmCell<B>> {
        expect_positive("input_size", self.input_size)?;
        expect_positive("hidden_size", self.hidden_size)?;

        let input_map = LinearConfig::new(self.input_size, 4 * self.hidden_size)
            .with_bias(true)
            .with_initializer(self.initializer.clone())
            .init(device);

        let recurrent_map = LinearConfig::new(self.hidden_size, 4 * self.hidden_size)
            .with_bias(true)
            .with_initializer(self.initializer.clone())
            .init(device);

        Ok(LstmCell {
            input_size: self.input_size,
            hidden_size: self.hidden_size,
            input_map,
            recurrent_map,
        })
    }
}

/// Single-layer LSTM cell.
///
/// Implements one step of the gated recurrence:
/// - z = W_x @ x + b_x + W_h @ h + b_h, split into [i, f, g, o]
/// - i, f, o = sigmoid(.), g = tanh(.)
/// - c' = f * c + i * g
/// - h' = o * tanh(c')
#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    input_size: usize,
    hidden_size: usize,
    input_map: Linear<B>,     // Maps input to 4 * hidden_size
    recurrent_map: Linear<B>, // Maps hidden state to 4 * hidden_size
}

impl<B: Backend> LstmCell<B> {
    /// Get the input size
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Get the hidden size
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Overwrite one gate's slice of the input-side bias with `value`.
    ///
    /// The recurrent-side bias is left untouched, so the effective gate bias is
    /// `value + b_h[gate]`.
    pub fn with_gate_bias(mut self, gate: Gate, value: f32) -> Self {
        let region = gate.region(self.hidden_size);
        if let Some(bias) = self.input_map.bias.take() {
            let bias = bias.val();
            let device = bias.device();
            let fill = Tensor::<B, 1>::full([self.hidden_size], value, &device);
            self.input_map.bias = Some(Param::from_tensor(bias.slice_assign([region], fill)));
        }
        self
    }

    /// Perform one step of the recurrence
    ///
    /// # Arguments
    /// * `input` - Input tensor of shape `[batch_size, input_size]`
    /// * `state` - Hidden and cell state, each of shape `[batch_size, hidden_size]`
    ///
    /// # Returns
    /// The next state, same shapes as `state`
    pub fn forward(&self, input: Tensor<B, 2>, state: LstmState<B>) -> Result<LstmState<B>> {
        let [batch_size, _] = input.dims();
        expect_dims("input", input.dims(), [batch_size, self.input_size])?;
        state.check(batch_size, self.hidden_size)?;

        let LstmState { hidden, cell } = state;

        // One combined affine transform per operand, summed
        let z = self.input_map.forward(input) + self.recurrent_map.forward(hidden);

        // Four fixed-offset regions, in Gate order
        let h = self.hidden_size;
        let region = |gate: Gate| z.clone().narrow(1, gate.index() * h, h);

        let input_gate = activation::sigmoid(region(Gate::Input));
        let forget_gate = activation::sigmoid(region(Gate::Forget));
        let candidate = region(Gate::Candidate).tanh();
        let output_gate = activation::sigmoid(region(Gate::Output));

        // c' = f * c + i * g
        let cell = forget_gate * cell + input_gate * candidate;

        // h' = o * tanh(c')
        let hidden = output_gate * cell.clone().tanh();

        Ok(LstmState { hidden, cell })
    }

    /// Like [`forward`](Self::forward), but accepts an input of any rank >= 2 and
    /// flattens every leading dimension into the batch axis first.
    ///
    /// An input of shape `[a, b, input_size]` is stepped as `[a * b, input_size]`,
    /// so `state` must carry `a * b` rows.
    pub fn forward_flat<const D: usize>(
        &self,
        input: Tensor<B, D>,
        state: LstmState<B>,
    ) -> Result<LstmState<B>> {
        if D < 2 {
            return Err(CaptionError::Rank {
                operand: "input",
                minimum: 2,
                actual: D,
            });
        }
        let dims = input.dims();
        let features = dims[D - 1];
        let rows: usize = dims[..D - 1].iter().product();

        self.forward(input.reshape([rows, features]), state)
    }
}
