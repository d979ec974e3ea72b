//! LSTM RNN Layer
//!
//! Drives an [`LstmCell`] across the time axis of a batch, threading the
//! (hidden, cell) pair from one step to the next.

use crate::cells::{LstmCell, LstmCellConfig, LstmState};
use crate::error::{expect_dims, CaptionError, Result};
use burn::config::Config;
use burn::module::Module;
use burn::nn::Initializer;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Configuration for [`Lstm`]
#[derive(Config, Debug)]
pub struct LstmConfig {
    /// Number of input features
    pub input_size: usize,
    /// Number of hidden units
    pub hidden_size: usize,
    /// Whether input is `[batch, seq, features]` (true) or `[seq, batch, features]`
    #[config(default = true)]
    pub batch_first: bool,
    /// Initializer for the cell's affine maps
    #[config(default = "Initializer::KaimingUniform{gain: 0.5773502691896258, fan_out_only: false}")]
    pub initializer: Initializer,
}

impl LstmConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Lstm<B>> {
        let cell = LstmCellConfig::new(self.input_size, self.hidden_size)
            .with_initializer(self.initializer.clone())
            .init(device)?;

        Ok(Lstm {
            cell,
            batch_first: self.batch_first,
        })
    }
}

/// LSTM RNN Layer
///
/// Single-layer, single-direction recurrence. Steps are strictly sequential;
/// the batch is processed together by each cell call.
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct Lstm<B: Backend> {
    /// The LSTM cell for processing individual timesteps
    cell: LstmCell<B>,
    /// Whether input is batch-first
    batch_first: bool,
}

impl<B: Backend> Lstm<B> {
    /// Wrap an existing cell. Input is batch-first.
    pub fn from_cell(cell: LstmCell<B>) -> Self {
        Self {
            cell,
            batch_first: true,
        }
    }

    /// Set whether input is batch-first (default: true)
    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    pub fn cell(&self) -> &LstmCell<B> {
        &self.cell
    }

    /// Get input size
    pub fn input_size(&self) -> usize {
        self.cell.input_size()
    }

    /// Get hidden size
    pub fn hidden_size(&self) -> usize {
        self.cell.hidden_size()
    }

    pub fn batch_first(&self) -> bool {
        self.batch_first
    }

    /// Forward pass through the LSTM layer
    ///
    /// # Arguments
    /// * `input` - Input tensor of shape:
    ///   - 3D: [batch, seq, features] if batch_first=true
    ///   - 3D: [seq, batch, features] if batch_first=false
    /// * `state` - Optional initial state, each tensor `[batch, hidden_size]`;
    ///   zeros when `None`
    ///
    /// # Returns
    /// Tuple of (output, final_state) where:
    /// - output: [batch, seq, hidden_size], the hidden state after every step
    /// - final_state: the state produced by the last step
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        state: Option<LstmState<B>>,
    ) -> Result<(Tensor<B, 3>, LstmState<B>)> {
        let device = input.device();
        let dims = input.dims();

        // Get dimensions
        let (batch_size, seq_len) = if self.batch_first {
            (dims[0], dims[1])
        } else {
            (dims[1], dims[0])
        };
        let expected = if self.batch_first {
            [batch_size, seq_len, self.input_size()]
        } else {
            [seq_len, batch_size, self.input_size()]
        };
        expect_dims("input sequence", dims, expected)?;
        if seq_len == 0 {
            return Err(CaptionError::EmptySequence {
                operand: "input sequence",
            });
        }

        // Initialize state if not provided
        let mut current_state = match state {
            Some(state) => {
                state.check(batch_size, self.hidden_size())?;
                state
            }
            None => LstmState::zeros(batch_size, self.hidden_size(), &device),
        };

        log::trace!(
            "unrolling lstm over {} steps for batch of {}",
            seq_len,
            batch_size
        );

        // Collect outputs for each timestep
        let mut outputs: Vec<Tensor<B, 2>> = Vec::with_capacity(seq_len);

        for t in 0..seq_len {
            // Extract input for this timestep
            let step_input = if self.batch_first {
                // input[batch, t, features] -> [batch, features]
                input
                    .clone()
                    .narrow(1, t, 1)
                    .reshape([batch_size, self.input_size()])
            } else {
                // input[t, batch, features] -> [batch, features]
                input
                    .clone()
                    .narrow(0, t, 1)
                    .reshape([batch_size, self.input_size()])
            };

            current_state = self.cell.forward(step_input, current_state)?;
            outputs.push(current_state.hidden.clone());
        }

        // Stack outputs into final tensor
        let output = Tensor::stack(outputs, 1); // [batch, seq, hidden_size]
        Ok((output, current_state))
    }

    /// Advance the recurrence by exactly one step.
    ///
    /// Equivalent to [`forward`](Self::forward) over a length-1 sequence, with
    /// the time axis removed from the output.
    pub fn step(
        &self,
        input: Tensor<B, 2>,
        state: LstmState<B>,
    ) -> Result<(Tensor<B, 2>, LstmState<B>)> {
        let state = self.cell.forward(input, state)?;
        Ok((state.hidden.clone(), state))
    }
}
