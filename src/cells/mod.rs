//! # Recurrent Cell
//!
//! This module provides the single-timestep LSTM cell. The cell processes one
//! timestep at a time and is wrapped by [`crate::rnn::Lstm`] for sequence
//! processing.
//!
//! ## Gate Layout
//!
//! Both affine maps produce a `4 * hidden_size` vector. Their sum is split into
//! four contiguous regions, in this order:
//!
//! ```text
//! z = W_x @ x + b_x + W_h @ h + b_h  =  [ i | f | g | o ]
//! c' = σ(f) × c + σ(i) × tanh(g)
//! h' = σ(o) × tanh(c')
//! ```
//!
//! [`Gate`] names the regions; there is no per-gate object.
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape | Description |
//! |--------|-------|-------------|
//! | `input` | `[batch, input_size]` | Input features |
//! | `state.hidden` | `[batch, hidden_size]` | Previous hidden state |
//! | `state.cell` | `[batch, hidden_size]` | Previous cell state |
//!
//! Inputs with extra leading dimensions can be stepped with
//! [`LstmCell::forward_flat`].
//!
//! ## Example
//!
//! ```ignore
//! use captioner::cells::{LstmCellConfig, LstmState};
//!
//! let cell = LstmCellConfig::new(16, 32).init::<Backend>(&device)?;
//! let state = LstmState::zeros(batch, 32, &device);
//! let next = cell.forward(input, state)?;
//! // next.hidden: [batch, 32]
//! // next.cell:   [batch, 32]
//! ```

pub mod lstm_cell;

pub use lstm_cell::{Gate, LstmCell, LstmCellConfig, LstmState};
