//! # Recurrence Over Sequences
//!
//! [`Lstm`] runs an [`LstmCell`](crate::cells::LstmCell) across the time axis
//! of a batch. It is used in two modes:
//!
//! - **Full unroll**: `forward` over `[batch, seq_len, features]`, returning the
//!   hidden state at every step plus the final state.
//! - **Single step**: `forward` over a length-1 sequence (or [`Lstm::step`]),
//!   chaining the returned state into the next call.
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape | Notes |
//! |--------|-------|-------|
//! | input (batch-first) | `[batch, seq_len, input_size]` | default |
//! | input (sequence-first) | `[seq_len, batch, input_size]` | `with_batch_first(false)` |
//! | output | `[batch, seq_len, hidden_size]` | always batch-first |
//! | state | `[batch, hidden_size]` × 2 | hidden and cell |
//!
//! ## Chained Single Steps
//!
//! ```ignore
//! let lstm = LstmConfig::new(input_size, hidden_size).init::<Backend>(&device)?;
//!
//! let (out1, state) = lstm.forward(step1, None)?;
//! let (out2, state) = lstm.forward(step2, Some(state))?;
//! // identical to one forward over the concatenation of step1 and step2
//! ```
//!
//! State never outlives a call unless the caller passes it back in.

pub mod lstm;

pub use lstm::{Lstm, LstmConfig};
