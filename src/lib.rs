//! # Captioner - LSTM Caption Decoding
//!
//! Recurrent decoding engine for image-captioning pipelines, built on the Burn
//! framework. An image embedding produced by an external visual encoder is fed
//! to a single-layer LSTM as its first input; the LSTM then emits one
//! vocabulary distribution per step.
//!
//! ## Features
//!
//! - **LSTM cell**: one combined affine map split into input/forget/candidate/output gates
//! - **Recurrence**: full-sequence unroll or chained single steps, explicit state threading
//! - **Teacher forcing**: padded caption batches packed down to their valid positions
//! - **Greedy sampling**: arg-max feedback loop with a fixed step budget
//!
//! ## Quick Start
//!
//! ```rust
//! use burn::backend::NdArray;
//! use burn::tensor::{Int, Tensor};
//! use captioner::prelude::*;
//!
//! type Backend = NdArray<f32>;
//! let device = Default::default();
//!
//! let decoder = CaptionDecoderConfig::new(8, 16, 50)
//!     .with_max_seq_length(10)
//!     .init::<Backend>(&device)
//!     .unwrap();
//!
//! let features = Tensor::<Backend, 2>::zeros([2, 8], &device);
//! let captions = Tensor::<Backend, 2, Int>::zeros([2, 4], &device);
//!
//! // Training: lengths count the image step
//! let packed = decoder.forward(features.clone(), captions, &[5, 3]).unwrap();
//! assert_eq!(packed.data().dims(), [8, 50]);
//!
//! // Inference: always max_seq_length tokens per image
//! let tokens = decoder.sample(features, None).unwrap();
//! assert_eq!(tokens.dims(), [2, 10]);
//! ```
//!
//! ## Cell-level Usage
//!
//! ```ignore
//! use captioner::cells::{LstmCellConfig, LstmState};
//!
//! let cell = LstmCellConfig::new(16, 32).init::<Backend>(&device)?;
//! let next = cell.forward(input, LstmState::zeros(batch, 32, &device))?;
//! ```

pub mod cells;
pub mod decoder;
pub mod error;
pub mod rnn;

pub use error::{CaptionError, Result};

pub mod prelude {
    pub use crate::cells::{Gate, LstmCell, LstmCellConfig, LstmState};
    pub use crate::decoder::{
        pack_padded, pack_targets, CaptionDecoder, CaptionDecoderConfig, PackOrder,
        PackedSequence,
    };
    pub use crate::error::{CaptionError, Result};
    pub use crate::rnn::{Lstm, LstmConfig};
}
