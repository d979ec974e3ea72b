//! # Caption Decoder
//!
//! Conditions an LSTM on one image feature vector per batch element and turns
//! its hidden states into vocabulary scores.
//!
//! ```text
//! features [B, E] ──┐
//!                   ├─ cat(time) ─► Lstm ─► Linear ─► scores [B, T+1, V] ─► pack
//! tokens [B, T] ─► Embedding ─┘
//! ```
//!
//! Two loops share the same layers:
//!
//! - [`CaptionDecoder::forward`]: teacher-forced unroll over a padded caption
//!   batch, returning only the valid (non-padding) score rows.
//! - [`CaptionDecoder::sample`]: greedy autoregressive decoding that feeds each
//!   step's arg-max token back as the next input, for exactly
//!   `max_seq_length` steps.
//!
//! Both start every call from a zero (or caller-supplied) state; nothing is
//! cached on the module between calls.

mod inference;
pub mod packing;
mod training;

pub use inference::GreedySteps;
pub use packing::{batch_sizes, pack_padded, pack_targets, PackOrder, PackedSequence};

use crate::cells::LstmState;
use crate::error::{expect_dims, expect_positive, Result};
use crate::rnn::{Lstm, LstmConfig};
use burn::config::Config;
use burn::module::Module;
use burn::nn::{Embedding, EmbeddingConfig, Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

/// Configuration for [`CaptionDecoder`]
#[derive(Config, Debug)]
pub struct CaptionDecoderConfig {
    /// Width of image features and word embeddings
    pub embed_size: usize,
    /// Width of the LSTM hidden and cell state
    pub hidden_size: usize,
    /// Number of tokens in the vocabulary
    pub vocab_size: usize,
    /// Number of tokens produced by greedy sampling
    #[config(default = 20)]
    pub max_seq_length: usize,
}

impl CaptionDecoderConfig {
    /// Reject zero for any structural size.
    pub fn validate(&self) -> Result<()> {
        expect_positive("embed_size", self.embed_size)?;
        expect_positive("hidden_size", self.hidden_size)?;
        expect_positive("vocab_size", self.vocab_size)?;
        expect_positive("max_seq_length", self.max_seq_length)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<CaptionDecoder<B>> {
        self.validate()?;

        let embed = EmbeddingConfig::new(self.vocab_size, self.embed_size).init(device);
        let lstm = LstmConfig::new(self.embed_size, self.hidden_size).init(device)?;
        let output = LinearConfig::new(self.hidden_size, self.vocab_size).init(device);

        log::debug!(
            "initialized caption decoder: embed={} hidden={} vocab={} max_len={}",
            self.embed_size,
            self.hidden_size,
            self.vocab_size,
            self.max_seq_length
        );

        Ok(CaptionDecoder {
            embed,
            lstm,
            output,
            max_seq_length: self.max_seq_length,
        })
    }
}

/// Embedding table, LSTM, and vocabulary projection of a captioning model.
#[derive(Module, Debug)]
pub struct CaptionDecoder<B: Backend> {
    /// Token id -> embedding
    embed: Embedding<B>,
    /// Single-layer recurrence over embeddings
    lstm: Lstm<B>,
    /// Hidden state -> vocabulary scores
    output: Linear<B>,
    max_seq_length: usize,
}

impl<B: Backend> CaptionDecoder<B> {
    /// Assemble a decoder from already-built parts.
    ///
    /// The LSTM input width must equal the embedding width, and the projection
    /// must map the LSTM hidden width to the vocabulary. Both decode loops feed
    /// `[batch, steps, features]`, so the LSTM is switched to batch-first.
    pub fn from_parts(
        embed: Embedding<B>,
        lstm: Lstm<B>,
        output: Linear<B>,
        max_seq_length: usize,
    ) -> Result<Self> {
        expect_positive("max_seq_length", max_seq_length)?;
        let [vocab_size, embed_size] = embed.weight.dims();
        let [d_input, d_output] = output.weight.dims();
        expect_dims("lstm input", [lstm.input_size()], [embed_size])?;
        expect_dims(
            "output projection",
            [d_input, d_output],
            [lstm.hidden_size(), vocab_size],
        )?;

        Ok(Self {
            embed,
            lstm: lstm.with_batch_first(true),
            output,
            max_seq_length,
        })
    }

    pub fn embed_size(&self) -> usize {
        self.lstm.input_size()
    }

    pub fn hidden_size(&self) -> usize {
        self.lstm.hidden_size()
    }

    pub fn vocab_size(&self) -> usize {
        self.embed.weight.dims()[0]
    }

    pub fn max_seq_length(&self) -> usize {
        self.max_seq_length
    }

    pub fn lstm(&self) -> &Lstm<B> {
        &self.lstm
    }

    /// Look up embeddings for `[batch, steps]` token ids.
    pub fn embed_tokens(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.embed.forward(tokens)
    }

    /// Project hidden states of any rank to vocabulary scores.
    pub fn project<const D: usize>(&self, hidden: Tensor<B, D>) -> Tensor<B, D> {
        self.output.forward(hidden)
    }

    /// Zero state sized for this decoder.
    pub fn zero_state(&self, batch_size: usize, device: &B::Device) -> LstmState<B> {
        LstmState::zeros(batch_size, self.hidden_size(), device)
    }

    fn check_features(&self, features: &Tensor<B, 2>) -> Result<usize> {
        let [batch_size, _] = features.dims();
        expect_dims(
            "image features",
            features.dims(),
            [batch_size, self.embed_size()],
        )?;
        Ok(batch_size)
    }
}
