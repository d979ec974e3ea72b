use super::packing::{pack_padded, PackOrder, PackedSequence};
use super::CaptionDecoder;
use crate::cells::LstmState;
use crate::error::{CaptionError, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

impl<B: Backend> CaptionDecoder<B> {
    /// Teacher-forced pass over a padded caption batch.
    ///
    /// # Arguments
    /// * `features` - Image features, `[batch, embed_size]`
    /// * `captions` - Padded token ids, `[batch, steps]`
    /// * `lengths` - Valid positions per sequence, counting the image step, so
    ///   each must be in `1..=steps + 1`
    ///
    /// # Returns
    /// Scores for every valid position, `[sum(lengths), vocab_size]`, in
    /// [`PackOrder::SequenceMajor`] order.
    pub fn forward(
        &self,
        features: Tensor<B, 2>,
        captions: Tensor<B, 2, Int>,
        lengths: &[usize],
    ) -> Result<PackedSequence<B>> {
        self.forward_with_order(features, captions, lengths, PackOrder::SequenceMajor)
    }

    /// [`forward`](Self::forward) with an explicit row order for the packed
    /// scores. [`PackOrder::TimeMajor`] requires `lengths` sorted descending.
    pub fn forward_with_order(
        &self,
        features: Tensor<B, 2>,
        captions: Tensor<B, 2, Int>,
        lengths: &[usize],
        order: PackOrder,
    ) -> Result<PackedSequence<B>> {
        let scores = self.scores(features, captions)?;
        pack_padded(scores, lengths, order)
    }

    /// Unpacked scores for every unrolled position, `[batch, steps + 1, vocab_size]`.
    ///
    /// Position 0 is conditioned on the image alone; position `t` has seen the
    /// image and caption tokens `0..t`.
    pub fn scores(&self, features: Tensor<B, 2>, captions: Tensor<B, 2, Int>) -> Result<Tensor<B, 3>> {
        let batch_size = self.check_features(&features)?;
        let [caption_batch, steps] = captions.dims();
        if caption_batch != batch_size {
            return Err(CaptionError::Shape {
                operand: "captions",
                expected: vec![batch_size, steps],
                actual: vec![caption_batch, steps],
            });
        }

        log::debug!(
            "teacher-forced decode: batch={} unrolled_steps={}",
            batch_size,
            steps + 1
        );

        let device = features.device();

        // Image feature acts as the t=0 input
        let embeddings = self.embed_tokens(captions);
        let inputs = Tensor::cat(vec![features.unsqueeze_dim::<3>(1), embeddings], 1);

        let state = LstmState::zeros(batch_size, self.hidden_size(), &device);
        let (hiddens, _) = self.lstm.forward(inputs, Some(state))?;

        Ok(self.project(hiddens))
    }
}
