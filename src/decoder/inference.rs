use super::CaptionDecoder;
use crate::cells::LstmState;
use crate::error::{expect_positive, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

/// Progress of a greedy decode.
#[derive(Debug)]
enum Phase<B: Backend> {
    /// Nothing consumed yet; the image feature is the first input.
    AwaitingFirstInput {
        features: Tensor<B, 2>,
        state: LstmState<B>,
    },
    /// `step` tokens emitted; `input` is the embedding of the last one.
    Stepping {
        step: usize,
        input: Tensor<B, 2>,
        state: LstmState<B>,
    },
    Done,
}

/// Iterator over greedily decoded tokens, one `[batch]` id tensor per step.
///
/// Each step feeds the embedding of the previous arg-max token back into the
/// recurrence. The iterator yields exactly `max_steps` items unless a step
/// fails, in which case it yields that error and then stops.
#[derive(Debug)]
pub struct GreedySteps<'a, B: Backend> {
    decoder: &'a CaptionDecoder<B>,
    phase: Phase<B>,
    max_steps: usize,
}

impl<B: Backend> Iterator for GreedySteps<'_, B> {
    type Item = Result<Tensor<B, 1, Int>>;

    fn next(&mut self) -> Option<Self::Item> {
        let (step, input, state) = match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::AwaitingFirstInput { features, state } => (0, features, state),
            Phase::Stepping { step, input, state } => (step, input, state),
            Phase::Done => return None,
        };
        if step >= self.max_steps {
            return None;
        }

        log::trace!("greedy step {}/{}", step + 1, self.max_steps);

        let (predicted, state) = match self.decoder.greedy_step(input, state) {
            Ok(next) => next,
            Err(err) => return Some(Err(err)),
        };

        // No embedding lookup after the final step
        if step + 1 < self.max_steps {
            let input = self.decoder.embed_predicted(predicted.clone());
            self.phase = Phase::Stepping {
                step: step + 1,
                input,
                state,
            };
        }

        Some(Ok(predicted))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match &self.phase {
            Phase::AwaitingFirstInput { .. } => self.max_steps,
            Phase::Stepping { step, .. } => self.max_steps.saturating_sub(*step),
            Phase::Done => 0,
        };
        (0, Some(remaining))
    }
}

impl<B: Backend> CaptionDecoder<B> {
    /// Greedy decoding for `max_seq_length` steps.
    ///
    /// # Arguments
    /// * `features` - Image features, `[batch, embed_size]`
    /// * `state` - Optional initial state; zeros when `None`
    ///
    /// # Returns
    /// Token ids, `[batch, max_seq_length]`. There is no end-of-sequence
    /// early exit: every row always has `max_seq_length` columns.
    pub fn sample(
        &self,
        features: Tensor<B, 2>,
        state: Option<LstmState<B>>,
    ) -> Result<Tensor<B, 2, Int>> {
        self.sample_steps(features, self.max_seq_length, state)
    }

    /// [`sample`](Self::sample) with an explicit step budget.
    pub fn sample_steps(
        &self,
        features: Tensor<B, 2>,
        max_steps: usize,
        state: Option<LstmState<B>>,
    ) -> Result<Tensor<B, 2, Int>> {
        expect_positive("max_steps", max_steps)?;

        let tokens = self
            .greedy_steps(features, max_steps, state)?
            .collect::<Result<Vec<_>>>()?;

        Ok(Tensor::stack(tokens, 1))
    }

    /// Lazily decode up to `max_steps` tokens.
    ///
    /// Shapes of `features` and `state` are validated before the first step.
    pub fn greedy_steps(
        &self,
        features: Tensor<B, 2>,
        max_steps: usize,
        state: Option<LstmState<B>>,
    ) -> Result<GreedySteps<'_, B>> {
        let batch_size = self.check_features(&features)?;
        let state = match state {
            Some(state) => {
                state.check(batch_size, self.hidden_size())?;
                state
            }
            None => self.zero_state(batch_size, &features.device()),
        };

        log::debug!(
            "greedy decode: batch={} max_steps={}",
            batch_size,
            max_steps
        );

        Ok(GreedySteps {
            decoder: self,
            phase: Phase::AwaitingFirstInput { features, state },
            max_steps,
        })
    }

    /// One recurrence step on `[batch, embed_size]` input, returning the
    /// arg-max token per batch element and the next state.
    fn greedy_step(
        &self,
        input: Tensor<B, 2>,
        state: LstmState<B>,
    ) -> Result<(Tensor<B, 1, Int>, LstmState<B>)> {
        let [batch_size, _] = input.dims();

        let (hiddens, state) = self.lstm.forward(input.unsqueeze_dim::<3>(1), Some(state))?;
        let hidden = hiddens.reshape([batch_size, self.hidden_size()]);

        let scores = self.project(hidden); // [batch, vocab_size]
        let predicted = scores.argmax(1).reshape([batch_size]);

        Ok((predicted, state))
    }

    fn embed_predicted(&self, predicted: Tensor<B, 1, Int>) -> Tensor<B, 2> {
        let [batch_size] = predicted.dims();
        self.embed_tokens(predicted.reshape([batch_size, 1]))
            .reshape([batch_size, self.embed_size()])
    }
}
