//! Compaction of padded batches down to their valid positions.
//!
//! A padded batch `[batch, steps, ...]` plus one true length per sequence is
//! turned into a dense `[rows, ...]` tensor holding only positions `t < length`.
//! Rows are gathered with a single `select` over the flattened batch.

use crate::error::{CaptionError, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use serde::{Deserialize, Serialize};

/// Row order of a packed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PackOrder {
    /// All valid steps of sequence 0, then all of sequence 1, and so on.
    /// No ordering requirement on the lengths.
    #[default]
    SequenceMajor,
    /// For each time step, every sequence still active at that step, in batch
    /// order. Lengths must be sorted in descending order.
    TimeMajor,
}

/// Valid rows of a padded batch, together with the lengths they came from.
#[derive(Debug, Clone)]
pub struct PackedSequence<B: Backend> {
    data: Tensor<B, 2>,
    lengths: Vec<usize>,
    order: PackOrder,
}

impl<B: Backend> PackedSequence<B> {
    /// Packed rows, `[sum(lengths), features]`
    pub fn data(&self) -> &Tensor<B, 2> {
        &self.data
    }

    pub fn into_inner(self) -> Tensor<B, 2> {
        self.data
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn order(&self) -> PackOrder {
        self.order
    }

    /// Total number of packed rows
    pub fn num_rows(&self) -> usize {
        self.lengths.iter().sum()
    }

    /// Active sequences per time step. Only meaningful for
    /// [`PackOrder::TimeMajor`], where it gives the size of each row block.
    pub fn batch_sizes(&self) -> Vec<usize> {
        batch_sizes(&self.lengths)
    }
}

/// Number of sequences with `length > t`, for each `t` up to the longest length.
pub fn batch_sizes(lengths: &[usize]) -> Vec<usize> {
    let longest = lengths.iter().copied().max().unwrap_or(0);
    (0..longest)
        .map(|t| lengths.iter().filter(|&&len| len > t).count())
        .collect()
}

/// Validate `lengths` against `steps` unrolled positions and return the flat
/// `batch * steps + t` index of every kept position, in `order`.
pub fn packed_indices(lengths: &[usize], steps: usize, order: PackOrder) -> Result<Vec<i64>> {
    for (index, &length) in lengths.iter().enumerate() {
        if length == 0 {
            return Err(CaptionError::ZeroLength { index });
        }
        if length > steps {
            return Err(CaptionError::Length {
                index,
                length,
                available: steps,
            });
        }
    }

    let flat = |seq: usize, t: usize| (seq * steps + t) as i64;

    let indices = match order {
        PackOrder::SequenceMajor => lengths
            .iter()
            .enumerate()
            .flat_map(|(seq, &len)| (0..len).map(move |t| flat(seq, t)))
            .collect(),
        PackOrder::TimeMajor => {
            for (index, pair) in lengths.windows(2).enumerate() {
                if pair[1] > pair[0] {
                    return Err(CaptionError::UnsortedLengths {
                        index: index + 1,
                        previous: pair[0],
                        length: pair[1],
                    });
                }
            }
            batch_sizes(lengths)
                .into_iter()
                .enumerate()
                .flat_map(|(t, active)| (0..active).map(move |seq| flat(seq, t)))
                .collect()
        }
    };

    Ok(indices)
}

fn check_batch(batch_size: usize, lengths: &[usize]) -> Result<()> {
    if lengths.len() == batch_size {
        Ok(())
    } else {
        Err(CaptionError::Shape {
            operand: "lengths",
            expected: vec![batch_size],
            actual: vec![lengths.len()],
        })
    }
}

fn index_tensor<B: Backend>(indices: Vec<i64>, device: &B::Device) -> Tensor<B, 1, Int> {
    let len = indices.len();
    Tensor::from_data(TensorData::new(indices, [len]), device)
}

/// Compact a padded `[batch, steps, features]` tensor to `[sum(lengths), features]`.
pub fn pack_padded<B: Backend>(
    padded: Tensor<B, 3>,
    lengths: &[usize],
    order: PackOrder,
) -> Result<PackedSequence<B>> {
    let [batch_size, steps, features] = padded.dims();
    check_batch(batch_size, lengths)?;

    let indices = packed_indices(lengths, steps, order)?;
    let device = padded.device();
    let data = padded
        .reshape([batch_size * steps, features])
        .select(0, index_tensor::<B>(indices, &device));

    Ok(PackedSequence {
        data,
        lengths: lengths.to_vec(),
        order,
    })
}

/// Compact a padded `[batch, steps]` id tensor to `[sum(lengths)]`, with the
/// same row order [`pack_padded`] produces for the same lengths.
pub fn pack_targets<B: Backend>(
    tokens: Tensor<B, 2, Int>,
    lengths: &[usize],
    order: PackOrder,
) -> Result<Tensor<B, 1, Int>> {
    let [batch_size, steps] = tokens.dims();
    check_batch(batch_size, lengths)?;

    let indices = packed_indices(lengths, steps, order)?;
    let device = tokens.device();

    Ok(tokens
        .reshape([batch_size * steps])
        .select(0, index_tensor::<B>(indices, &device)))
}
