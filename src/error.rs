//! Error types for the caption decoder.

use thiserror::Error;

/// Errors raised by the recurrence and the decode loops.
///
/// Every variant is detected synchronously by the operation that receives the
/// offending operand. Nothing is retried or corrected; the call that detected
/// the violation returns no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptionError {
    /// An operand's dimensions do not match the configured sizes.
    #[error("shape mismatch for {operand}: expected {expected:?}, got {actual:?}")]
    Shape {
        operand: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A tensor that is flattened into `[batch, features]` has too few dimensions.
    #[error("{operand} must have rank >= {minimum}, got rank {actual}")]
    Rank {
        operand: &'static str,
        minimum: usize,
        actual: usize,
    },

    /// The recurrence was handed a sequence with no time steps.
    #[error("{operand} has an empty time axis")]
    EmptySequence { operand: &'static str },

    /// A declared true length exceeds the number of unrolled steps.
    #[error("sequence {index} declares length {length} but only {available} steps were unrolled")]
    Length {
        index: usize,
        length: usize,
        available: usize,
    },

    /// A declared true length is zero.
    #[error("sequence {index} declares length 0")]
    ZeroLength { index: usize },

    /// Time-major packing needs lengths in non-increasing order.
    #[error("lengths must be sorted in descending order: sequence {index} has length {length} after {previous}")]
    UnsortedLengths {
        index: usize,
        previous: usize,
        length: usize,
    },

    /// A structural size was zero at construction.
    #[error("invalid configuration: {field} must be > 0, got {value}")]
    Configuration { field: &'static str, value: usize },
}

/// Result alias used throughout the crate.
pub type Result<T, E = CaptionError> = std::result::Result<T, E>;

/// Check that `dims` equals `expected`, naming `operand` on failure.
pub(crate) fn expect_dims<const D: usize>(
    operand: &'static str,
    dims: [usize; D],
    expected: [usize; D],
) -> Result<()> {
    if dims == expected {
        Ok(())
    } else {
        Err(CaptionError::Shape {
            operand,
            expected: expected.to_vec(),
            actual: dims.to_vec(),
        })
    }
}

/// Reject a zero structural parameter.
pub(crate) fn expect_positive(field: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        Err(CaptionError::Configuration { field, value })
    } else {
        Ok(())
    }
}
