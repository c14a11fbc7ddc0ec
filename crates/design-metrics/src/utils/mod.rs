//! Numeric helpers shared across modules.

pub mod array;
pub mod matrix;

pub use array::{
    ZERO_TOLERANCE, ensure_finite, ensure_sample, is_near_zero, l2_norm, mean, sum_of_squares, variance,
};
pub use matrix::{Matrix, symmetric_eigen};
