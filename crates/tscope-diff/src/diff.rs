#![forbid(unsafe_code)]

//! Elementwise comparison of two tensors.
//!
//! Both operations require identical shapes; there is no broadcasting.
//!
//! ```
//! use tscope_core::tensor::Tensor;
//! use tscope_diff::diff::{mean_squared_error, pointwise_diff};
//!
//! let a = Tensor::from_f32(&[2], vec![1.0, 2.0]).unwrap();
//! let b = Tensor::from_f32(&[2], vec![1.5, 2.0]).unwrap();
//! assert_eq!(mean_squared_error(&a, &b).unwrap(), 0.125);
//! assert_eq!(pointwise_diff(&a, &b).unwrap().value_at(&[0]), Some(0.5));
//! ```

use std::fmt;

use ndarray::{ArrayD, Zip};
use tscope_core::tensor::{Tensor, TensorData, TensorError};

/// Comparison failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// The operands have different shapes.
    ShapeMismatch {
        left: Vec<usize>,
        right: Vec<usize>,
    },
    /// The difference tensor could not be built.
    Invalid(TensorError),
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { left, right } => {
                write!(f, "cannot compare shapes {left:?} and {right:?}")
            }
            Self::Invalid(e) => write!(f, "difference tensor is invalid: {e}"),
        }
    }
}

impl std::error::Error for DiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid(e) => Some(e),
            Self::ShapeMismatch { .. } => None,
        }
    }
}

fn check_shapes(a: &Tensor, b: &Tensor) -> Result<(), DiffError> {
    if a.shape() == b.shape() {
        Ok(())
    } else {
        Err(DiffError::ShapeMismatch {
            left: a.shape().to_vec(),
            right: b.shape().to_vec(),
        })
    }
}

fn abs_diff_f32<A, B>(a: &ArrayD<A>, b: &ArrayD<B>) -> ArrayD<f32>
where
    A: Copy + Into<f64>,
    B: Copy + Into<f64>,
{
    Zip::from(a)
        .and(b)
        .map_collect(|&p, &q| {
            let (p, q): (f64, f64) = (p.into(), q.into());
            (p - q).abs() as f32
        })
}

/// `|a - b|` elementwise, same shape as the operands.
///
/// Two int32 operands give an int32 result (saturating at `i32::MAX`);
/// anything involving float32 gives float32.
pub fn pointwise_diff(a: &Tensor, b: &Tensor) -> Result<Tensor, DiffError> {
    check_shapes(a, b)?;
    let data = match (a.data(), b.data()) {
        (TensorData::Int32(x), TensorData::Int32(y)) => {
            TensorData::Int32(Zip::from(x).and(y).map_collect(|&p, &q| {
                let d = (i64::from(p) - i64::from(q)).abs();
                i32::try_from(d).unwrap_or(i32::MAX)
            }))
        }
        (TensorData::Float32(x), TensorData::Float32(y)) => TensorData::Float32(abs_diff_f32(x, y)),
        (TensorData::Float32(x), TensorData::Int32(y)) => TensorData::Float32(abs_diff_f32(x, y)),
        (TensorData::Int32(x), TensorData::Float32(y)) => TensorData::Float32(abs_diff_f32(x, y)),
    };
    Tensor::from_data(data).map_err(DiffError::Invalid)
}

fn squared_error_sum<A, B>(a: &ArrayD<A>, b: &ArrayD<B>) -> f64
where
    A: Copy + Into<f64>,
    B: Copy + Into<f64>,
{
    Zip::from(a).and(b).fold(0.0, |acc, &p, &q| {
        let (p, q): (f64, f64) = (p.into(), q.into());
        if p == q || (p.is_nan() && q.is_nan()) {
            acc
        } else {
            let d = p - q;
            acc + d * d
        }
    })
}

/// Mean of squared elementwise differences, in `f64`.
///
/// Identical elements (both NaN included) contribute exactly zero, so a
/// tensor compared with itself always scores `0.0`.
pub fn mean_squared_error(a: &Tensor, b: &Tensor) -> Result<f64, DiffError> {
    check_shapes(a, b)?;
    let sum = match (a.data(), b.data()) {
        (TensorData::Float32(x), TensorData::Float32(y)) => squared_error_sum(x, y),
        (TensorData::Float32(x), TensorData::Int32(y)) => squared_error_sum(x, y),
        (TensorData::Int32(x), TensorData::Float32(y)) => squared_error_sum(x, y),
        (TensorData::Int32(x), TensorData::Int32(y)) => squared_error_sum(x, y),
    };
    Ok(sum / a.len() as f64)
}
