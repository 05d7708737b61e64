#![forbid(unsafe_code)]

//! Typed N-dimensional tensors decoded from raw storage payloads.
//!
//! A [`Tensor`] is immutable once constructed. Its buffer lives in a tagged
//! [`TensorData`] variant so every consumer handles `float32` and `int32`
//! exhaustively instead of branching on a numeric datatype code.
//!
//! # Decoding
//!
//! Payloads are little-endian element arrays. [`Tensor::from_le_bytes`] is
//! the only place raw bytes are reinterpreted; a byte count that disagrees
//! with `element_size * product(shape)` is rejected, never truncated or
//! padded.
//!
//! ```
//! use tscope_core::tensor::{ElementType, Tensor};
//!
//! let bytes: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
//!     .iter()
//!     .flat_map(|v| v.to_le_bytes())
//!     .collect();
//! let tensor = Tensor::from_le_bytes(ElementType::Float32, &[2, 2], &bytes).unwrap();
//! assert_eq!(tensor.shape(), &[2, 2]);
//! assert_eq!(tensor.value_at(&[1, 0]), Some(3.0));
//! ```

use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayD, IxDyn};

/// Element type of a tensor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ElementType {
    /// IEEE-754 single precision.
    Float32,
    /// Two's complement 32-bit signed integer.
    Int32,
}

impl ElementType {
    /// Size of one element in bytes.
    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Float32 | Self::Int32 => 4,
        }
    }

    /// Map a storage datatype code (`0` float32, `1` int32).
    pub fn from_code(code: i64) -> Result<Self, TensorError> {
        match code {
            0 => Ok(Self::Float32),
            1 => Ok(Self::Int32),
            other => Err(TensorError::UnknownElementType { code: other }),
        }
    }

    /// Storage datatype code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Float32 => 0,
            Self::Int32 => 1,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Int32 => "int32",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float32" | "f32" => Ok(Self::Float32),
            "int32" | "i32" => Ok(Self::Int32),
            _ => Err(TensorError::UnknownElementName {
                name: s.to_string(),
            }),
        }
    }
}

/// Tensor construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    /// Payload length disagrees with the declared shape and element type.
    ShapeMismatch {
        element_type: ElementType,
        shape: Vec<usize>,
        expected_bytes: usize,
        actual_bytes: usize,
    },
    /// An element vector's length disagrees with the declared shape.
    ElementCountMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
    /// A dimension of size zero was declared.
    ZeroDimension { axis: usize, shape: Vec<usize> },
    /// The element count of the shape overflows `usize`.
    ShapeOverflow { shape: Vec<usize> },
    /// Storage reported a datatype code outside the supported set.
    UnknownElementType { code: i64 },
    /// A textual element type could not be parsed.
    UnknownElementName { name: String },
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                element_type,
                shape,
                expected_bytes,
                actual_bytes,
            } => write!(
                f,
                "shape mismatch: {element_type} tensor of shape {shape:?} needs \
                 {expected_bytes} bytes, payload has {actual_bytes}"
            ),
            Self::ElementCountMismatch {
                shape,
                expected,
                actual,
            } => write!(
                f,
                "shape {shape:?} holds {expected} elements, got {actual}"
            ),
            Self::ZeroDimension { axis, shape } => {
                write!(f, "dimension {axis} of shape {shape:?} is zero")
            }
            Self::ShapeOverflow { shape } => {
                write!(f, "element count of shape {shape:?} overflows")
            }
            Self::UnknownElementType { code } => write!(f, "unknown datatype code {code}"),
            Self::UnknownElementName { name } => write!(f, "unknown element type '{name}'"),
        }
    }
}

impl std::error::Error for TensorError {}

/// Tagged tensor buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Float32(ArrayD<f32>),
    Int32(ArrayD<i32>),
}

/// An immutable, typed, contiguous N-dimensional buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: TensorData,
}

/// Validate a shape and return its element count.
fn element_count(shape: &[usize]) -> Result<usize, TensorError> {
    let mut count = 1usize;
    for (axis, &dim) in shape.iter().enumerate() {
        if dim == 0 {
            return Err(TensorError::ZeroDimension {
                axis,
                shape: shape.to_vec(),
            });
        }
        count = count
            .checked_mul(dim)
            .ok_or_else(|| TensorError::ShapeOverflow {
                shape: shape.to_vec(),
            })?;
    }
    Ok(count)
}

fn build<T>(shape: &[usize], values: Vec<T>) -> Result<ArrayD<T>, TensorError> {
    let expected = element_count(shape)?;
    if values.len() != expected {
        return Err(TensorError::ElementCountMismatch {
            shape: shape.to_vec(),
            expected,
            actual: values.len(),
        });
    }
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|_| TensorError::ElementCountMismatch {
        shape: shape.to_vec(),
        expected,
        actual: expected,
    })
}

impl Tensor {
    /// Decode a little-endian payload.
    pub fn from_le_bytes(
        element_type: ElementType,
        shape: &[usize],
        bytes: &[u8],
    ) -> Result<Self, TensorError> {
        let count = element_count(shape)?;
        let expected_bytes = count
            .checked_mul(element_type.size())
            .ok_or_else(|| TensorError::ShapeOverflow {
                shape: shape.to_vec(),
            })?;
        if bytes.len() != expected_bytes {
            return Err(TensorError::ShapeMismatch {
                element_type,
                shape: shape.to_vec(),
                expected_bytes,
                actual_bytes: bytes.len(),
            });
        }

        let words = bytes.chunks_exact(4).map(|c| [c[0], c[1], c[2], c[3]]);
        let data = match element_type {
            ElementType::Float32 => {
                TensorData::Float32(build(shape, words.map(f32::from_le_bytes).collect())?)
            }
            ElementType::Int32 => {
                TensorData::Int32(build(shape, words.map(i32::from_le_bytes).collect())?)
            }
        };
        Ok(Self { data })
    }

    /// Build a float32 tensor from row-major values.
    pub fn from_f32(shape: &[usize], values: Vec<f32>) -> Result<Self, TensorError> {
        Ok(Self {
            data: TensorData::Float32(build(shape, values)?),
        })
    }

    /// Build an int32 tensor from row-major values.
    pub fn from_i32(shape: &[usize], values: Vec<i32>) -> Result<Self, TensorError> {
        Ok(Self {
            data: TensorData::Int32(build(shape, values)?),
        })
    }

    /// Rank-0 float32 tensor.
    #[must_use]
    pub fn scalar_f32(value: f32) -> Self {
        Self {
            data: TensorData::Float32(ArrayD::from_elem(IxDyn(&[]), value)),
        }
    }

    /// Wrap an existing buffer.
    ///
    /// Fails if any dimension is zero.
    pub fn from_data(data: TensorData) -> Result<Self, TensorError> {
        let shape = match &data {
            TensorData::Float32(a) => a.shape().to_vec(),
            TensorData::Int32(a) => a.shape().to_vec(),
        };
        element_count(&shape)?;
        Ok(Self { data })
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &TensorData {
        &self.data
    }

    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match &self.data {
            TensorData::Float32(_) => ElementType::Float32,
            TensorData::Int32(_) => ElementType::Int32,
        }
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match &self.data {
            TensorData::Float32(a) => a.shape(),
            TensorData::Int32(a) => a.shape(),
        }
    }

    #[inline]
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.data {
            TensorData::Float32(a) => a.len(),
            TensorData::Int32(a) => a.len(),
        }
    }

    /// Always `false`: zero dimensions are rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.len() * self.element_type().size()
    }

    /// Encode back into the little-endian payload format.
    #[must_use]
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match &self.data {
            TensorData::Float32(a) => a.iter().flat_map(|v| v.to_le_bytes()).collect(),
            TensorData::Int32(a) => a.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    /// Read one element as `f64`.
    #[must_use]
    pub fn value_at(&self, index: &[usize]) -> Option<f64> {
        match &self.data {
            TensorData::Float32(a) => a.get(index).map(|&v| f64::from(v)),
            TensorData::Int32(a) => a.get(index).map(|&v| f64::from(v)),
        }
    }
}
