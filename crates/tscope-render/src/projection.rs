#![forbid(unsafe_code)]

//! Axis projection: N-dimensional tensor → 2D slice view.
//!
//! An [`AxisProjector`] remembers which two axes are displayed (rows and
//! columns) and which index every other axis is pinned to. Projection never
//! copies: the result is a strided [`ArrayView2`] into the tensor buffer.
//!
//! Rank 0 and rank 1 tensors are shown as a `1×1` and `1×W` image
//! respectively, and their axis selection is disabled.
//!
//! # Usage
//!
//! ```
//! use tscope_core::tensor::Tensor;
//! use tscope_render::projection::AxisProjector;
//!
//! let tensor = Tensor::from_f32(&[2, 3, 4, 5], vec![0.0; 120]).unwrap();
//! let mut projector = AxisProjector::new(tensor.shape());
//! assert_eq!(projector.state().axes(), (2, 3));
//!
//! projector.select_axes(3, 1).unwrap();
//! let slice = projector.project_tensor(&tensor).unwrap();
//! assert_eq!(slice.dim(), (5, 3));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{ArrayD, ArrayView2, Axis, Ix2};
use tscope_core::tensor::{ElementType, Tensor, TensorData};

/// Projection failures. The projector is unchanged after any of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// Row and column axis are the same.
    DuplicateAxis { axis: usize },
    /// An axis is not in `[0, ndim)`.
    AxisOutOfRange { axis: usize, ndim: usize },
    /// Rank 0 and rank 1 tensors have a fixed layout.
    AxisSelectionDisabled { ndim: usize },
    /// A fixed index is not in `[0, len)`.
    IndexOutOfRange { axis: usize, index: usize, len: usize },
    /// The axis is displayed, so it has no fixed index.
    NotAFixedAxis { axis: usize },
    /// The tensor no longer has the shape the projector was built for.
    ShapeChanged {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateAxis { axis } => {
                write!(f, "axis {axis} cannot be both the row and the column axis")
            }
            Self::AxisOutOfRange { axis, ndim } => {
                write!(f, "axis {axis} is out of range for a rank-{ndim} tensor")
            }
            Self::AxisSelectionDisabled { ndim } => {
                write!(f, "axis selection is disabled for rank-{ndim} tensors")
            }
            Self::IndexOutOfRange { axis, index, len } => {
                write!(f, "index {index} is out of range for axis {axis} of length {len}")
            }
            Self::NotAFixedAxis { axis } => write!(f, "axis {axis} is displayed, not fixed"),
            Self::ShapeChanged { expected, actual } => {
                write!(f, "projector expects shape {expected:?}, tensor has {actual:?}")
            }
        }
    }
}

impl std::error::Error for ProjectionError {}

/// Displayed axes plus the pinned index of every other axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionState {
    y_axis: usize,
    x_axis: usize,
    fixed: BTreeMap<usize, usize>,
}

impl ProjectionState {
    /// Default layout for a rank-`ndim` tensor (`ndim >= 2`): the last two
    /// axes displayed, everything else pinned at 0.
    fn default_for(ndim: usize) -> Self {
        let (y_axis, x_axis) = (ndim - 2, ndim - 1);
        Self {
            y_axis,
            x_axis,
            fixed: (0..y_axis).map(|axis| (axis, 0)).collect(),
        }
    }

    #[must_use]
    pub fn y_axis(&self) -> usize {
        self.y_axis
    }

    #[must_use]
    pub fn x_axis(&self) -> usize {
        self.x_axis
    }

    /// `(y_axis, x_axis)`.
    #[must_use]
    pub fn axes(&self) -> (usize, usize) {
        (self.y_axis, self.x_axis)
    }

    /// Pinned index per non-displayed axis, ascending by axis.
    #[must_use]
    pub fn fixed_indices(&self) -> &BTreeMap<usize, usize> {
        &self.fixed
    }

    #[must_use]
    pub fn fixed_index(&self, axis: usize) -> Option<usize> {
        self.fixed.get(&axis).copied()
    }
}

/// Dimension names for a tensor of rank `ndim`.
#[must_use]
pub fn dim_labels(ndim: usize) -> Vec<String> {
    let named: &[&str] = match ndim {
        1 => &["W"],
        2 => &["H", "W"],
        3 => &["C", "H", "W"],
        4 => &["N", "C", "H", "W"],
        5 => &["N", "C", "D", "H", "W"],
        _ => return (0..ndim).map(|i| format!("Dim {i}")).collect(),
    };
    named.iter().map(|s| (*s).to_string()).collect()
}

/// One pinned axis as a UI would show it (a slider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedAxis {
    pub axis: usize,
    pub label: String,
    pub len: usize,
    pub index: usize,
    /// Size-1 axes have nothing to choose.
    pub adjustable: bool,
}

/// A projected 2D slice, tagged by element type.
#[derive(Debug, Clone)]
pub enum SliceView<'a> {
    Float32(ArrayView2<'a, f32>),
    Int32(ArrayView2<'a, i32>),
}

impl SliceView<'_> {
    /// `(rows, cols)`.
    #[must_use]
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Self::Float32(v) => v.dim(),
            Self::Int32(v) => v.dim(),
        }
    }

    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Float32(_) => ElementType::Float32,
            Self::Int32(_) => ElementType::Int32,
        }
    }

    /// Element at `(row, col)` as `f64`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self {
            Self::Float32(v) => v.get((row, col)).map(|&x| f64::from(x)),
            Self::Int32(v) => v.get((row, col)).map(|&x| f64::from(x)),
        }
    }
}

/// Projection controller for one tensor shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisProjector {
    shape: Vec<usize>,
    state: ProjectionState,
}

impl AxisProjector {
    /// Projector for `shape` in its default layout.
    #[must_use]
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            state: ProjectionState::default_for(shape.len().max(2)),
        }
    }

    /// Shape of the tensors this projector accepts.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[must_use]
    pub fn state(&self) -> &ProjectionState {
        &self.state
    }

    /// Rank 0 and 1 tensors are reshaped to a single row.
    #[must_use]
    pub fn is_reshaped(&self) -> bool {
        self.shape.len() < 2
    }

    /// Whether [`select_axes`](Self::select_axes) is allowed.
    #[must_use]
    pub fn axis_selection_enabled(&self) -> bool {
        !self.is_reshaped()
    }

    /// Shape as displayed: `[1, 1]` or `[1, W]` for low ranks.
    #[must_use]
    pub fn display_shape(&self) -> Vec<usize> {
        match self.shape.as_slice() {
            [] => vec![1, 1],
            [w] => vec![1, *w],
            other => other.to_vec(),
        }
    }

    /// `(rows, cols)` of the projected slice.
    #[must_use]
    pub fn slice_dim(&self) -> (usize, usize) {
        let shape = self.display_shape();
        (shape[self.state.y_axis], shape[self.state.x_axis])
    }

    /// Choice label of `axis`, e.g. `"H (Dim 2)"`.
    #[must_use]
    pub fn axis_choice(&self, axis: usize) -> Option<String> {
        let labels = dim_labels(self.display_shape().len());
        labels.get(axis).map(|label| format!("{label} (Dim {axis})"))
    }

    /// Every axis choice in order.
    #[must_use]
    pub fn axis_choices(&self) -> Vec<String> {
        dim_labels(self.display_shape().len())
            .into_iter()
            .enumerate()
            .map(|(i, label)| format!("{label} (Dim {i})"))
            .collect()
    }

    /// Display the given axes.
    ///
    /// Axes that stay pinned keep their index; newly pinned axes start at 0.
    pub fn select_axes(&mut self, y_axis: usize, x_axis: usize) -> Result<(), ProjectionError> {
        let ndim = self.ndim();
        if self.is_reshaped() {
            return Err(ProjectionError::AxisSelectionDisabled { ndim });
        }
        if y_axis == x_axis {
            return Err(ProjectionError::DuplicateAxis { axis: y_axis });
        }
        if let Some(axis) = [y_axis, x_axis].into_iter().find(|&a| a >= ndim) {
            return Err(ProjectionError::AxisOutOfRange { axis, ndim });
        }

        let fixed = (0..ndim)
            .filter(|&axis| axis != y_axis && axis != x_axis)
            .map(|axis| (axis, self.state.fixed_index(axis).unwrap_or(0)))
            .collect();
        self.state = ProjectionState {
            y_axis,
            x_axis,
            fixed,
        };
        Ok(())
    }

    /// Pin `axis` to `index`.
    pub fn set_fixed_index(&mut self, axis: usize, index: usize) -> Result<(), ProjectionError> {
        let ndim = self.ndim();
        if axis >= ndim {
            return Err(ProjectionError::AxisOutOfRange { axis, ndim });
        }
        let Some(slot) = self.state.fixed.get_mut(&axis) else {
            return Err(ProjectionError::NotAFixedAxis { axis });
        };
        let len = self.shape[axis];
        if index >= len {
            return Err(ProjectionError::IndexOutOfRange { axis, index, len });
        }
        *slot = index;
        Ok(())
    }

    /// Slider descriptors for the pinned axes.
    #[must_use]
    pub fn fixed_axes(&self) -> Vec<FixedAxis> {
        let labels = dim_labels(self.ndim());
        self.state
            .fixed
            .iter()
            .map(|(&axis, &index)| {
                let len = self.shape[axis];
                FixedAxis {
                    axis,
                    label: labels[axis].clone(),
                    len,
                    index,
                    adjustable: len > 1,
                }
            })
            .collect()
    }

    /// Project an array of this projector's shape.
    pub fn project<'a, A>(&self, array: &'a ArrayD<A>) -> Result<ArrayView2<'a, A>, ProjectionError> {
        if array.shape() != self.shape.as_slice() {
            return Err(self.shape_changed(array.shape()));
        }

        let mut view = array.view();
        match self.shape.len() {
            0 => {
                view = view.insert_axis(Axis(0)).insert_axis(Axis(0));
            }
            1 => {
                view = view.insert_axis(Axis(0));
            }
            _ => {
                // Highest axis first so the remaining axis numbers stay valid.
                for (&axis, &index) in self.state.fixed.iter().rev() {
                    view = view.index_axis_move(Axis(axis), index);
                }
            }
        }

        let view = view
            .into_dimensionality::<Ix2>()
            .map_err(|_| self.shape_changed(array.shape()))?;
        if self.state.y_axis > self.state.x_axis {
            Ok(view.reversed_axes())
        } else {
            Ok(view)
        }
    }

    /// Project a [`Tensor`] of this projector's shape.
    pub fn project_tensor<'a>(&self, tensor: &'a Tensor) -> Result<SliceView<'a>, ProjectionError> {
        match tensor.data() {
            TensorData::Float32(a) => self.project(a).map(SliceView::Float32),
            TensorData::Int32(a) => self.project(a).map(SliceView::Int32),
        }
    }

    fn shape_changed(&self, actual: &[usize]) -> ProjectionError {
        ProjectionError::ShapeChanged {
            expected: self.shape.clone(),
            actual: actual.to_vec(),
        }
    }
}
