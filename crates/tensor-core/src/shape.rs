// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and dimension utilities.

use std::fmt;

/// Describes the dimensionality of a [`crate::Tensor`].
///
/// Shapes are immutable once created and provide convenience methods for
/// computing row-major strides and element counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        Self { dims: vec![] }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Creates a 3-D shape, the rank most weight transforms work on.
    pub fn cube(outer: usize, rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![outer, rows, cols],
        }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// For a scalar shape (rank 0), returns 1.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Returns the innermost dimension, or `None` for a scalar.
    pub fn last(&self) -> Option<usize> {
        self.dims.last().copied()
    }

    /// Computes the memory footprint in bytes for a given [`crate::DType`].
    ///
    /// Sub-byte types are packed, so a `[3]` shape of `U4` needs 2 bytes.
    pub fn size_bytes(&self, dtype: crate::DType) -> usize {
        dtype.buffer_bytes(self.num_elements())
    }

    /// Computes row-major (C-order) strides for this shape.
    ///
    /// The stride for dimension `i` is the number of elements to skip
    /// in the flat buffer to advance one step along that dimension.
    pub fn strides(&self) -> Vec<usize> {
        let rank = self.dims.len();
        if rank == 0 {
            return vec![];
        }
        let mut strides = vec![0usize; rank];
        strides[rank - 1] = 1;
        for i in (0..rank - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Returns the shape with its dimensions reordered: `out[i] = self[axes[i]]`.
    ///
    /// Returns `None` if `axes` is not a permutation of `0..rank`.
    pub fn permuted(&self, axes: &[usize]) -> Option<Shape> {
        if axes.len() != self.rank() {
            return None;
        }
        let mut seen = vec![false; axes.len()];
        let mut dims = Vec::with_capacity(axes.len());
        for &a in axes {
            if a >= axes.len() || seen[a] {
                return None;
            }
            seen[a] = true;
            dims.push(self.dims[a]);
        }
        Some(Shape::new(dims))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![2, 3])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(&[2, 3][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}
