// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor operations.

use crate::{DType, Shape};

/// The two ways an unpack or transform call can fail.
///
/// Neither is recoverable at the call site: both mean the caller asked for
/// something the engine does not do, or handed it inconsistent tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The type pair or transform pattern is outside the supported catalogue.
    UnsupportedOperation,
    /// A shape, contiguity, size or element-type precondition does not hold.
    InvariantViolation,
}

/// Errors that can occur during tensor operations.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// The provided buffer size does not match the expected size for the given shape and dtype.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Two tensors have incompatible shapes for the requested operation.
    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// The requested data type is not supported for this operation.
    #[error("unsupported precision {dtype} for operation {op}")]
    UnsupportedDType { op: &'static str, dtype: DType },

    /// The requested transform pattern is not implemented.
    #[error("{op}: {detail} is not supported yet")]
    UnsupportedOperation { op: &'static str, detail: String },

    /// The operation requires a dense row-major tensor.
    #[error("{op} requires a contiguous tensor, got shape {shape} with strides {strides:?}")]
    NotContiguous {
        op: &'static str,
        shape: Shape,
        strides: Vec<usize>,
    },

    /// Any other caller-side precondition failure.
    #[error("invariant violated in {op}: {detail}")]
    InvariantViolation { op: &'static str, detail: String },
}

impl TensorError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TensorError::UnsupportedDType { .. } | TensorError::UnsupportedOperation { .. } => {
                ErrorKind::UnsupportedOperation
            }
            TensorError::BufferSizeMismatch { .. }
            | TensorError::ShapeMismatch { .. }
            | TensorError::NotContiguous { .. }
            | TensorError::InvariantViolation { .. } => ErrorKind::InvariantViolation,
        }
    }

    pub(crate) fn invariant(op: &'static str, detail: impl Into<String>) -> Self {
        TensorError::InvariantViolation {
            op,
            detail: detail.into(),
        }
    }
}
