// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the weight codec.

use partition_planner::PlannerError;
use tensor_core::{DType, ErrorKind, TensorError};

/// Errors that can occur while unpacking or dequantizing.
///
/// Every variant is raised before the destination buffer is written.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The `(from, to)` pair is not in the codec's catalogue.
    #[error("unsupported conversion {from} -> {to}")]
    UnsupportedConversion { from: DType, to: DType },

    /// The source type is not accepted by the requested dequantization mode.
    #[error("{mode} dequantization does not accept {dtype} sources")]
    UnsupportedSource { mode: &'static str, dtype: DType },

    /// A shape, size or side-tensor precondition does not hold.
    #[error("invariant violated in {op}: {detail}")]
    InvariantViolation { op: &'static str, detail: String },

    /// A descriptor-level failure (contiguity, buffer size).
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// The partition plan could not be built or applied.
    #[error(transparent)]
    Planner(#[from] PlannerError),
}

impl CodecError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::UnsupportedConversion { .. } | CodecError::UnsupportedSource { .. } => {
                ErrorKind::UnsupportedOperation
            }
            CodecError::InvariantViolation { .. } => ErrorKind::InvariantViolation,
            CodecError::Tensor(e) => e.kind(),
            CodecError::Planner(e) => e.kind(),
        }
    }

    pub(crate) fn invariant(op: &'static str, detail: impl Into<String>) -> Self {
        CodecError::InvariantViolation {
            op,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let e = CodecError::UnsupportedConversion {
            from: DType::F32,
            to: DType::I4,
        };
        assert_eq!(e.kind(), ErrorKind::UnsupportedOperation);
        assert_eq!(e.to_string(), "unsupported conversion f32 -> i4");

        let e = CodecError::invariant("unpack", "size mismatch");
        assert_eq!(e.kind(), ErrorKind::InvariantViolation);

        let e: CodecError = TensorError::UnsupportedOperation {
            op: "permute",
            detail: "axes".into(),
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::UnsupportedOperation);
    }
}
