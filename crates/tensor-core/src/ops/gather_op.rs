// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Row gather (embedding lookup).

use crate::{DType, TensorError, TensorView, TensorViewMut};

/// Copies row `indices[0, r]` of `src` into row `r` of `dst`.
///
/// `src` is `[rows, cols]`, `indices` is an `I64` tensor of shape `[1, N]`
/// and `dst` is rank 3 with an innermost extent of `cols` and room for at
/// least `N` rows. Rows of `dst` past `N` are left untouched.
///
/// # Errors
/// Returns [`TensorError::InvariantViolation`] if any of the shape or type
/// rules above is broken or an index falls outside `0..rows`. Nothing is
/// written in that case.
pub fn gather(
    src: &TensorView<'_>,
    indices: &TensorView<'_>,
    dst: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    if indices.dtype() != DType::I64 {
        return Err(TensorError::invariant(
            "gather",
            format!("indices must be i64, got {}", indices.dtype()),
        ));
    }
    let idx_dims = indices.shape().dims();
    if idx_dims.len() != 2 || idx_dims[0] != 1 {
        return Err(TensorError::invariant(
            "gather",
            format!("indices must have shape [1, N], got {}", indices.shape()),
        ));
    }
    if src.dtype() != dst.dtype() {
        return Err(TensorError::invariant(
            "gather",
            format!("source {} and destination {} differ", src.dtype(), dst.dtype()),
        ));
    }
    if src.dtype().is_sub_byte() {
        return Err(TensorError::invariant(
            "gather",
            format!("{} rows are not byte-addressable", src.dtype()),
        ));
    }
    let (rows, cols) = match src.shape().dims() {
        &[rows, cols] => (rows, cols),
        _ => {
            return Err(TensorError::invariant(
                "gather",
                format!("source must be rank 2, got {}", src.shape()),
            ))
        }
    };
    let dst_dims = dst.shape().dims().to_vec();
    if dst_dims.len() != 3 || dst_dims[2] != cols {
        return Err(TensorError::ShapeMismatch {
            op: "gather",
            lhs: src.shape().clone(),
            rhs: dst.shape().clone(),
        });
    }
    let n = idx_dims[1];
    if dst_dims[0] * dst_dims[1] < n {
        return Err(TensorError::invariant(
            "gather",
            format!("destination {} has no room for {n} rows", dst.shape()),
        ));
    }

    let ids = indices.to_vec::<i64>()?;
    let rows_to_copy = ids
        .iter()
        .map(|&i| {
            usize::try_from(i).ok().filter(|&r| r < rows).ok_or_else(|| {
                TensorError::invariant("gather", format!("index {i} out of range 0..{rows}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let row_bytes = cols * src.dtype().size_bytes();
    let from = src.contiguous_bytes("gather")?;
    let to = dst.contiguous_bytes_mut("gather")?;
    for (r, &s) in rows_to_copy.iter().enumerate() {
        to[r * row_bytes..(r + 1) * row_bytes]
            .copy_from_slice(&from[s * row_bytes..(s + 1) * row_bytes]);
    }
    Ok(())
}
