// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Concatenation of rank-3 tensors along the outer or inner axis.

use crate::nibble::{read_nibble, write_nibble};
use crate::{DType, Shape, Tensor, TensorError, TensorView};

/// Joins `tensors` along `axis` (0 or 2) into a new tensor.
///
/// Axis 0 appends whole blocks; axis 2 interleaves rows at running column
/// offsets. 4-bit inputs whose segments land on an odd element boundary are
/// copied nibble by nibble.
///
/// # Errors
/// - [`TensorError::UnsupportedOperation`] for `axis == 1` or any other axis.
/// - [`TensorError::InvariantViolation`] for an empty list, a rank other
///   than 3, or mixed element types.
/// - [`TensorError::ShapeMismatch`] if a non-axis dimension differs.
/// - [`TensorError::NotContiguous`] for strided input.
///
/// # Examples
/// ```
/// use tensor_core::{concat, Shape, Tensor};
/// let a = Tensor::from_slice(Shape::cube(1, 1, 2), &[1i8, 2]).unwrap();
/// let b = Tensor::from_slice(Shape::cube(1, 1, 1), &[3i8]).unwrap();
/// let c = concat(&[a.view(), b.view()], 2).unwrap();
/// assert_eq!(c.to_vec::<i8>().unwrap(), vec![1, 2, 3]);
/// ```
pub fn concat(tensors: &[TensorView<'_>], axis: usize) -> Result<Tensor, TensorError> {
    if axis != 0 && axis != 2 {
        return Err(TensorError::UnsupportedOperation {
            op: "concat",
            detail: format!("axis {axis}"),
        });
    }
    let first = tensors
        .first()
        .ok_or_else(|| TensorError::invariant("concat", "no input tensors"))?;
    if first.shape().rank() != 3 {
        return Err(TensorError::invariant(
            "concat",
            format!("expected rank-3 tensors, got shape {}", first.shape()),
        ));
    }
    let dtype = first.dtype();

    let mut sources = Vec::with_capacity(tensors.len());
    let mut lens = Vec::with_capacity(tensors.len());
    let mut new_dim = 0usize;
    for t in tensors {
        if t.dtype() != dtype {
            return Err(TensorError::invariant(
                "concat",
                format!("mixed element types {dtype} and {}", t.dtype()),
            ));
        }
        let compatible = t.shape().rank() == 3
            && (0..3).all(|d| d == axis || t.shape().dim(d) == first.shape().dim(d));
        if !compatible {
            return Err(TensorError::ShapeMismatch {
                op: "concat",
                lhs: first.shape().clone(),
                rhs: t.shape().clone(),
            });
        }
        sources.push(t.contiguous_bytes("concat")?);
        let len = t.shape().dims()[axis];
        lens.push(len);
        new_dim += len;
    }

    let mut dims = first.shape().dims().to_vec();
    dims[axis] = new_dim;
    let mut out = Tensor::zeros(Shape::new(dims.clone()), dtype);
    let dst = out.as_bytes_mut();

    if axis == 0 {
        let block = dims[1] * dims[2];
        let mut offset = 0usize;
        for (src, len) in sources.iter().zip(&lens) {
            let count = len * block;
            copy_elements(dtype, src, 0, dst, offset, count);
            offset += count;
        }
    } else {
        let rows = dims[0] * dims[1];
        let mut col = 0usize;
        for (src, &len) in sources.iter().zip(&lens) {
            for r in 0..rows {
                copy_elements(dtype, src, r * len, dst, r * new_dim + col, len);
            }
            col += len;
        }
    }
    Ok(out)
}

/// Copies `count` elements from element offset `src_at` to `dst_at`.
fn copy_elements(
    dtype: DType,
    src: &[u8],
    src_at: usize,
    dst: &mut [u8],
    dst_at: usize,
    count: usize,
) {
    if !dtype.is_sub_byte() {
        let w = dtype.size_bytes();
        dst[dst_at * w..(dst_at + count) * w].copy_from_slice(&src[src_at * w..(src_at + count) * w]);
        return;
    }
    if src_at % 2 == 0 && dst_at % 2 == 0 {
        let whole = count / 2;
        dst[dst_at / 2..dst_at / 2 + whole].copy_from_slice(&src[src_at / 2..src_at / 2 + whole]);
        if count % 2 == 1 {
            let last = count - 1;
            write_nibble(dst, dst_at + last, read_nibble(src, src_at + last));
        }
        return;
    }
    for i in 0..count {
        write_nibble(dst, dst_at + i, read_nibble(src, src_at + i));
    }
}
