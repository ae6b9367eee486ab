// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Axis permutation of rank-3 tensors, dense or 4-bit packed.

use crate::nibble::{read_nibble, write_nibble};
use crate::{Tensor, TensorError, TensorView};

/// Axis orders [`permute`] knows how to lay out.
pub const SUPPORTED_AXES: [[usize; 3]; 4] = [[0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1]];

/// Moves the last axis to the front: `[A, B, C] -> [C, A, B]`.
///
/// Same as `permute(t, &[2, 0, 1])`.
pub fn transpose(t: &TensorView<'_>) -> Result<Tensor, TensorError> {
    permute(t, &[2, 0, 1])
}

/// Returns a new tensor with `out[i0, i1, i2] = t[j]` where `j[axes[k]] = i_k`.
///
/// The output shape is `[shape[axes[0]], shape[axes[1]], shape[axes[2]]]`.
/// 4-bit tensors are permuted nibble by nibble; every other type moves whole
/// elements.
///
/// # Errors
/// Returns [`TensorError::InvariantViolation`] unless `t` is rank 3,
/// [`TensorError::NotContiguous`] for strided input and
/// [`TensorError::UnsupportedOperation`] for an axis order outside
/// [`SUPPORTED_AXES`].
///
/// # Examples
/// ```
/// use tensor_core::{permute, Shape, Tensor};
/// let t = Tensor::from_slice(Shape::cube(1, 2, 3), &[0i8, 1, 2, 3, 4, 5]).unwrap();
/// let p = permute(&t.view(), &[0, 2, 1]).unwrap();
/// assert_eq!(p.shape(), &Shape::cube(1, 3, 2));
/// assert_eq!(p.to_vec::<i8>().unwrap(), vec![0, 3, 1, 4, 2, 5]);
/// ```
pub fn permute(t: &TensorView<'_>, axes: &[usize]) -> Result<Tensor, TensorError> {
    if t.shape().rank() != 3 {
        return Err(TensorError::invariant(
            "permute",
            format!("expected a rank-3 tensor, got shape {}", t.shape()),
        ));
    }
    if !SUPPORTED_AXES.iter().any(|a| a[..] == *axes) {
        return Err(TensorError::UnsupportedOperation {
            op: "permute",
            detail: format!("axes {axes:?}"),
        });
    }
    let src = t.contiguous_bytes("permute")?;
    let out_shape = t
        .shape()
        .permuted(axes)
        .ok_or_else(|| TensorError::invariant("permute", format!("invalid axes {axes:?}")))?;

    let src_strides = t.shape().strides();
    // Stride in the source for each output axis.
    let step = [src_strides[axes[0]], src_strides[axes[1]], src_strides[axes[2]]];
    let dims = out_shape.dims().to_vec();
    let mut out = Tensor::zeros(out_shape, t.dtype());
    let dst = out.as_bytes_mut();

    tracing::trace!(from = %t.shape(), ?axes, dtype = %t.dtype(), "permute");

    let mut dst_index = 0usize;
    if t.dtype().is_sub_byte() {
        for i0 in 0..dims[0] {
            for i1 in 0..dims[1] {
                let base = i0 * step[0] + i1 * step[1];
                for i2 in 0..dims[2] {
                    let value = read_nibble(src, base + i2 * step[2]);
                    write_nibble(dst, dst_index, value);
                    dst_index += 1;
                }
            }
        }
    } else {
        let width = t.dtype().size_bytes();
        for i0 in 0..dims[0] {
            for i1 in 0..dims[1] {
                let base = i0 * step[0] + i1 * step[1];
                for i2 in 0..dims[2] {
                    let s = (base + i2 * step[2]) * width;
                    let d = dst_index * width;
                    dst[d..d + width].copy_from_slice(&src[s..s + width]);
                    dst_index += 1;
                }
            }
        }
    }
    Ok(out)
}
