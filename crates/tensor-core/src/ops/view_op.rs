// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Non-owning sub-tensor views.
//!
//! A view keeps the strides of its parent and moves the start of its data
//! slice to the first selected element, so a view of a view composes.

use crate::tensor::span_bytes;
use crate::{DType, Shape, TensorError, TensorView, TensorViewMut};
use std::ops::Range;

/// Resolves `[from, to)` against a descriptor and returns the new shape and
/// the byte range of the view inside the parent's data slice.
fn resolve(
    op: &'static str,
    shape: &Shape,
    strides: &[usize],
    dtype: DType,
    data_len: usize,
    from: &[usize],
    to: &[usize],
) -> Result<(Shape, Range<usize>), TensorError> {
    if dtype.is_sub_byte() {
        return Err(TensorError::invariant(
            op,
            format!("{dtype} elements are not byte-addressable"),
        ));
    }
    if from.len() != shape.rank() || to.len() != shape.rank() {
        return Err(TensorError::invariant(
            op,
            format!(
                "range rank {}/{} does not match tensor rank {}",
                from.len(),
                to.len(),
                shape.rank()
            ),
        ));
    }
    for (d, ((&f, &t), &extent)) in from.iter().zip(to).zip(shape.dims()).enumerate() {
        if f > t || t > extent {
            return Err(TensorError::invariant(
                op,
                format!("range {f}..{t} out of bounds for dim {d} of extent {extent}"),
            ));
        }
    }

    let view_shape = Shape::new(from.iter().zip(to).map(|(f, t)| t - f).collect());
    let offset: usize = from.iter().zip(strides).map(|(f, s)| f * s).sum::<usize>() * dtype.size_bytes();
    let span = span_bytes(&view_shape, strides, dtype);
    let start = if span == 0 { offset.min(data_len) } else { offset };
    Ok((view_shape, start..start + span))
}

/// Returns a read-only view of the box `[from, to)` of `src`.
///
/// The view shares `src`'s buffer and strides; it is contiguous only when
/// the selected box happens to be.
///
/// # Errors
/// Returns [`TensorError::InvariantViolation`] for 4-bit tensors, a rank
/// mismatch, or a range with `from > to` or `to > shape`.
///
/// # Examples
/// ```
/// use tensor_core::{view, Shape, Tensor};
/// let t = Tensor::from_f32(Shape::matrix(2, 3), &[0., 1., 2., 3., 4., 5.]).unwrap();
/// let v = view(&t.view(), &[0, 1], &[2, 3]).unwrap();
/// assert_eq!(v.to_vec::<f32>().unwrap(), vec![1., 2., 4., 5.]);
/// ```
pub fn view<'a>(
    src: &TensorView<'a>,
    from: &[usize],
    to: &[usize],
) -> Result<TensorView<'a>, TensorError> {
    let data = src.as_bytes();
    let (shape, range) = resolve(
        "view",
        src.shape(),
        src.strides(),
        src.dtype(),
        data.len(),
        from,
        to,
    )?;
    Ok(TensorView::strided(
        shape,
        src.strides().to_vec(),
        src.dtype(),
        &data[range],
    ))
}

/// Writable counterpart of [`view`]. Consumes the parent descriptor; use
/// [`TensorViewMut::reborrow`] to keep it.
pub fn view_mut<'a>(
    src: TensorViewMut<'a>,
    from: &[usize],
    to: &[usize],
) -> Result<TensorViewMut<'a>, TensorError> {
    let (shape, strides, dtype, data) = src.into_parts();
    let (view_shape, range) = resolve("view_mut", &shape, &strides, dtype, data.len(), from, to)?;
    Ok(TensorViewMut::strided(
        view_shape,
        strides,
        dtype,
        &mut data[range],
    ))
}

/// Views `len` entries of dimension `dim` starting at `offset`, keeping
/// every other dimension whole.
pub fn view_dim<'a>(
    src: &TensorView<'a>,
    dim: usize,
    offset: usize,
    len: usize,
) -> Result<TensorView<'a>, TensorError> {
    let (from, to) = dim_range("view_dim", src.shape(), dim, offset, len)?;
    view(src, &from, &to)
}

/// Writable counterpart of [`view_dim`].
pub fn view_dim_mut<'a>(
    src: TensorViewMut<'a>,
    dim: usize,
    offset: usize,
    len: usize,
) -> Result<TensorViewMut<'a>, TensorError> {
    let (from, to) = dim_range("view_dim", src.shape(), dim, offset, len)?;
    view_mut(src, &from, &to)
}

fn dim_range(
    op: &'static str,
    shape: &Shape,
    dim: usize,
    offset: usize,
    len: usize,
) -> Result<(Vec<usize>, Vec<usize>), TensorError> {
    if dim >= shape.rank() {
        return Err(TensorError::invariant(
            op,
            format!("dim {dim} out of range for rank {}", shape.rank()),
        ));
    }
    let mut from = vec![0; shape.rank()];
    let mut to = shape.dims().to_vec();
    from[dim] = offset;
    to[dim] = offset
        .checked_add(len)
        .ok_or_else(|| TensorError::invariant(op, "offset + len overflows"))?;
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tensor;

    fn iota(shape: Shape) -> Tensor {
        let n = shape.num_elements();
        let values: Vec<f32> = (0..n).map(|i| i as f32).collect();
        Tensor::from_f32(shape, &values).unwrap()
    }

    #[test]
    fn test_view_box() {
        let t = iota(Shape::cube(2, 3, 4));
        let v = view(&t.view(), &[1, 0, 1], &[2, 2, 3]).unwrap();
        assert_eq!(v.shape(), &Shape::cube(1, 2, 2));
        assert_eq!(v.strides(), &[12, 4, 1]);
        assert!(!v.is_contiguous());
        assert_eq!(v.to_vec::<f32>().unwrap(), vec![13., 14., 17., 18.]);
    }

    #[test]
    fn test_outer_slice_is_contiguous() {
        let t = iota(Shape::cube(4, 2, 2));
        let v = view_dim(&t.view(), 0, 1, 2).unwrap();
        assert!(v.is_contiguous());
        assert_eq!(v.contiguous_bytes("test").unwrap().len(), 8 * 4);
        assert_eq!(v.to_vec::<f32>().unwrap()[0], 4.0);
    }

    #[test]
    fn test_view_of_view_composes() {
        let t = iota(Shape::matrix(4, 4));
        let outer = view(&t.view(), &[1, 1], &[4, 4]).unwrap();
        let inner = view(&outer, &[1, 1], &[2, 3]).unwrap();
        assert_eq!(inner.to_vec::<f32>().unwrap(), vec![10., 11.]);
    }

    #[test]
    fn test_view_mut_writes_into_parent() {
        let mut t = Tensor::zeros(Shape::matrix(3, 4), DType::I8);
        {
            let mut v = view_dim_mut(t.view_mut(), 0, 1, 1).unwrap();
            v.contiguous_bytes_mut("test").unwrap().fill(1);
        }
        let got = t.to_vec::<i8>().unwrap();
        assert_eq!(got, vec![0, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_range_at_end() {
        let t = iota(Shape::matrix(2, 2));
        let v = view_dim(&t.view(), 0, 2, 0).unwrap();
        assert_eq!(v.num_elements(), 0);
        assert!(v.to_vec::<f32>().unwrap().is_empty());
    }

    #[test]
    fn test_view_rejects_bad_ranges() {
        let t = iota(Shape::matrix(2, 2));
        assert!(view(&t.view(), &[0, 0], &[3, 2]).is_err());
        assert!(view(&t.view(), &[2, 0], &[1, 2]).is_err());
        assert!(view(&t.view(), &[0], &[1]).is_err());
        assert!(view_dim(&t.view(), 2, 0, 1).is_err());
    }

    #[test]
    fn test_view_rejects_sub_byte() {
        let t = Tensor::zeros(Shape::matrix(2, 2), DType::I4);
        let err = view(&t.view(), &[0, 0], &[1, 2]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvariantViolation);
    }
}
