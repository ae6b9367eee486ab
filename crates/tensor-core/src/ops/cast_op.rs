// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dense numeric casts to and from `f32`.

use crate::{DType, Element, Shape, Tensor, TensorError, TensorView, TensorViewMut};
use half::{bf16, f16};
use rayon::prelude::*;

/// Elements per rayon work item in [`to_f32`].
const CAST_CHUNK: usize = 16 * 1024;

/// Lanes per block in [`to_f16`].
const F16_LANES: usize = 8;

/// Widens any byte-addressable numeric tensor to `f32`.
///
/// `F32` inputs are copied as-is. Integer inputs use an `as`-style
/// conversion, so 64-bit values beyond `2^24` lose precision.
///
/// # Errors
/// Returns [`TensorError::UnsupportedDType`] for 4-bit inputs or a non-`F32`
/// output, [`TensorError::ShapeMismatch`] if the shapes differ and
/// [`TensorError::NotContiguous`] if either side is strided.
pub fn to_f32(input: &TensorView<'_>, output: &mut TensorViewMut<'_>) -> Result<(), TensorError> {
    if output.dtype() != DType::F32 {
        return Err(TensorError::UnsupportedDType {
            op: "to_f32",
            dtype: output.dtype(),
        });
    }
    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "to_f32",
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }
    let src = input.contiguous_bytes("to_f32")?;
    let dst = output.contiguous_bytes_mut("to_f32")?;

    match input.dtype() {
        DType::F32 => dst.copy_from_slice(src),
        DType::F16 => widen::<f16>(src, dst),
        DType::BF16 => widen::<bf16>(src, dst),
        DType::I8 => widen::<i8>(src, dst),
        DType::U8 => widen::<u8>(src, dst),
        DType::I16 => widen::<i16>(src, dst),
        DType::U16 => widen::<u16>(src, dst),
        DType::I32 => widen::<i32>(src, dst),
        DType::U32 => widen::<u32>(src, dst),
        DType::I64 => widen::<i64>(src, dst),
        DType::U64 => widen::<u64>(src, dst),
        dtype @ (DType::I4 | DType::U4) => {
            return Err(TensorError::UnsupportedDType { op: "to_f32", dtype })
        }
    }
    Ok(())
}

fn widen<T: Element>(src: &[u8], dst: &mut [u8]) {
    let width = T::DTYPE.size_bytes();
    src.par_chunks(CAST_CHUNK * width)
        .zip(dst.par_chunks_mut(CAST_CHUNK * 4))
        .for_each(|(s, d)| {
            for (x, y) in s.chunks_exact(width).zip(d.chunks_exact_mut(4)) {
                T::read_le(x).to_f32().write_le(y);
            }
        });
}

/// Narrows an `F32` tensor to a freshly allocated `F16` tensor.
///
/// Rounds to nearest, ties to even. Works in blocks of eight lanes, so the
/// element count must be a multiple of eight.
///
/// # Errors
/// Returns [`TensorError::UnsupportedDType`] for non-`F32` input,
/// [`TensorError::InvariantViolation`] if the element count is not a
/// multiple of eight and [`TensorError::NotContiguous`] for strided input.
///
/// # Examples
/// ```
/// use tensor_core::{to_f16, Shape, Tensor};
/// let t = Tensor::from_f32(Shape::vector(8), &[1.0; 8]).unwrap();
/// let h = to_f16(&t.view()).unwrap();
/// assert_eq!(h.size_bytes(), 16);
/// ```
pub fn to_f16(input: &TensorView<'_>) -> Result<Tensor, TensorError> {
    if input.dtype() != DType::F32 {
        return Err(TensorError::UnsupportedDType {
            op: "to_f16",
            dtype: input.dtype(),
        });
    }
    if input.num_elements() % F16_LANES != 0 {
        return Err(TensorError::invariant(
            "to_f16",
            format!(
                "element count {} is not a multiple of {F16_LANES}",
                input.num_elements()
            ),
        ));
    }
    let src = input.contiguous_bytes("to_f16")?;
    let shape: Shape = input.shape().clone();
    let mut out = Tensor::zeros(shape, DType::F16);

    for (s, d) in src
        .chunks_exact(F16_LANES * 4)
        .zip(out.as_bytes_mut().chunks_exact_mut(F16_LANES * 2))
    {
        let mut lanes = [0f32; F16_LANES];
        for (lane, x) in lanes.iter_mut().zip(s.chunks_exact(4)) {
            *lane = f32::read_le(x);
        }
        for (lane, y) in lanes.iter().zip(d.chunks_exact_mut(2)) {
            f16::from_f32(*lane).write_le(y);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_f32_integer_types() {
        let t = Tensor::from_slice(Shape::matrix(2, 2), &[-3i16, 0, 7, i16::MIN]).unwrap();
        let mut out = Tensor::zeros(Shape::matrix(2, 2), DType::F32);
        to_f32(&t.view(), &mut out.view_mut()).unwrap();
        assert_eq!(out.to_vec::<f32>().unwrap(), vec![-3.0, 0.0, 7.0, -32768.0]);

        let t = Tensor::from_slice(Shape::vector(3), &[0u64, 1, 1 << 20]).unwrap();
        let mut out = Tensor::zeros(Shape::vector(3), DType::F32);
        to_f32(&t.view(), &mut out.view_mut()).unwrap();
        assert_eq!(out.to_vec::<f32>().unwrap(), vec![0.0, 1.0, 1048576.0]);
    }

    #[test]
    fn test_to_f32_half_types() {
        let h = [f16::from_f32(0.5), f16::from_f32(-2.0)];
        let t = Tensor::from_slice(Shape::vector(2), &h).unwrap();
        let mut out = Tensor::zeros(Shape::vector(2), DType::F32);
        to_f32(&t.view(), &mut out.view_mut()).unwrap();
        assert_eq!(out.to_vec::<f32>().unwrap(), vec![0.5, -2.0]);

        let b = [bf16::from_f32(3.0)];
        let t = Tensor::from_slice(Shape::vector(1), &b).unwrap();
        let mut out = Tensor::zeros(Shape::vector(1), DType::F32);
        to_f32(&t.view(), &mut out.view_mut()).unwrap();
        assert_eq!(out.to_vec::<f32>().unwrap(), vec![3.0]);
    }

    #[test]
    fn test_to_f32_large_input_spans_chunks() {
        let n = CAST_CHUNK * 2 + 17;
        let values: Vec<i32> = (0..n as i32).collect();
        let t = Tensor::from_slice(Shape::vector(n), &values).unwrap();
        let mut out = Tensor::zeros(Shape::vector(n), DType::F32);
        to_f32(&t.view(), &mut out.view_mut()).unwrap();
        let got = out.to_vec::<f32>().unwrap();
        assert!(got.iter().enumerate().all(|(i, &x)| x == i as f32));
    }

    #[test]
    fn test_to_f32_rejects_packed() {
        let t = Tensor::zeros(Shape::vector(4), DType::U4);
        let mut out = Tensor::zeros(Shape::vector(4), DType::F32);
        let err = to_f32(&t.view(), &mut out.view_mut()).unwrap_err();
        assert!(err.to_string().contains("unsupported precision u4"));
    }

    #[test]
    fn test_to_f32_shape_mismatch() {
        let t = Tensor::zeros(Shape::vector(4), DType::I8);
        let mut out = Tensor::zeros(Shape::vector(5), DType::F32);
        assert!(matches!(
            to_f32(&t.view(), &mut out.view_mut()),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_to_f16_matches_half_rounding() {
        let values: Vec<f32> = (0..16).map(|i| 1.0 + i as f32 * 1.0e-4).collect();
        let t = Tensor::from_f32(Shape::matrix(2, 8), &values).unwrap();
        let h = to_f16(&t.view()).unwrap();
        assert_eq!(h.shape(), &Shape::matrix(2, 8));
        let expected: Vec<f16> = values.iter().map(|&x| f16::from_f32(x)).collect();
        assert_eq!(h.to_vec::<f16>().unwrap(), expected);
    }

    #[test]
    fn test_to_f16_requires_multiple_of_eight() {
        let t = Tensor::from_f32(Shape::vector(6), &[0.0; 6]).unwrap();
        let err = to_f16(&t.view()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvariantViolation);
    }
}
