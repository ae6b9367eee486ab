// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Symmetric and asymmetric dequantization across every scale layout.

use half::f16;
use tensor_core::nibble::{unpack_i4, unpack_u4};
use tensor_core::{DType, ErrorKind, Shape, Tensor};
use weight_codec::{unpack_asymmetric, unpack_scaled, CodecError, UnpackOptions};

// ── Helpers ────────────────────────────────────────────────────

fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut x = seed.wrapping_mul(2_246_822_519).wrapping_add(7);
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            (x >> 11) as u8
        })
        .collect()
}

fn packed(dtype: DType, shape: Shape, seed: u32) -> Tensor {
    let bytes = noise(shape.size_bytes(dtype), seed);
    Tensor::from_bytes(shape, dtype, bytes).unwrap()
}

/// Decoded source values as `f32`.
fn values(t: &Tensor) -> Vec<f32> {
    let n = t.num_elements();
    match t.dtype() {
        DType::I4 => unpack_i4(t.as_bytes(), n).into_iter().map(f32::from).collect(),
        DType::U4 => unpack_u4(t.as_bytes(), n).into_iter().map(f32::from).collect(),
        DType::I8 => t.to_vec::<i8>().unwrap().into_iter().map(f32::from).collect(),
        DType::U8 => t.to_vec::<u8>().unwrap().into_iter().map(f32::from).collect(),
        other => panic!("not a packed source: {other}"),
    }
}

/// Random `f16` scales in roughly `[-2, 2]`.
fn f16_scales(shape: Shape, seed: u32) -> (Tensor, Vec<f32>) {
    let raw: Vec<f16> = noise(shape.num_elements(), seed)
        .into_iter()
        .map(|b| f16::from_f32((b as f32 - 127.5) / 64.0))
        .collect();
    let widened = raw.iter().map(|v| v.to_f32()).collect();
    (Tensor::from_slice(shape, &raw).unwrap(), widened)
}

fn f16_bits(values: impl IntoIterator<Item = f32>) -> Vec<u16> {
    values.into_iter().map(|v| f16::from_f32(v).to_bits()).collect()
}

fn as_f16_bits(t: &Tensor) -> Vec<u16> {
    t.to_vec::<f16>().unwrap().iter().map(|v| v.to_bits()).collect()
}

fn as_f32(t: &Tensor) -> Vec<f32> {
    t.to_vec::<f16>().unwrap().iter().map(|v| v.to_f32()).collect()
}

fn scaled(data: &Tensor, scale: &Tensor, options: &UnpackOptions) -> Result<Tensor, CodecError> {
    let mut out = Tensor::zeros(data.shape().clone(), DType::F16);
    unpack_scaled(&data.view(), &scale.view(), &mut out.view_mut(), options)?;
    Ok(out)
}

fn asymmetric(
    data: &Tensor,
    zerop: &Tensor,
    scale: &Tensor,
    options: &UnpackOptions,
) -> Result<Tensor, CodecError> {
    let mut out = Tensor::zeros(data.shape().clone(), DType::F16);
    unpack_asymmetric(
        &data.view(),
        &zerop.view(),
        &scale.view(),
        &mut out.view_mut(),
        options,
    )?;
    Ok(out)
}

fn partition_configs() -> Vec<UnpackOptions> {
    vec![
        UnpackOptions::default().with_partitions(4),
        UnpackOptions::default().with_partitions(4).parallel(true),
        UnpackOptions::default().with_partitions(4).strict(true).parallel(true),
        UnpackOptions::default().with_partitions(16).strict(true).parallel(true),
        UnpackOptions::default().with_partitions(5).strict(true),
    ]
}

// ── Symmetric ──────────────────────────────────────────────────

#[test]
fn test_per_row_i4_small() {
    let data = Tensor::from_i4(Shape::matrix(2, 3), &[-8, 1, 7, 2, -2, 0]).unwrap();
    let scale = Tensor::from_f32(Shape::matrix(2, 1), &[0.5, -4.0]).unwrap();
    let out = scaled(&data, &scale, &UnpackOptions::default()).unwrap();
    assert_eq!(as_f32(&out), vec![-4.0, 0.5, 3.5, -8.0, 8.0, 0.0]);
}

#[test]
fn test_per_row_i4_matches_reference() {
    let data = packed(DType::I4, Shape::matrix(6, 257), 1);
    let (scale, s) = f16_scales(Shape::matrix(6, 1), 2);
    let out = scaled(&data, &scale, &UnpackOptions::default()).unwrap();
    let want = values(&data)
        .into_iter()
        .enumerate()
        .map(|(i, x)| x * s[i / 257]);
    assert_eq!(as_f16_bits(&out), f16_bits(want));
}

#[test]
fn test_per_group_i8_matches_reference() {
    let data = packed(DType::I8, Shape::cube(4, 3, 100), 3);
    let s: Vec<f32> = (0..12).map(|g| 0.125 * (g as f32 + 1.0)).collect();
    let scale = Tensor::from_f32(Shape::cube(4, 3, 1), &s).unwrap();
    let out = scaled(&data, &scale, &UnpackOptions::default()).unwrap();
    let want = values(&data)
        .into_iter()
        .enumerate()
        .map(|(i, x)| x * s[i / 100]);
    assert_eq!(as_f16_bits(&out), f16_bits(want));
}

#[test]
fn test_per_column_i4_matches_reference() {
    let (c, h, w) = (3, 5, 70);
    let data = packed(DType::I4, Shape::cube(c, h, w), 4);
    let (scale, s) = f16_scales(Shape::cube(c, 1, w), 5);
    let out = scaled(&data, &scale, &UnpackOptions::default()).unwrap();
    let want = values(&data).into_iter().enumerate().map(|(i, x)| {
        let ch = i / (h * w);
        let col = i % w;
        x * s[ch * w + col]
    });
    assert_eq!(as_f16_bits(&out), f16_bits(want));
}

#[test]
fn test_ambiguous_scale_is_per_group() {
    let data = Tensor::from_i4(Shape::cube(3, 1, 1), &[1, -2, 3]).unwrap();
    let scale = Tensor::from_f32(Shape::cube(3, 1, 1), &[2.0, 3.0, 4.0]).unwrap();
    let out = scaled(&data, &scale, &UnpackOptions::default()).unwrap();
    assert_eq!(as_f32(&out), vec![2.0, -6.0, 12.0]);
}

#[test]
fn test_symmetric_partitioning_is_deterministic() {
    let data = packed(DType::I4, Shape::cube(64, 32, 128), 6);
    let (scale, _) = f16_scales(Shape::cube(64, 32, 1), 7);
    let baseline = scaled(&data, &scale, &UnpackOptions::default()).unwrap();
    for options in partition_configs() {
        let out = scaled(&data, &scale, &options).unwrap();
        assert_eq!(out.as_bytes(), baseline.as_bytes(), "{options:?}");
    }

    let data = packed(DType::I4, Shape::cube(37, 4, 96), 8);
    let (scale, _) = f16_scales(Shape::cube(37, 1, 96), 9);
    let baseline = scaled(&data, &scale, &UnpackOptions::default()).unwrap();
    for options in partition_configs() {
        let out = scaled(&data, &scale, &options).unwrap();
        assert_eq!(out.as_bytes(), baseline.as_bytes(), "{options:?}");
    }
}

// ── Asymmetric ─────────────────────────────────────────────────

#[test]
fn test_per_row_u4_scalar_zero_point() {
    let data = packed(DType::U4, Shape::matrix(3, 130), 10);
    let (scale, s) = f16_scales(Shape::matrix(3, 1), 11);
    let zerop = Tensor::from_slice(Shape::scalar(), &[f16::from_f32(8.0)]).unwrap();
    let out = asymmetric(&data, &zerop, &scale, &UnpackOptions::default()).unwrap();
    let want = values(&data)
        .into_iter()
        .enumerate()
        .map(|(i, x)| (x - 8.0) * s[i / 130]);
    assert_eq!(as_f16_bits(&out), f16_bits(want));
}

#[test]
fn test_per_group_u4_packed_zero_points() {
    let (c, h, w) = (5, 3, 66);
    let data = packed(DType::U4, Shape::cube(c, h, w), 12);
    let (scale, s) = f16_scales(Shape::cube(c, h, 1), 13);
    let zerop = packed(DType::U4, Shape::cube(c, h, 1), 14);
    let z = values(&zerop);
    let out = asymmetric(&data, &zerop, &scale, &UnpackOptions::default()).unwrap();
    let want = values(&data).into_iter().enumerate().map(|(i, x)| {
        let g = i / w;
        (x - z[g]) * s[g]
    });
    assert_eq!(as_f16_bits(&out), f16_bits(want));
}

#[test]
fn test_per_group_u4_odd_group_reads_high_nibble() {
    // Zero points 3 and 12 share one byte.
    let data = Tensor::from_u4(Shape::cube(1, 2, 2), &[5, 5, 5, 5]).unwrap();
    let zerop = Tensor::from_u4(Shape::cube(1, 2, 1), &[3, 12]).unwrap();
    let scale = Tensor::from_f32(Shape::cube(1, 2, 1), &[1.0, 1.0]).unwrap();
    let out = asymmetric(&data, &zerop, &scale, &UnpackOptions::default()).unwrap();
    assert_eq!(as_f32(&out), vec![2.0, 2.0, -7.0, -7.0]);
}

#[test]
fn test_per_group_f32_zero_points() {
    let data = packed(DType::U4, Shape::cube(2, 4, 80), 15);
    let (scale, s) = f16_scales(Shape::cube(2, 4, 1), 16);
    let z: Vec<f32> = (0..8).map(|g| g as f32 + 0.5).collect();
    let zerop = Tensor::from_f32(Shape::cube(2, 4, 1), &z).unwrap();
    let out = asymmetric(&data, &zerop, &scale, &UnpackOptions::default()).unwrap();
    let want = values(&data).into_iter().enumerate().map(|(i, x)| {
        let g = i / 80;
        (x - z[g]) * s[g]
    });
    assert_eq!(as_f16_bits(&out), f16_bits(want));
}

#[test]
fn test_per_column_u4_scalar_zero_point() {
    let (c, h, w) = (4, 3, 65);
    let data = packed(DType::U4, Shape::cube(c, h, w), 17);
    let (scale, s) = f16_scales(Shape::cube(c, 1, w), 18);
    let zerop = Tensor::from_u4(Shape::vector(1), &[9]).unwrap();
    let out = asymmetric(&data, &zerop, &scale, &UnpackOptions::default()).unwrap();
    let want = values(&data).into_iter().enumerate().map(|(i, x)| {
        let ch = i / (h * w);
        (x - 9.0) * s[ch * w + i % w]
    });
    assert_eq!(as_f16_bits(&out), f16_bits(want));
}

#[test]
fn test_per_column_rejects_per_group_zero_points() {
    let data = packed(DType::U4, Shape::cube(2, 3, 4), 19);
    let (scale, _) = f16_scales(Shape::cube(2, 1, 4), 20);
    let zerop = packed(DType::U4, Shape::cube(2, 1, 4), 21);
    let err = asymmetric(&data, &zerop, &scale, &UnpackOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
}

#[test]
fn test_u8_per_group_u8_zero_points() {
    let data = packed(DType::U8, Shape::cube(3, 2, 129), 22);
    let (scale, s) = f16_scales(Shape::cube(3, 2, 1), 23);
    let z: Vec<u8> = vec![0, 17, 128, 200, 255, 3];
    let zerop = Tensor::from_slice(Shape::cube(3, 2, 1), &z).unwrap();
    let out = asymmetric(&data, &zerop, &scale, &UnpackOptions::default()).unwrap();
    let want = values(&data).into_iter().enumerate().map(|(i, x)| {
        let g = i / 129;
        (x - f32::from(z[g])) * s[g]
    });
    assert_eq!(as_f16_bits(&out), f16_bits(want));
}

#[test]
fn test_u8_rules() {
    let data = packed(DType::U8, Shape::cube(2, 2, 8), 24);

    let (scale, _) = f16_scales(Shape::cube(2, 2, 1), 25);
    let zerop = Tensor::from_f32(Shape::scalar(), &[1.0]).unwrap();
    let err = asymmetric(&data, &zerop, &scale, &UnpackOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);

    let (scale, _) = f16_scales(Shape::cube(2, 1, 8), 26);
    let zerop = Tensor::from_slice(Shape::scalar(), &[4u8]).unwrap();
    let err = asymmetric(&data, &zerop, &scale, &UnpackOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
}

#[test]
fn test_asymmetric_partitioning_is_deterministic() {
    let data = packed(DType::U4, Shape::cube(48, 16, 192), 27);
    let (scale, _) = f16_scales(Shape::cube(48, 16, 1), 28);
    let zerop = packed(DType::U4, Shape::cube(48, 16, 1), 29);
    let baseline = asymmetric(&data, &zerop, &scale, &UnpackOptions::default()).unwrap();
    for options in partition_configs() {
        let out = asymmetric(&data, &zerop, &scale, &options).unwrap();
        assert_eq!(out.as_bytes(), baseline.as_bytes(), "{options:?}");
    }

    let data = packed(DType::U4, Shape::cube(11, 6, 64), 30);
    let (scale, _) = f16_scales(Shape::cube(11, 1, 64), 31);
    let zerop = Tensor::from_u4(Shape::vector(1), &[7]).unwrap();
    let baseline = asymmetric(&data, &zerop, &scale, &UnpackOptions::default()).unwrap();
    for options in partition_configs() {
        let out = asymmetric(&data, &zerop, &scale, &options).unwrap();
        assert_eq!(out.as_bytes(), baseline.as_bytes(), "{options:?}");
    }
}

// ── Errors ─────────────────────────────────────────────────────

#[test]
fn test_mode_rejects_wrong_source() {
    let u4 = packed(DType::U4, Shape::matrix(2, 8), 32);
    let i4 = packed(DType::I4, Shape::matrix(2, 8), 33);
    let (scale, _) = f16_scales(Shape::matrix(2, 1), 34);
    let zerop = Tensor::from_f32(Shape::scalar(), &[0.0]).unwrap();

    let err = scaled(&u4, &scale, &UnpackOptions::default()).unwrap_err();
    assert!(matches!(err, CodecError::UnsupportedSource { dtype: DType::U4, .. }));

    let err = asymmetric(&i4, &zerop, &scale, &UnpackOptions::default()).unwrap_err();
    assert!(matches!(err, CodecError::UnsupportedSource { dtype: DType::I4, .. }));
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
}

#[test]
fn test_unrecognised_scale_shape() {
    let data = packed(DType::I4, Shape::cube(2, 3, 4), 35);
    for dims in [vec![2, 3], vec![3, 1], vec![2, 3, 2], vec![1, 1, 4]] {
        let scale = Tensor::zeros(Shape::new(dims.clone()), DType::F16);
        let err = scaled(&data, &scale, &UnpackOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation, "{dims:?}");
    }
}

#[test]
fn test_integer_scale_rejected_before_writing() {
    let data = packed(DType::I4, Shape::matrix(2, 8), 36);
    let scale = Tensor::from_slice(Shape::matrix(2, 1), &[1i8, 2]).unwrap();
    let mut out = Tensor::from_bytes(Shape::matrix(2, 8), DType::F16, vec![0x5A; 32]).unwrap();
    let err = unpack_scaled(
        &data.view(),
        &scale.view(),
        &mut out.view_mut(),
        &UnpackOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    assert!(out.as_bytes().iter().all(|&b| b == 0x5A));
}

#[test]
fn test_empty_tensor_is_a_no_op() {
    let data = Tensor::zeros(Shape::matrix(0, 16), DType::I4);
    let scale = Tensor::zeros(Shape::matrix(0, 1), DType::F16);
    let out = scaled(&data, &scale, &UnpackOptions::default().with_partitions(4)).unwrap();
    assert_eq!(out.num_elements(), 0);
}
