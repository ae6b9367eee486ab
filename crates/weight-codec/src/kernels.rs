// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-partition unpack kernels.
//!
//! Each kernel fills one partition's destination slice and reads only the
//! source elements and side values that partition owns. The named
//! functions at the bottom are the entries of the codec's dispatch tables.

use crate::lanes::{decode_run, Sink, Source, BLOCK};
use crate::scale::{ScaleLayout, Scales};
use crate::ZeroPoint;
use partition_planner::Partition;

/// Plain widening: decodes elements `start..` into `out`.
pub(crate) type WidenFn = fn(src: &[u8], start: usize, out: &mut [u8]);

/// Dequantization over one partition of a [`DequantJob`].
pub(crate) type DequantFn = fn(job: &DequantJob<'_>, part: &Partition, out: &mut [u8]);

/// Everything a dequantization kernel reads.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DequantJob<'a> {
    pub src: &'a [u8],
    pub scales: Scales<'a>,
    pub zero: Option<ZeroPoint<'a>>,
    pub layout: ScaleLayout,
}

#[inline]
fn widen(src: Source, sink: Sink, data: &[u8], start: usize, out: &mut [u8]) {
    let width = sink.width();
    let mut lanes = [0f32; BLOCK];
    for (i, chunk) in out.chunks_mut(BLOCK * width).enumerate() {
        let n = chunk.len() / width;
        decode_run(src, data, start + i * BLOCK, &mut lanes[..n]);
        sink.store(&lanes[..n], chunk);
    }
}

/// Units are scale groups; the partition covers groups `part.range()`.
fn dequant_groups(src: Source, job: &DequantJob<'_>, part: &Partition, out: &mut [u8]) {
    let Some((_, eps)) = job.layout.groups() else {
        debug_assert!(false, "group kernel run with {:?}", job.layout);
        return;
    };
    let row_bytes = eps * Sink::F16.width();
    let mut lanes = [0f32; BLOCK];
    for (g, group_out) in part.range().zip(out.chunks_exact_mut(row_bytes.max(1))) {
        let s = job.scales.get(g);
        let z = job.zero.map_or(0.0, |z| z.get(g));
        let base = g * eps;
        for (i, chunk) in group_out.chunks_mut(BLOCK * 2).enumerate() {
            let n = chunk.len() / 2;
            let lanes = &mut lanes[..n];
            decode_run(src, job.src, base + i * BLOCK, lanes);
            for x in lanes.iter_mut() {
                *x = (*x - z) * s;
            }
            Sink::F16.store(lanes, chunk);
        }
    }
}

/// Units are outer channels. Rows of channel `c` share `scale[c, :]`.
fn dequant_columns(src: Source, job: &DequantJob<'_>, part: &Partition, out: &mut [u8]) {
    let ScaleLayout::PerColumn { rows, cols, .. } = job.layout else {
        debug_assert!(false, "column kernel run with {:?}", job.layout);
        return;
    };
    let z = job.zero.map_or(0.0, |z| z.get(0));
    let row_bytes = cols * Sink::F16.width();
    let mut lanes = [0f32; BLOCK];
    let mut row_out = out.chunks_exact_mut(row_bytes.max(1));
    for c in part.range() {
        for h in 0..rows {
            let Some(dst) = row_out.next() else {
                return;
            };
            let base = (c * rows + h) * cols;
            for (i, chunk) in dst.chunks_mut(BLOCK * 2).enumerate() {
                let n = chunk.len() / 2;
                let w0 = i * BLOCK;
                let lanes = &mut lanes[..n];
                decode_run(src, job.src, base + w0, lanes);
                for (w, x) in lanes.iter_mut().enumerate() {
                    *x = (*x - z) * job.scales.get(c * cols + w0 + w);
                }
                Sink::F16.store(lanes, chunk);
            }
        }
    }
}

fn dequant(src: Source, job: &DequantJob<'_>, part: &Partition, out: &mut [u8]) {
    match job.layout {
        ScaleLayout::PerColumn { .. } => dequant_columns(src, job, part, out),
        _ => dequant_groups(src, job, part, out),
    }
}

pub(crate) fn i4_to_i8(src: &[u8], start: usize, out: &mut [u8]) {
    widen(Source::I4, Sink::I8, src, start, out)
}

pub(crate) fn i4_to_f16(src: &[u8], start: usize, out: &mut [u8]) {
    widen(Source::I4, Sink::F16, src, start, out)
}

pub(crate) fn u4_to_i8(src: &[u8], start: usize, out: &mut [u8]) {
    widen(Source::U4, Sink::I8, src, start, out)
}

pub(crate) fn u4_to_f16(src: &[u8], start: usize, out: &mut [u8]) {
    widen(Source::U4, Sink::F16, src, start, out)
}

pub(crate) fn u4_to_f32(src: &[u8], start: usize, out: &mut [u8]) {
    widen(Source::U4, Sink::F32, src, start, out)
}

pub(crate) fn i8_to_f16(src: &[u8], start: usize, out: &mut [u8]) {
    widen(Source::I8, Sink::F16, src, start, out)
}

pub(crate) fn i4_scaled_f16(job: &DequantJob<'_>, part: &Partition, out: &mut [u8]) {
    dequant(Source::I4, job, part, out)
}

pub(crate) fn i8_scaled_f16(job: &DequantJob<'_>, part: &Partition, out: &mut [u8]) {
    dequant(Source::I8, job, part, out)
}

pub(crate) fn u4_asymmetric_f16(job: &DequantJob<'_>, part: &Partition, out: &mut [u8]) {
    dequant(Source::U4, job, part, out)
}

pub(crate) fn u8_asymmetric_f16(job: &DequantJob<'_>, part: &Partition, out: &mut [u8]) {
    dequant(Source::U8, job, part, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;
    use tensor_core::nibble::pack_i4;
    use tensor_core::{Shape, Tensor};

    fn f16s(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(2)
            .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect()
    }

    #[test]
    fn test_widen_offset_start() {
        let src = pack_i4(&[1, -1, 2, -2, 3, -3]);
        let mut out = [0u8; 3];
        i4_to_i8(&src, 3, &mut out);
        assert_eq!(out.map(|b| b as i8), [-2, 3, -3]);
    }

    #[test]
    fn test_dequant_groups_partition_slice() {
        // Two groups of three elements; run only the second group.
        let src = pack_i4(&[1, 2, 3, -1, -2, -3]);
        let scale = Tensor::from_f32(Shape::matrix(2, 1), &[10.0, 0.5]).unwrap();
        let scale_view = scale.view();
        let job = DequantJob {
            src: &src,
            scales: Scales::new(&scale_view).unwrap(),
            zero: None,
            layout: ScaleLayout::PerRow {
                rows: 2,
                elements_per_scale: 3,
            },
        };
        let part = Partition {
            index: 1,
            start: 1,
            end: 2,
        };
        let mut out = [0u8; 6];
        i4_scaled_f16(&job, &part, &mut out);
        assert_eq!(f16s(&out), vec![-0.5, -1.0, -1.5]);
    }

    #[test]
    fn test_dequant_columns() {
        // data [1, 2, 2], scale [1, 1, 2], zero 1
        let src = tensor_core::nibble::pack_u4(&[3, 5, 1, 9]);
        let scale = Tensor::from_f32(Shape::cube(1, 1, 2), &[2.0, 0.25]).unwrap();
        let scale_view = scale.view();
        let job = DequantJob {
            src: &src,
            scales: Scales::new(&scale_view).unwrap(),
            zero: Some(ZeroPoint::Scalar(1.0)),
            layout: ScaleLayout::PerColumn {
                channels: 1,
                rows: 2,
                cols: 2,
            },
        };
        let part = Partition {
            index: 0,
            start: 0,
            end: 1,
        };
        let mut out = [0u8; 8];
        u4_asymmetric_f16(&job, &part, &mut out);
        assert_eq!(f16s(&out), vec![4.0, 1.0, 0.0, 2.0]);
    }
}
