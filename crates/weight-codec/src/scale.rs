// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scale-tensor layouts and how they broadcast over the data tensor.
//!
//! Callers never pick a layout; [`ScaleLayout::infer`] derives it from the
//! two shapes and rejects everything it does not recognise.

use crate::CodecError;
use tensor_core::{read_float, DType, Shape, TensorView};

/// How a scale tensor lines up with the data it scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ScaleLayout {
    /// Scale `[rows, 1]`: one scale per leading-dimension row.
    PerRow {
        rows: usize,
        elements_per_scale: usize,
    },
    /// Scale `[outer, rows, 1]` over data `[outer, rows, cols]`: one scale per
    /// run of `elements_per_scale` consecutive elements.
    PerGroup {
        groups: usize,
        elements_per_scale: usize,
    },
    /// Scale `[channels, 1, cols]` over data `[channels, rows, cols]`: the
    /// scale varies along the innermost axis and is shared across rows.
    PerColumn {
        channels: usize,
        rows: usize,
        cols: usize,
    },
}

impl ScaleLayout {
    /// Infers the layout from the data and scale shapes.
    ///
    /// A rank-3 scale that fits both the per-group and per-column patterns
    /// (data `[C, 1, 1]`) is treated as per-group.
    ///
    /// # Errors
    /// Returns [`CodecError::InvariantViolation`] for any other combination.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// use weight_codec::ScaleLayout;
    /// let l = ScaleLayout::infer(&Shape::matrix(8, 128), &Shape::matrix(8, 1)).unwrap();
    /// assert_eq!(l, ScaleLayout::PerRow { rows: 8, elements_per_scale: 128 });
    /// ```
    pub fn infer(data: &Shape, scale: &Shape) -> Result<Self, CodecError> {
        let d = data.dims();
        let s = scale.dims();
        let total = data.num_elements();
        match (d.len(), s.len()) {
            (rank, 2) if rank >= 1 && s[1] == 1 && s[0] == d[0] => Ok(ScaleLayout::PerRow {
                rows: s[0],
                elements_per_scale: if s[0] == 0 { 0 } else { total / s[0] },
            }),
            (3, 3) if s[2] == 1 && s[0] == d[0] && s[1] == d[1] => Ok(ScaleLayout::PerGroup {
                groups: s[0] * s[1],
                elements_per_scale: d[2],
            }),
            (3, 3) if s[1] == 1 && s[0] == d[0] && s[2] == d[2] => Ok(ScaleLayout::PerColumn {
                channels: d[0],
                rows: d[1],
                cols: d[2],
            }),
            _ => Err(CodecError::invariant(
                "scale layout",
                format!("scale shape {scale} does not match data shape {data}"),
            )),
        }
    }

    /// Number of scale values the layout reads.
    pub fn scale_count(&self) -> usize {
        match *self {
            ScaleLayout::PerRow { rows, .. } => rows,
            ScaleLayout::PerGroup { groups, .. } => groups,
            ScaleLayout::PerColumn { channels, cols, .. } => channels * cols,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ScaleLayout::PerRow { .. } => "per-row",
            ScaleLayout::PerGroup { .. } => "per-group",
            ScaleLayout::PerColumn { .. } => "per-column",
        }
    }

    /// For the group-wise layouts, `(groups, elements_per_scale)`.
    pub(crate) fn groups(&self) -> Option<(usize, usize)> {
        match *self {
            ScaleLayout::PerRow {
                rows,
                elements_per_scale,
            } => Some((rows, elements_per_scale)),
            ScaleLayout::PerGroup {
                groups,
                elements_per_scale,
            } => Some((groups, elements_per_scale)),
            ScaleLayout::PerColumn { .. } => None,
        }
    }
}

/// Validated, read-only access to a float scale buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scales<'a> {
    dtype: DType,
    bytes: &'a [u8],
}

impl<'a> Scales<'a> {
    pub(crate) fn new(scale: &TensorView<'a>) -> Result<Self, CodecError> {
        if !matches!(scale.dtype(), DType::F16 | DType::F32) {
            return Err(CodecError::invariant(
                "scale",
                format!("scale must be f16 or f32, got {}", scale.dtype()),
            ));
        }
        Ok(Self {
            dtype: scale.dtype(),
            bytes: scale.contiguous_bytes("scale")?,
        })
    }

    #[inline(always)]
    pub(crate) fn get(&self, index: usize) -> f32 {
        read_float(self.dtype, self.bytes, index).unwrap_or(0.0)
    }
}
