// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Zero-point encodings for asymmetric dequantization.

use crate::CodecError;
use tensor_core::nibble::{lo4, read_nibble};
use tensor_core::{read_float, DType, TensorView};

/// A resolved zero-point source.
#[derive(Debug, Clone, Copy)]
pub enum ZeroPoint<'a> {
    /// One value broadcast over the whole tensor. A `U4` scalar is taken
    /// from the low nibble of its byte.
    Scalar(f32),
    /// One `U4` value per group; group `g` is nibble `g` of the buffer.
    PackedNibbles(&'a [u8]),
    /// One `U8`/`F16`/`F32` value per group.
    PerGroup { dtype: DType, bytes: &'a [u8] },
}

impl<'a> ZeroPoint<'a> {
    /// Picks the encoding for `zerop` given `groups` scale values.
    ///
    /// # Errors
    /// Returns [`CodecError::InvariantViolation`] if `zerop` is neither a
    /// single element nor one element per group, or has a type other than
    /// `U4`, `U8`, `F16` or `F32`.
    pub fn resolve(zerop: &TensorView<'a>, groups: usize) -> Result<Self, CodecError> {
        let dtype = zerop.dtype();
        if !matches!(dtype, DType::U4 | DType::U8 | DType::F16 | DType::F32) {
            return Err(CodecError::invariant(
                "zero point",
                format!("zero point must be u4, u8, f16 or f32, got {dtype}"),
            ));
        }
        let bytes = zerop.contiguous_bytes("zero point")?;
        let count = zerop.num_elements();
        if count == 1 {
            let value = match dtype {
                DType::U4 => lo4(bytes[0]) as f32,
                DType::U8 => bytes[0] as f32,
                _ => read_float(dtype, bytes, 0).unwrap_or(0.0),
            };
            return Ok(ZeroPoint::Scalar(value));
        }
        if count != groups {
            return Err(CodecError::invariant(
                "zero point",
                format!("zero point has {count} elements, expected 1 or {groups}"),
            ));
        }
        Ok(match dtype {
            DType::U4 => ZeroPoint::PackedNibbles(bytes),
            _ => ZeroPoint::PerGroup { dtype, bytes },
        })
    }

    /// Returns `true` for a broadcast scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(self, ZeroPoint::Scalar(_))
    }

    /// The zero point of group `g`.
    #[inline(always)]
    pub fn get(&self, g: usize) -> f32 {
        match *self {
            ZeroPoint::Scalar(z) => z,
            ZeroPoint::PackedNibbles(bytes) => read_nibble(bytes, g) as f32,
            ZeroPoint::PerGroup { dtype: DType::U8, bytes } => bytes[g] as f32,
            ZeroPoint::PerGroup { dtype, bytes } => read_float(dtype, bytes, g).unwrap_or(0.0),
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ZeroPoint::Scalar(_) => "scalar",
            ZeroPoint::PackedNibbles(_) => "packed-nibbles",
            ZeroPoint::PerGroup { .. } => "per-group",
        }
    }
}
