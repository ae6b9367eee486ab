// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Byte-addressable element types and their little-endian encodings.

use crate::DType;
use half::{bf16, f16};

/// A scalar that maps one-to-one onto a byte-addressable [`DType`].
///
/// Tensor buffers are plain `Vec<u8>` with no alignment guarantee, so
/// elements are always decoded with `from_le_bytes` rather than by
/// reinterpreting the buffer.
pub trait Element: Copy + Send + Sync + 'static {
    /// The matching tensor data type.
    const DTYPE: DType;

    /// Decodes one element from the first `DTYPE.size_bytes()` bytes of `bytes`.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encodes one element into the first `DTYPE.size_bytes()` bytes of `out`.
    fn write_le(self, out: &mut [u8]);

    /// Widens to `f32` with an `as`-style conversion.
    fn to_f32(self) -> f32;
}

macro_rules! impl_element {
    ($t:ty, $dtype:expr, $n:literal, $to_f32:expr) => {
        impl Element for $t {
            const DTYPE: DType = $dtype;

            #[inline(always)]
            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; $n];
                raw.copy_from_slice(&bytes[..$n]);
                <$t>::from_le_bytes(raw)
            }

            #[inline(always)]
            fn write_le(self, out: &mut [u8]) {
                out[..$n].copy_from_slice(&self.to_le_bytes());
            }

            #[inline(always)]
            fn to_f32(self) -> f32 {
                let f: fn($t) -> f32 = $to_f32;
                f(self)
            }
        }
    };
}

impl_element!(i8, DType::I8, 1, |v| v as f32);
impl_element!(u8, DType::U8, 1, |v| v as f32);
impl_element!(i16, DType::I16, 2, |v| v as f32);
impl_element!(u16, DType::U16, 2, |v| v as f32);
impl_element!(i32, DType::I32, 4, |v| v as f32);
impl_element!(u32, DType::U32, 4, |v| v as f32);
impl_element!(i64, DType::I64, 8, |v| v as f32);
impl_element!(u64, DType::U64, 8, |v| v as f32);
impl_element!(f16, DType::F16, 2, |v| v.to_f32());
impl_element!(bf16, DType::BF16, 2, |v| v.to_f32());
impl_element!(f32, DType::F32, 4, |v| v);

/// Reads a floating-point scalar (`F16` or `F32`) at element `index`.
///
/// Used for scale and zero-point side tensors. Returns `None` for other types.
#[inline]
pub fn read_float(dtype: DType, bytes: &[u8], index: usize) -> Option<f32> {
    match dtype {
        DType::F16 => Some(f16::read_le(&bytes[index * 2..]).to_f32()),
        DType::BF16 => Some(bf16::read_le(&bytes[index * 2..]).to_f32()),
        DType::F32 => Some(f32::read_le(&bytes[index * 4..])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_bytes() {
        let mut buf = [0u8; 8];
        (-3i64).write_le(&mut buf);
        assert_eq!(i64::read_le(&buf), -3);

        f16::from_f32(1.5).write_le(&mut buf);
        assert_eq!(f16::read_le(&buf).to_f32(), 1.5);

        let mut buf = [0u8; 5];
        0.25f32.write_le(&mut buf[1..]);
        assert_eq!(f32::read_le(&buf[1..]), 0.25);
    }

    #[test]
    fn test_dtype_constants() {
        assert_eq!(<i8 as Element>::DTYPE, DType::I8);
        assert_eq!(<bf16 as Element>::DTYPE, DType::BF16);
        assert_eq!(<f32 as Element>::DTYPE, DType::F32);
    }

    #[test]
    fn test_read_float() {
        let mut buf = vec![0u8; 4];
        f16::from_f32(-2.0).write_le(&mut buf[2..]);
        assert_eq!(read_float(DType::F16, &buf, 1), Some(-2.0));
        assert_eq!(read_float(DType::I8, &buf, 0), None);
    }
}
