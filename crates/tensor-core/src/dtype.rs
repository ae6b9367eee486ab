// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Supported tensor element data types.

use std::fmt;

/// Enumerates the numeric types a [`crate::Tensor`] can hold.
///
/// The codec uses `DType` pairs as dispatch keys, and the layout transforms
/// use [`DType::is_sub_byte`] to pick between byte copies and nibble access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 4-bit signed integer, two per byte.
    I4,
    /// 4-bit unsigned integer, two per byte.
    U4,
    /// 8-bit signed integer (for quantised weights).
    I8,
    /// 8-bit unsigned integer.
    U8,
    I16,
    U16,
    I32,
    U32,
    /// 64-bit signed integer (gather indices).
    I64,
    U64,
    /// 16-bit IEEE 754 floating point.
    F16,
    /// 16-bit brain floating point.
    BF16,
    /// 32-bit IEEE 754 floating point.
    F32,
}

impl DType {
    /// Every supported type, in declaration order.
    pub const ALL: [DType; 13] = [
        DType::I4,
        DType::U4,
        DType::I8,
        DType::U8,
        DType::I16,
        DType::U16,
        DType::I32,
        DType::U32,
        DType::I64,
        DType::U64,
        DType::F16,
        DType::BF16,
        DType::F32,
    ];

    /// Returns the width of a single element in bits.
    pub fn bit_width(self) -> usize {
        match self {
            DType::I4 | DType::U4 => 4,
            DType::I8 | DType::U8 => 8,
            DType::I16 | DType::U16 | DType::F16 | DType::BF16 => 16,
            DType::I32 | DType::U32 | DType::F32 => 32,
            DType::I64 | DType::U64 => 64,
        }
    }

    /// Returns the size of a single element in bytes, rounded up.
    ///
    /// Sub-byte types report `1` (the byte they share with a neighbour);
    /// use [`DType::buffer_bytes`] to size buffers.
    pub fn size_bytes(self) -> usize {
        self.bit_width().div_ceil(8)
    }

    /// Returns the number of bytes needed to store `num_elements` elements.
    pub fn buffer_bytes(self, num_elements: usize) -> usize {
        (num_elements * self.bit_width()).div_ceil(8)
    }

    /// Returns `true` for types packed more than one per byte.
    pub fn is_sub_byte(self) -> bool {
        self.bit_width() < 8
    }

    /// Returns `true` for floating point types.
    pub fn is_float(self) -> bool {
        matches!(self, DType::F16 | DType::BF16 | DType::F32)
    }

    /// Returns a human-readable label for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::I4 => "i4",
            DType::U4 => "u4",
            DType::I8 => "i8",
            DType::U8 => "u8",
            DType::I16 => "i16",
            DType::U16 => "u16",
            DType::I32 => "i32",
            DType::U32 => "u32",
            DType::I64 => "i64",
            DType::U64 => "u64",
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::F32 => "f32",
        }
    }

    /// Parses a label produced by [`DType::as_str`].
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|d| d.as_str() == label)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_bytes_rounds_up_for_nibbles() {
        assert_eq!(DType::U4.buffer_bytes(0), 0);
        assert_eq!(DType::U4.buffer_bytes(1), 1);
        assert_eq!(DType::I4.buffer_bytes(64), 32);
        assert_eq!(DType::I4.buffer_bytes(65), 33);
        assert_eq!(DType::F16.buffer_bytes(3), 6);
    }

    #[test]
    fn test_size_bytes() {
        assert_eq!(DType::I4.size_bytes(), 1);
        assert_eq!(DType::BF16.size_bytes(), 2);
        assert_eq!(DType::I64.size_bytes(), 8);
    }

    #[test]
    fn test_parse_roundtrip() {
        for d in DType::ALL {
            assert_eq!(DType::parse(d.as_str()), Some(d));
        }
        assert_eq!(DType::parse(" F16 "), Some(DType::F16));
        assert_eq!(DType::parse("q4_k"), None);
    }

    #[test]
    fn test_sub_byte() {
        assert!(DType::I4.is_sub_byte());
        assert!(DType::U4.is_sub_byte());
        assert!(!DType::I8.is_sub_byte());
    }
}
