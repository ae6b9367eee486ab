// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bit-level accessors for 4-bit packed buffers.
//!
//! Two 4-bit elements share one byte. Element `2k` lives in the **low**
//! nibble of byte `k` and element `2k + 1` in the **high** nibble. This
//! ordering is a fixed storage contract; every codec and layout path in
//! the workspace goes through the functions below rather than masking
//! bytes inline.
//!
//! ```
//! use tensor_core::nibble::{read_nibble, write_nibble};
//!
//! let mut buf = [0u8; 2];
//! write_nibble(&mut buf, 0, 0x3);
//! write_nibble(&mut buf, 1, 0xA);
//! assert_eq!(buf[0], 0xA3);
//! assert_eq!(read_nibble(&buf, 1), 0xA);
//! ```

/// Low nibble of a byte.
#[inline(always)]
pub fn lo4(byte: u8) -> u8 {
    byte & 0x0F
}

/// High nibble of a byte.
#[inline(always)]
pub fn hi4(byte: u8) -> u8 {
    byte >> 4
}

/// Packs two nibbles into a byte: `lo` first, `hi` second.
#[inline(always)]
pub fn pack_nibbles(lo: u8, hi: u8) -> u8 {
    (lo4(hi) << 4) | lo4(lo)
}

/// Sign-extends a 4-bit two's-complement value to `i8` (range `-8..=7`).
///
/// Only the low nibble of `nibble` is considered.
#[inline(always)]
pub fn sign_extend_i4(nibble: u8) -> i8 {
    ((nibble << 4) as i8) >> 4
}

/// Reads the 4-bit element at `index` from a packed buffer.
///
/// # Panics
/// Panics if `index / 2` is outside `buf`.
#[inline(always)]
pub fn read_nibble(buf: &[u8], index: usize) -> u8 {
    let byte = buf[index / 2];
    if index % 2 == 0 {
        lo4(byte)
    } else {
        hi4(byte)
    }
}

/// Writes the low 4 bits of `value` to element `index` of a packed buffer,
/// leaving the neighbouring element in the same byte untouched.
///
/// # Panics
/// Panics if `index / 2` is outside `buf`.
#[inline(always)]
pub fn write_nibble(buf: &mut [u8], index: usize, value: u8) {
    let byte = &mut buf[index / 2];
    if index % 2 == 0 {
        *byte = (*byte & 0xF0) | lo4(value);
    } else {
        *byte = (lo4(value) << 4) | lo4(*byte);
    }
}

/// Packs signed values (each in `-8..=7`) into a 4-bit buffer.
pub fn pack_i4(values: &[i8]) -> Vec<u8> {
    let mut buf = vec![0u8; values.len().div_ceil(2)];
    for (i, &v) in values.iter().enumerate() {
        debug_assert!((-8..=7).contains(&v), "i4 value {v} out of range");
        write_nibble(&mut buf, i, v as u8);
    }
    buf
}

/// Packs unsigned values (each in `0..=15`) into a 4-bit buffer.
pub fn pack_u4(values: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; values.len().div_ceil(2)];
    for (i, &v) in values.iter().enumerate() {
        debug_assert!(v <= 15, "u4 value {v} out of range");
        write_nibble(&mut buf, i, v);
    }
    buf
}

/// Decodes `count` signed 4-bit elements.
pub fn unpack_i4(buf: &[u8], count: usize) -> Vec<i8> {
    (0..count)
        .map(|i| sign_extend_i4(read_nibble(buf, i)))
        .collect()
}

/// Decodes `count` unsigned 4-bit elements.
pub fn unpack_u4(buf: &[u8], count: usize) -> Vec<u8> {
    (0..count).map(|i| read_nibble(buf, i)).collect()
}
