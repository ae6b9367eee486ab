// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Source decoding into `f32` lanes and destination encoding out of them.
//!
//! Every kernel is built from the same two steps: decode a run of packed
//! source elements into an `f32` scratch block, then encode that block
//! into the destination type. Full 64-element blocks that start on a byte
//! boundary go through fixed-width loops over `[u8; 32]` / `[u8; 64]`
//! arrays, which the compiler unrolls and vectorizes; everything else goes
//! through [`tensor_core::nibble`] one element at a time. The two paths
//! produce identical bits.

use half::f16;
use tensor_core::nibble::{read_nibble, sign_extend_i4};

/// Elements per vector block.
pub(crate) const BLOCK: usize = 64;

/// A packed integer source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    I4,
    U4,
    I8,
    U8,
}

impl Source {
    fn is_nibble(self) -> bool {
        matches!(self, Source::I4 | Source::U4)
    }

    /// Decodes element `index` one at a time.
    #[inline(always)]
    pub(crate) fn scalar(self, data: &[u8], index: usize) -> f32 {
        match self {
            Source::I4 => sign_extend_i4(read_nibble(data, index)) as f32,
            Source::U4 => read_nibble(data, index) as f32,
            Source::I8 => data[index] as i8 as f32,
            Source::U8 => data[index] as f32,
        }
    }
}

#[inline(always)]
fn block_i4(bytes: &[u8; BLOCK / 2], out: &mut [f32; BLOCK]) {
    for (pair, &b) in out.chunks_exact_mut(2).zip(bytes.iter()) {
        pair[0] = (((b << 4) as i8) >> 4) as f32;
        pair[1] = ((b as i8) >> 4) as f32;
    }
}

#[inline(always)]
fn block_u4(bytes: &[u8; BLOCK / 2], out: &mut [f32; BLOCK]) {
    for (pair, &b) in out.chunks_exact_mut(2).zip(bytes.iter()) {
        pair[0] = (b & 0x0F) as f32;
        pair[1] = (b >> 4) as f32;
    }
}

#[inline(always)]
fn block_i8(bytes: &[u8; BLOCK], out: &mut [f32; BLOCK]) {
    for (o, &b) in out.iter_mut().zip(bytes.iter()) {
        *o = b as i8 as f32;
    }
}

#[inline(always)]
fn block_u8(bytes: &[u8; BLOCK], out: &mut [f32; BLOCK]) {
    for (o, &b) in out.iter_mut().zip(bytes.iter()) {
        *o = b as f32;
    }
}

/// Decodes `out.len()` elements starting at element `start` of `data`.
///
/// Uses the block path for each full, byte-aligned 64-element chunk and
/// the scalar path for the rest.
#[inline]
pub(crate) fn decode_run(src: Source, data: &[u8], start: usize, out: &mut [f32]) {
    let mut done = 0;
    while done < out.len() {
        let at = start + done;
        let n = (out.len() - done).min(BLOCK);
        let chunk = &mut out[done..done + n];
        if n == BLOCK && !(src.is_nibble() && at % 2 == 1) {
            if let Ok(lanes) = <&mut [f32; BLOCK]>::try_from(chunk) {
                decode_block(src, data, at, lanes);
                done += n;
                continue;
            }
        }
        for (i, o) in out[done..done + n].iter_mut().enumerate() {
            *o = src.scalar(data, at + i);
        }
        done += n;
    }
}

#[inline(always)]
fn decode_block(src: Source, data: &[u8], at: usize, lanes: &mut [f32; BLOCK]) {
    match src {
        Source::I4 | Source::U4 => {
            let byte = at / 2;
            let mut packed = [0u8; BLOCK / 2];
            packed.copy_from_slice(&data[byte..byte + BLOCK / 2]);
            if src == Source::I4 {
                block_i4(&packed, lanes);
            } else {
                block_u4(&packed, lanes);
            }
        }
        Source::I8 | Source::U8 => {
            let mut raw = [0u8; BLOCK];
            raw.copy_from_slice(&data[at..at + BLOCK]);
            if src == Source::I8 {
                block_i8(&raw, lanes);
            } else {
                block_u8(&raw, lanes);
            }
        }
    }
}

/// Reference decoder: scalar path only.
#[cfg(test)]
pub(crate) fn decode_scalar(src: Source, data: &[u8], start: usize, out: &mut [f32]) {
    for (i, o) in out.iter_mut().enumerate() {
        *o = src.scalar(data, start + i);
    }
}

/// A byte-addressable destination type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sink {
    I8,
    F16,
    F32,
}

impl Sink {
    pub(crate) fn width(self) -> usize {
        match self {
            Sink::I8 => 1,
            Sink::F16 => 2,
            Sink::F32 => 4,
        }
    }

    /// Encodes `lanes` into `out`, `width()` bytes per lane.
    ///
    /// `I8` lanes are integral values already in range; `F16` rounds to
    /// nearest even.
    #[inline]
    pub(crate) fn store(self, lanes: &[f32], out: &mut [u8]) {
        debug_assert_eq!(out.len(), lanes.len() * self.width());
        match self {
            Sink::I8 => {
                for (o, &x) in out.iter_mut().zip(lanes) {
                    *o = x as i8 as u8;
                }
            }
            Sink::F16 => {
                for (o, &x) in out.chunks_exact_mut(2).zip(lanes) {
                    o.copy_from_slice(&f16::from_f32(x).to_le_bytes());
                }
            }
            Sink::F32 => {
                for (o, &x) in out.chunks_exact_mut(4).zip(lanes) {
                    o.copy_from_slice(&x.to_le_bytes());
                }
            }
        }
    }
}
