// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Tensor descriptors and layout transforms for packed low-bit weights.
//!
//! This crate provides:
//! - [`Tensor`]: an owned, byte-backed n-dimensional buffer.
//! - [`TensorView`] / [`TensorViewMut`]: borrowed, possibly strided descriptors.
//! - [`Shape`] and [`DType`], including the packed `I4`/`U4` types.
//! - [`nibble`]: the single place that knows how 4-bit elements sit in a byte.
//! - Layout operations: [`view`], [`permute`], [`transpose`], [`concat`], [`gather`].
//! - Dense casts: [`to_f32`], [`to_f16`].
//!
//! # Design Goals
//! - Views never own or copy data.
//! - Destinations are caller-allocated and never resized.
//! - Clean error types via `thiserror`.

mod dtype;
mod element;
mod error;
pub mod nibble;
mod ops;
mod shape;
mod tensor;

pub use dtype::DType;
pub use element::{read_float, Element};
pub use error::{ErrorKind, TensorError};
pub use ops::{
    concat, gather, permute, to_f16, to_f32, transpose, view, view_dim, view_dim_mut, view_mut,
    SUPPORTED_AXES,
};
pub use shape::Shape;
pub use tensor::{Tensor, TensorView, TensorViewMut};
