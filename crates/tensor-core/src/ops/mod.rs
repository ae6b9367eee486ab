// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layout transforms and dense casts.
//!
//! Operations that fill a caller-owned destination take a
//! [`crate::TensorViewMut`]; those that change the shape return a fresh
//! [`crate::Tensor`].

mod cast_op;
mod concat_op;
mod gather_op;
mod permute_op;
mod view_op;

pub use cast_op::{to_f16, to_f32};
pub use concat_op::concat;
pub use gather_op::gather;
pub use permute_op::{permute, transpose, SUPPORTED_AXES};
pub use view_op::{view, view_dim, view_dim_mut, view_mut};
