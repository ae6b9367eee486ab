// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # weight-codec
//!
//! Unpacks 4-bit and 8-bit packed weight tensors into wider types, with
//! optional symmetric or asymmetric dequantization.
//!
//! | Entry point | Pairs | Formula |
//! |---|---|---|
//! | [`unpack`] | `i4->i8`, `i4->f16`, `u4->i8`, `u4->f16`, `u4->f32`, `i8->f16` | `x` |
//! | [`unpack_scaled`] | `i4->f16`, `i8->f16` | `x * s` |
//! | [`unpack_asymmetric`] | `u4->f16`, `u8->f16` | `(x - z) * s` |
//!
//! The scale layout is inferred from the shapes (see [`ScaleLayout`]).
//! Arithmetic runs in `f32` and each result is rounded once to the
//! destination type, so partitioned and parallel runs are bit-identical to
//! a single sequential pass.
//!
//! # Example
//! ```
//! use half::f16;
//! use partition_planner::UnpackOptions;
//! use tensor_core::{DType, Shape, Tensor};
//!
//! let data = Tensor::from_u4(Shape::matrix(2, 2), &[3, 5, 8, 8]).unwrap();
//! let zerop = Tensor::from_f32(Shape::scalar(), &[4.0]).unwrap();
//! let scale = Tensor::from_f32(Shape::matrix(2, 1), &[0.5, 2.0]).unwrap();
//! let mut out = Tensor::zeros(Shape::matrix(2, 2), DType::F16);
//!
//! weight_codec::unpack_asymmetric(
//!     &data.view(),
//!     &zerop.view(),
//!     &scale.view(),
//!     &mut out.view_mut(),
//!     &UnpackOptions::default(),
//! )
//! .unwrap();
//! let got: Vec<f32> = out.to_vec::<f16>().unwrap().iter().map(|v| v.to_f32()).collect();
//! assert_eq!(got, vec![-0.5, 0.5, 8.0, 8.0]);
//! ```

mod codec;
mod error;
mod kernels;
mod lanes;
mod observe;
mod scale;
mod zero_point;

pub use codec::{unpack, unpack_asymmetric, unpack_scaled, Codec};
pub use error::CodecError;
pub use observe::{NoopObserver, StatsRow, UnpackObserver, UnpackStats};
pub use partition_planner::UnpackOptions;
pub use scale::ScaleLayout;
pub use zero_point::ZeroPoint;
