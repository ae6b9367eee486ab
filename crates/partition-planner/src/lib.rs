// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # partition-planner
//!
//! Splits a fixed amount of unpack work into independent, non-overlapping
//! ranges and runs them sequentially or on the rayon pool.
//!
//! # Strategies
//!
//! | Strategy | Unit | Used by |
//! |---|---|---|
//! | [`ElementBlocks`] | element, 64-aligned | plain widening |
//! | [`ScaleGroups`] | scale group | per-row / per-group dequantization |
//! | [`Channels`] | outer channel | per-column dequantization |
//!
//! All strategies implement [`PartitionStrategy`] and read the same
//! [`UnpackOptions`]. A missing or zero `partition_count` always yields a
//! single partition.
//!
//! # Example
//! ```
//! use partition_planner::{execute_partitions, ElementBlocks, PartitionStrategy, UnpackOptions};
//!
//! let opts = UnpackOptions::default().with_partitions(4).strict(true);
//! let plan = ElementBlocks::new().plan(256, &opts).unwrap();
//! assert_eq!(plan.num_partitions(), 4);
//!
//! let mut out = vec![0u8; 256];
//! execute_partitions(&plan, &mut out, 1, true, |p, dst| dst.fill(p.index as u8)).unwrap();
//! assert_eq!(out[255], 3);
//! ```

mod error;
mod execute;
mod options;
pub(crate) mod plan;
pub mod strategy;

pub use error::PlannerError;
pub use execute::{execute_partitions, split_partitions};
pub use options::UnpackOptions;
pub use plan::{Partition, PartitionPlan};
pub use strategy::channels::Channels;
pub use strategy::element_blocks::ElementBlocks;
pub use strategy::scale_groups::ScaleGroups;
pub use strategy::{PartitionStrategy, MIN_BLOCKS_PER_PARTITION, VECTOR_BLOCK};
