// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`PartitionStrategy`] trait and strategy implementations.

pub mod channels;
pub mod element_blocks;
pub mod scale_groups;

use crate::{PartitionPlan, PlannerError, UnpackOptions};

/// Elements decoded per vector block.
pub const VECTOR_BLOCK: usize = 64;

/// Minimum vector blocks a non-strict partition should carry.
pub const MIN_BLOCKS_PER_PARTITION: usize = 2048;

/// Trait for partition strategies.
///
/// Each strategy takes a unit count and the caller's options and produces
/// a [`PartitionPlan`] that tiles `[0, total_units)`.
///
/// Strategies are purely arithmetic, which keeps them unit-testable and
/// amenable to property-based testing.
pub trait PartitionStrategy: Send + Sync {
    /// Human-readable name of this strategy.
    fn name(&self) -> &str;

    /// Produces a plan for `total_units` units of work.
    fn plan(&self, total_units: usize, options: &UnpackOptions)
        -> Result<PartitionPlan, PlannerError>;
}
