// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Partitioning over outer channels.
//!
//! Used by the per-column dequantization path, which walks each channel
//! row by row. Strict mode rounds the stride up so the requested count is
//! never exceeded; hinted mode rounds it down.

use super::PartitionStrategy;
use crate::plan::PlanBuilder;
use crate::{PartitionPlan, PlannerError, UnpackOptions};

/// Splits `[0, channels)` into channel ranges.
#[derive(Debug, Clone, Default)]
pub struct Channels;

impl Channels {
    pub fn new() -> Self {
        Self
    }

    /// Stride in channels for `channels` split `n` ways.
    pub fn stride(channels: usize, n: usize, strict: bool) -> usize {
        if strict {
            channels.div_ceil(n).max(1)
        } else {
            (channels / n).max(1)
        }
    }
}

impl PartitionStrategy for Channels {
    fn name(&self) -> &str {
        "channels"
    }

    fn plan(&self, channels: usize, options: &UnpackOptions) -> Result<PartitionPlan, PlannerError> {
        let mut builder = PlanBuilder::new(self.name(), channels);
        match options.partitions() {
            None => builder.add_range(0, channels),
            Some(n) => {
                let stride = Self::stride(channels, n, options.strict_partitioning);
                tracing::debug!(channels, requested = n, stride, "channels stride");
                builder.tile(stride);
            }
        }
        let plan = builder.build();
        plan.validate()?;
        Ok(plan)
    }
}
