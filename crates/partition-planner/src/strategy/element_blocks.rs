// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Block-aligned partitioning of a flat element range.
//!
//! Used by the plain widening kernels. Units are elements and every
//! partition boundary falls on a multiple of the vector block, so only the
//! final partition can end in a partial block.
//!
//! ```text
//! p      = strict ? n : clamp(total / (block * min_blocks), 1, n)
//! stride = max(block, floor_block(total / p))
//! ```
//!
//! Because the stride is rounded down, the plan may hold `p + 1`
//! partitions, the last one carrying the remainder.

use super::{PartitionStrategy, MIN_BLOCKS_PER_PARTITION, VECTOR_BLOCK};
use crate::plan::PlanBuilder;
use crate::{PartitionPlan, PlannerError, UnpackOptions};

/// Splits `[0, total)` into block-aligned element ranges.
#[derive(Debug, Clone)]
pub struct ElementBlocks {
    block: usize,
    min_blocks: usize,
}

impl ElementBlocks {
    pub fn new() -> Self {
        Self::with_block(VECTOR_BLOCK, MIN_BLOCKS_PER_PARTITION)
    }

    /// Overrides the block size and the non-strict work floor.
    pub fn with_block(block: usize, min_blocks: usize) -> Self {
        Self {
            block: block.max(1),
            min_blocks: min_blocks.max(1),
        }
    }

    /// Stride in elements for `total` elements split `n` ways.
    pub fn stride(&self, total: usize, n: usize, strict: bool) -> usize {
        let p = if strict {
            n
        } else {
            (total / (self.block * self.min_blocks)).clamp(1, n)
        };
        ((total / p) / self.block * self.block).max(self.block)
    }
}

impl Default for ElementBlocks {
    fn default() -> Self {
        Self::new()
    }
}

impl PartitionStrategy for ElementBlocks {
    fn name(&self) -> &str {
        "element-blocks"
    }

    fn plan(&self, total: usize, options: &UnpackOptions) -> Result<PartitionPlan, PlannerError> {
        let mut builder = PlanBuilder::new(self.name(), total);
        match options.partitions() {
            None => builder.add_range(0, total),
            Some(n) => {
                let stride = self.stride(total, n, options.strict_partitioning);
                if options.strict_partitioning && total.div_ceil(stride) < n {
                    tracing::warn!(
                        total,
                        requested = n,
                        stride,
                        "fewer elements than strict partitions can split at block granularity"
                    );
                }
                tracing::debug!(total, requested = n, stride, "element-blocks stride");
                builder.tile(stride);
            }
        }
        let plan = builder.build();
        plan.validate()?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(n: usize, strict: bool) -> UnpackOptions {
        UnpackOptions::default().with_partitions(n).strict(strict)
    }

    #[test]
    fn test_unpartitioned_is_single_job() {
        let plan = ElementBlocks::new()
            .plan(1_000_000, &UnpackOptions::default())
            .unwrap();
        assert_eq!(plan.num_partitions(), 1);
        assert_eq!(plan.partitions[0].range(), 0..1_000_000);
    }

    #[test]
    fn test_heuristic_floor_limits_partitions() {
        // Less than 64 * 2048 elements: the hint collapses to one partition.
        let plan = ElementBlocks::new().plan(100_000, &opts(8, false)).unwrap();
        assert_eq!(plan.num_partitions(), 1);

        // Four floors of work, eight requested: four partitions.
        let total = 4 * 64 * 2048;
        let plan = ElementBlocks::new().plan(total, &opts(8, false)).unwrap();
        assert_eq!(plan.num_partitions(), 4);
    }

    #[test]
    fn test_strict_uses_requested_count() {
        let plan = ElementBlocks::new().plan(64 * 100, &opts(4, true)).unwrap();
        assert_eq!(plan.num_partitions(), 4);
        assert!(plan.partitions.iter().all(|p| p.len() == 64 * 25));
    }

    #[test]
    fn test_stride_rounds_down_and_keeps_remainder() {
        // 4133 / 4 = 1033 -> 1024; four full partitions plus 37 elements.
        let plan = ElementBlocks::new().plan(4133, &opts(4, true)).unwrap();
        assert_eq!(plan.num_partitions(), 5);
        assert!(plan.partitions.iter().all(|p| p.start % 64 == 0));
        assert_eq!(plan.partitions[4].range(), 4096..4133);
    }

    #[test]
    fn test_stride_clamped_to_block() {
        let plan = ElementBlocks::new().plan(100, &opts(16, true)).unwrap();
        assert_eq!(plan.num_partitions(), 2);
        assert_eq!(plan.partitions[0].range(), 0..64);
        assert_eq!(plan.partitions[1].range(), 64..100);
    }

    #[test]
    fn test_empty_total() {
        let plan = ElementBlocks::new().plan(0, &opts(4, true)).unwrap();
        assert_eq!(plan.num_partitions(), 0);
    }
}
