// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Partitioning in scale-group space.
//!
//! Dequantization kernels never split a group: every element that shares a
//! scale lands in the same partition. The non-strict floor is expressed in
//! vector blocks, so large groups need fewer of them per partition.

use super::{PartitionStrategy, MIN_BLOCKS_PER_PARTITION, VECTOR_BLOCK};
use crate::plan::PlanBuilder;
use crate::{PartitionPlan, PlannerError, UnpackOptions};

/// Splits `[0, groups)` for groups of `elements_per_group` elements.
#[derive(Debug, Clone)]
pub struct ScaleGroups {
    elements_per_group: usize,
}

impl ScaleGroups {
    pub fn new(elements_per_group: usize) -> Self {
        Self { elements_per_group }
    }

    /// Stride in groups for `groups` groups split `n` ways.
    pub fn stride(&self, groups: usize, n: usize, strict: bool) -> usize {
        let p = if strict {
            n
        } else {
            let blocks_per_group = (self.elements_per_group / VECTOR_BLOCK).max(1);
            let min_group_stride = (MIN_BLOCKS_PER_PARTITION / blocks_per_group).max(1);
            (groups / min_group_stride).clamp(1, n)
        };
        (groups / p).max(1)
    }
}

impl PartitionStrategy for ScaleGroups {
    fn name(&self) -> &str {
        "scale-groups"
    }

    fn plan(&self, groups: usize, options: &UnpackOptions) -> Result<PartitionPlan, PlannerError> {
        let mut builder = PlanBuilder::new(self.name(), groups);
        match options.partitions() {
            None => builder.add_range(0, groups),
            Some(n) => {
                let stride = self.stride(groups, n, options.strict_partitioning);
                tracing::debug!(
                    groups,
                    elements_per_group = self.elements_per_group,
                    requested = n,
                    stride,
                    "scale-groups stride"
                );
                builder.tile(stride);
            }
        }
        let plan = builder.build();
        plan.validate()?;
        Ok(plan)
    }
}
