// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Partition plan: the output of a [`crate::PartitionStrategy`].
//!
//! A plan is an ordered list of half-open unit ranges that exactly tile
//! `[0, total_units)`. What a unit is (an element, a scale group, an outer
//! channel) is up to the strategy that built it. The plan is the contract
//! between the planner and [`crate::execute_partitions`].

use crate::PlannerError;
use std::ops::Range;

/// One independent range of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Partition {
    /// Index of this partition in the plan.
    pub index: usize,
    /// First unit, inclusive.
    pub start: usize,
    /// Last unit, exclusive.
    pub end: usize,
}

impl Partition {
    /// Number of units covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the partition covers no units.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The covered units as a range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// The ordered list of partitions for one call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PartitionPlan {
    /// Strategy name that produced this plan.
    pub strategy_name: String,
    /// Number of units the plan covers.
    pub total_units: usize,
    /// Ordered, non-overlapping partitions.
    pub partitions: Vec<Partition>,
}

impl PartitionPlan {
    /// Returns the number of partitions.
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Returns the largest partition length.
    pub fn max_partition_len(&self) -> usize {
        self.partitions.iter().map(Partition::len).max().unwrap_or(0)
    }

    /// Validates the plan.
    ///
    /// Checks:
    /// - Partition indices are consecutive starting from 0.
    /// - No empty partitions.
    /// - Each partition starts where the previous one ended, the first at 0.
    /// - The last partition ends at `total_units`.
    ///
    /// An empty plan is valid only when `total_units == 0`.
    pub fn validate(&self) -> Result<(), PlannerError> {
        let mut expected_start = 0;
        for (i, p) in self.partitions.iter().enumerate() {
            if p.index != i {
                return Err(PlannerError::invalid(
                    &self.strategy_name,
                    format!("expected partition index {i}, got {}", p.index),
                ));
            }
            if p.start >= p.end {
                return Err(PlannerError::invalid(
                    &self.strategy_name,
                    format!("partition {i} is empty ({}..{})", p.start, p.end),
                ));
            }
            if p.start != expected_start {
                return Err(PlannerError::invalid(
                    &self.strategy_name,
                    format!(
                        "partition {i} starts at {} but previous ended at {expected_start}",
                        p.start
                    ),
                ));
            }
            expected_start = p.end;
        }
        if expected_start != self.total_units {
            return Err(PlannerError::invalid(
                &self.strategy_name,
                format!(
                    "partitions cover {expected_start} of {} units",
                    self.total_units
                ),
            ));
        }
        Ok(())
    }

    /// Returns a human-readable summary of the plan.
    pub fn summary(&self) -> String {
        let lens: Vec<usize> = self.partitions.iter().map(Partition::len).collect();
        format!(
            "Plan '{}': {} partitions over {} units, max {} units/partition, sizes: {:?}",
            self.strategy_name,
            self.num_partitions(),
            self.total_units,
            self.max_partition_len(),
            lens,
        )
    }
}

/// Builder helper for constructing a `PartitionPlan` incrementally.
///
/// Used internally by strategy implementations.
pub(crate) struct PlanBuilder {
    strategy_name: String,
    total_units: usize,
    partitions: Vec<Partition>,
}

impl PlanBuilder {
    /// Creates a new builder.
    pub fn new(strategy_name: &str, total_units: usize) -> Self {
        Self {
            strategy_name: strategy_name.to_string(),
            total_units,
            partitions: Vec::new(),
        }
    }

    /// Appends `[start, end)` clamped to the total. Empty ranges are dropped.
    pub fn add_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.total_units);
        if start >= end {
            return;
        }
        let index = self.partitions.len();
        self.partitions.push(Partition { index, start, end });
    }

    /// Tiles the whole range with `stride`-sized partitions.
    pub fn tile(&mut self, stride: usize) {
        debug_assert!(stride > 0);
        let mut start = 0;
        while start < self.total_units {
            self.add_range(start, start.saturating_add(stride));
            start = start.saturating_add(stride);
        }
    }

    /// Consumes the builder and returns the finished plan.
    pub fn build(self) -> PartitionPlan {
        PartitionPlan {
            strategy_name: self.strategy_name,
            total_units: self.total_units,
            partitions: self.partitions,
        }
    }
}
