// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runs a [`PartitionPlan`] over a destination buffer.
//!
//! The destination is split into one disjoint `&mut [u8]` per partition
//! before any work starts, so a partition can only ever write its own
//! range. Sources and side tensors are shared read-only.

use crate::{Partition, PartitionPlan, PlannerError};
use rayon::prelude::*;

/// Splits `dst` along the plan, `unit_bytes` destination bytes per unit.
///
/// # Errors
/// Returns [`PlannerError::InvalidPlan`] if the plan is malformed or does
/// not cover exactly `dst.len()` bytes.
pub fn split_partitions<'a>(
    plan: &PartitionPlan,
    dst: &'a mut [u8],
    unit_bytes: usize,
) -> Result<Vec<(Partition, &'a mut [u8])>, PlannerError> {
    plan.validate()?;
    let expected = plan.total_units.checked_mul(unit_bytes).ok_or_else(|| {
        PlannerError::invalid(&plan.strategy_name, "destination size overflows")
    })?;
    if expected != dst.len() {
        return Err(PlannerError::invalid(
            &plan.strategy_name,
            format!(
                "plan covers {expected} destination bytes, buffer has {}",
                dst.len()
            ),
        ));
    }

    let mut slices = Vec::with_capacity(plan.num_partitions());
    let mut rest = dst;
    for p in &plan.partitions {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(p.len() * unit_bytes);
        slices.push((*p, head));
        rest = tail;
    }
    Ok(slices)
}

/// Runs `body` once per partition with that partition's destination slice.
///
/// With `parallel` set the partitions are spread over the rayon pool;
/// otherwise they run in order on the calling thread. Since no partition
/// can see another's slice, both produce identical output.
pub fn execute_partitions<F>(
    plan: &PartitionPlan,
    dst: &mut [u8],
    unit_bytes: usize,
    parallel: bool,
    body: F,
) -> Result<(), PlannerError>
where
    F: Fn(&Partition, &mut [u8]) + Sync,
{
    let slices = split_partitions(plan, dst, unit_bytes)?;
    let run = |(p, out): (Partition, &mut [u8])| {
        tracing::trace!(
            strategy = %plan.strategy_name,
            index = p.index,
            start = p.start,
            end = p.end,
            "partition"
        );
        body(&p, out);
    };
    if parallel && slices.len() > 1 {
        slices.into_par_iter().for_each(run);
    } else {
        slices.into_iter().for_each(run);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementBlocks, PartitionStrategy, UnpackOptions};

    fn fill_with_index(parallel: bool) -> Vec<u8> {
        let opts = UnpackOptions::default().with_partitions(4).strict(true);
        let plan = ElementBlocks::new().plan(1000, &opts).unwrap();
        let mut dst = vec![0u8; 2000];
        execute_partitions(&plan, &mut dst, 2, parallel, |p, out| {
            for (i, pair) in out.chunks_exact_mut(2).enumerate() {
                let unit = (p.start + i) as u16;
                pair.copy_from_slice(&unit.to_le_bytes());
            }
        })
        .unwrap();
        dst
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let seq = fill_with_index(false);
        let par = fill_with_index(true);
        assert_eq!(seq, par);
        assert_eq!(u16::from_le_bytes([seq[1998], seq[1999]]), 999);
    }

    #[test]
    fn test_split_sizes() {
        let opts = UnpackOptions::default().with_partitions(3).strict(true);
        let plan = crate::Channels::new().plan(7, &opts).unwrap();
        let mut dst = vec![0u8; 7 * 10];
        let slices = split_partitions(&plan, &mut dst, 10).unwrap();
        let lens: Vec<usize> = slices.iter().map(|(_, s)| s.len()).collect();
        assert_eq!(lens, vec![30, 30, 10]);
    }

    #[test]
    fn test_buffer_mismatch_rejected() {
        let plan = ElementBlocks::new()
            .plan(10, &UnpackOptions::default())
            .unwrap();
        let mut dst = vec![0u8; 11];
        let err = execute_partitions(&plan, &mut dst, 1, false, |_, _| {}).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidPlan { .. }));
    }
}
