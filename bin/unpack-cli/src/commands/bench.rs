// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `qunpack bench`: time every kernel across partition counts.
//!
//! Each partition count gets its own [`UnpackStats`] collector wired into a
//! fresh [`Codec`], so rows never mix settings.

use super::parse_count;
use anyhow::Context;
use std::sync::Arc;
use tensor_core::{DType, Shape, Tensor};
use weight_codec::{Codec, StatsRow, UnpackOptions, UnpackStats};

#[derive(Debug, clap::Args)]
pub struct BenchArgs {
    /// Elements per call (accepts K/M suffixes).
    #[arg(short, long, default_value = "4M")]
    pub elements: String,

    /// Comma-separated partition counts to sweep (0 = unpartitioned).
    #[arg(short = 'p', long, default_value = "0,4,16")]
    pub partitions: String,

    /// Calls per kernel and partition count.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub iterations: u32,

    /// Use exactly the requested partition counts.
    #[arg(long)]
    pub strict: bool,

    /// Run partitions on the rayon pool.
    #[arg(long)]
    pub parallel: bool,

    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, serde::Serialize)]
struct BenchRecord {
    partitions: usize,
    strict: bool,
    parallel: bool,
    #[serde(flatten)]
    row: StatsRow,
}

pub fn execute(args: BenchArgs, base: UnpackOptions) -> anyhow::Result<()> {
    let elements = parse_count(&args.elements)?;
    let counts = args
        .partitions
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<usize>()
                .with_context(|| format!("invalid partition count '{s}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let fixture = Fixture::new(elements);
    tracing::info!(elements = fixture.elements(), ?counts, "bench fixture ready");

    let mut records = Vec::new();
    for &count in &counts {
        let options = UnpackOptions {
            partition_count: Some(count),
            strict_partitioning: base.strict_partitioning || args.strict,
            use_parallel_execution: base.use_parallel_execution || args.parallel,
        };
        let stats = Arc::new(UnpackStats::new());
        let codec = Codec::new().with_observer(stats.clone());
        for _ in 0..args.iterations {
            fixture.run(&codec, &options)?;
        }
        tracing::debug!("{}", stats.summary());
        records.extend(stats.snapshot().into_iter().map(|row| BenchRecord {
            partitions: count,
            strict: options.strict_partitioning,
            parallel: options.use_parallel_execution,
            row,
        }));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!(
        "  {:<16} {:>6} {:>12} {:>10} {:>10}",
        "Kernel", "Parts", "Elements", "Avg ms", "ns/elem",
    );
    println!("  {}", "-".repeat(58));
    for r in &records {
        let avg = r.row.average.as_secs_f64();
        let per_elem = if r.row.work == 0 {
            0.0
        } else {
            avg * 1e9 / r.row.work as f64
        };
        println!(
            "  {:<16} {:>6} {:>12} {:>10.3} {:>10.3}",
            r.row.kernel,
            r.partitions,
            r.row.work,
            avg * 1e3,
            per_elem,
        );
    }
    Ok(())
}

/// Synthetic tensors for every kernel, shaped `[outer, 32, 128]`.
struct Fixture {
    i4: Tensor,
    u4: Tensor,
    i8: Tensor,
    u8: Tensor,
    group_scale: Tensor,
    group_zerop: Tensor,
    u8_zerop: Tensor,
    column_scale: Tensor,
    scalar_zerop: Tensor,
}

impl Fixture {
    const ROWS: usize = 32;
    const COLS: usize = 128;

    fn new(elements: usize) -> Self {
        let outer = (elements / (Self::ROWS * Self::COLS)).max(1);
        let data = Shape::cube(outer, Self::ROWS, Self::COLS);
        let groups = Shape::cube(outer, Self::ROWS, 1);
        Self {
            i4: Tensor::zeros(data.clone(), DType::I4),
            u4: Tensor::zeros(data.clone(), DType::U4),
            i8: Tensor::zeros(data.clone(), DType::I8),
            u8: Tensor::zeros(data, DType::U8),
            group_scale: Tensor::zeros(groups.clone(), DType::F16),
            group_zerop: Tensor::zeros(groups.clone(), DType::U4),
            u8_zerop: Tensor::zeros(groups, DType::U8),
            column_scale: Tensor::zeros(Shape::cube(outer, 1, Self::COLS), DType::F16),
            scalar_zerop: Tensor::zeros(Shape::vector(1), DType::U4),
        }
    }

    fn elements(&self) -> usize {
        self.i4.num_elements()
    }

    fn run(&self, codec: &Codec, options: &UnpackOptions) -> anyhow::Result<()> {
        let shape = self.i4.shape().clone();
        for (src, to) in [
            (&self.i4, DType::I8),
            (&self.i4, DType::F16),
            (&self.u4, DType::I8),
            (&self.u4, DType::F16),
            (&self.u4, DType::F32),
            (&self.i8, DType::F16),
        ] {
            let mut out = Tensor::zeros(shape.clone(), to);
            codec.unpack(&src.view(), &mut out.view_mut(), options)?;
        }

        let mut out = Tensor::zeros(shape, DType::F16);
        for src in [&self.i4, &self.i8] {
            codec.unpack_scaled(&src.view(), &self.group_scale.view(), &mut out.view_mut(), options)?;
        }
        for (src, zerop, scale) in [
            (&self.u4, &self.group_zerop, &self.group_scale),
            (&self.u8, &self.u8_zerop, &self.group_scale),
            (&self.u4, &self.scalar_zerop, &self.column_scale),
        ] {
            codec.unpack_asymmetric(
                &src.view(),
                &zerop.view(),
                &scale.view(),
                &mut out.view_mut(),
                options,
            )?;
        }
        Ok(())
    }
}
