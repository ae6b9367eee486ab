// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and the argument parsing they share.

pub mod bench;
pub mod config;
pub mod decode;

use anyhow::Context;
use std::path::Path;
use tensor_core::{DType, Shape};
use weight_codec::UnpackOptions;

/// Sets up the `tracing` subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads options from `path`, or returns the defaults.
pub fn load_options(path: Option<&Path>) -> anyhow::Result<UnpackOptions> {
    match path {
        Some(p) => {
            let options = UnpackOptions::from_file(p)?;
            tracing::info!(path = %p.display(), ?options, "loaded unpack options");
            Ok(options)
        }
        None => Ok(UnpackOptions::default()),
    }
}

/// Partitioning flags shared by `decode` and `bench`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PartitionFlags {
    /// Number of partitions (0 disables partitioning).
    #[arg(short = 'p', long)]
    pub partitions: Option<usize>,

    /// Use exactly the requested partition count.
    #[arg(long)]
    pub strict: bool,

    /// Run partitions on the rayon pool.
    #[arg(long)]
    pub parallel: bool,
}

impl PartitionFlags {
    /// Overlays the flags that were given on `options`.
    pub fn apply(&self, mut options: UnpackOptions) -> UnpackOptions {
        if let Some(n) = self.partitions {
            options.partition_count = Some(n);
        }
        options.strict_partitioning |= self.strict;
        options.use_parallel_execution |= self.parallel;
        options
    }
}

/// Parses `"32,128,1"` into a shape. An empty string is a scalar.
pub fn parse_shape(text: &str) -> anyhow::Result<Shape> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Shape::scalar());
    }
    let dims = text
        .split(',')
        .map(|d| {
            d.trim()
                .parse::<usize>()
                .with_context(|| format!("invalid dimension '{d}' in shape '{text}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Shape::new(dims))
}

/// Parses a dtype label such as `"u4"` or `"f16"`.
pub fn parse_dtype(text: &str) -> anyhow::Result<DType> {
    DType::parse(text.trim()).ok_or_else(|| anyhow::anyhow!("unknown element type '{text}'"))
}

/// Parses an element count with an optional `K`/`M` suffix (powers of 1024).
pub fn parse_count(text: &str) -> anyhow::Result<usize> {
    let text = text.trim();
    let (digits, mult) = match text.chars().last() {
        Some('K' | 'k') => (&text[..text.len() - 1], 1usize << 10),
        Some('M' | 'm') => (&text[..text.len() - 1], 1usize << 20),
        _ => (text, 1),
    };
    let n: usize = digits
        .parse()
        .with_context(|| format!("invalid element count '{text}'"))?;
    n.checked_mul(mult)
        .ok_or_else(|| anyhow::anyhow!("element count '{text}' overflows"))
}
