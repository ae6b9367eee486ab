// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `qunpack decode`: unpack a raw tensor file.
//!
//! Inputs are headerless little-endian buffers described by `--from` and
//! `--shape`. With `--scale` the call is a symmetric dequantization; adding
//! `--zero-point` makes it asymmetric.

use super::{parse_dtype, parse_shape, PartitionFlags};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tensor_core::{DType, Shape, Tensor, TensorView};
use weight_codec::{unpack, unpack_asymmetric, unpack_scaled, UnpackOptions};

#[derive(Debug, clap::Args)]
pub struct DecodeArgs {
    /// Packed source file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Source element type (i4, u4, i8, u8).
    #[arg(long)]
    pub from: String,

    /// Destination element type.
    #[arg(long, default_value = "f16")]
    pub to: String,

    /// Source shape, comma-separated.
    #[arg(short, long)]
    pub shape: String,

    /// Scale file for dequantization.
    #[arg(long)]
    pub scale: Option<PathBuf>,

    /// Scale element type.
    #[arg(long, default_value = "f16")]
    pub scale_dtype: String,

    /// Scale shape; defaults to one scale per leading row.
    #[arg(long)]
    pub scale_shape: Option<String>,

    /// Zero-point file (requires `--scale`).
    #[arg(long, requires = "scale")]
    pub zero_point: Option<PathBuf>,

    /// Zero-point element type.
    #[arg(long, default_value = "u4")]
    pub zero_point_dtype: String,

    /// Zero-point shape; empty for a scalar.
    #[arg(long, default_value = "1")]
    pub zero_point_shape: String,

    /// Output file.
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub partitioning: PartitionFlags,
}

/// A read-only file mapping. Empty files are not mapped.
struct Input {
    path: PathBuf,
    map: Option<memmap2::Mmap>,
}

impl Input {
    fn open(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open '{}'", path.display()))?;
        let len = file.metadata()?.len();
        let map = if len == 0 {
            None
        } else {
            // SAFETY: the mapping is read-only and lives for the duration of
            // one decode call; the file is not expected to change under it.
            let map = unsafe { memmap2::Mmap::map(&file) }
                .with_context(|| format!("mmap failed for '{}'", path.display()))?;
            Some(map)
        };
        tracing::info!(
            "decode: mapped {} ({:.2} MB)",
            path.display(),
            len as f64 / (1024.0 * 1024.0),
        );
        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    fn view(&self, shape: Shape, dtype: DType) -> anyhow::Result<TensorView<'_>> {
        TensorView::new(shape, dtype, self.bytes())
            .with_context(|| format!("'{}' does not hold a {dtype} tensor", self.path.display()))
    }
}

pub fn execute(args: DecodeArgs, options: UnpackOptions) -> anyhow::Result<()> {
    let options = args.partitioning.apply(options);
    let from = parse_dtype(&args.from)?;
    let to = parse_dtype(&args.to)?;
    let shape = parse_shape(&args.shape)?;

    let input = Input::open(&args.input)?;
    let src = input.view(shape.clone(), from)?;
    let mut out = Tensor::zeros(shape.clone(), to);

    let started = Instant::now();
    let mode = match (&args.scale, &args.zero_point) {
        (None, _) => {
            unpack(&src, &mut out.view_mut(), &options)?;
            "widen"
        }
        (Some(scale_path), zero_point) => {
            let scale_shape = match &args.scale_shape {
                Some(s) => parse_shape(s)?,
                None => default_scale_shape(&shape),
            };
            let scale_file = Input::open(scale_path)?;
            let scale = scale_file.view(scale_shape, parse_dtype(&args.scale_dtype)?)?;
            match zero_point {
                None => {
                    unpack_scaled(&src, &scale, &mut out.view_mut(), &options)?;
                    "symmetric"
                }
                Some(zp_path) => {
                    let zp_file = Input::open(zp_path)?;
                    let zerop = zp_file.view(
                        parse_shape(&args.zero_point_shape)?,
                        parse_dtype(&args.zero_point_dtype)?,
                    )?;
                    unpack_asymmetric(&src, &zerop, &scale, &mut out.view_mut(), &options)?;
                    "asymmetric"
                }
            }
        }
    };
    let elapsed = started.elapsed();

    std::fs::write(&args.output, out.as_bytes())
        .with_context(|| format!("cannot write '{}'", args.output.display()))?;

    println!(
        "  {mode} {from}->{to} {shape}: {} elements in {:.3} ms -> {}",
        shape.num_elements(),
        elapsed.as_secs_f64() * 1e3,
        args.output.display(),
    );
    Ok(())
}

/// `[rows, 1]` for a data shape whose leading dimension is `rows`.
fn default_scale_shape(data: &Shape) -> Shape {
    Shape::matrix(data.dim(0).unwrap_or(1), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scale_shape() {
        assert_eq!(default_scale_shape(&Shape::cube(4, 8, 16)), Shape::matrix(4, 1));
        assert_eq!(default_scale_shape(&Shape::scalar()), Shape::matrix(1, 1));
    }
}
