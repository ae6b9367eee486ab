// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # qunpack
//!
//! Command-line interface for the packed-weight codec.
//!
//! ## Usage
//! ```bash
//! # Widen a raw i4 blob to f16
//! qunpack decode --input w.bin --from i4 --to f16 --shape 4096,4096 --output w.f16
//!
//! # Asymmetric u4 with per-group scales and packed zero points
//! qunpack decode --input w.bin --from u4 --shape 32,128,128 \
//!     --scale s.bin --scale-shape 32,128,1 \
//!     --zero-point z.bin --zero-point-dtype u4 --zero-point-shape 32,128,1 \
//!     --partitions 16 --parallel --output w.f16
//!
//! # Time every kernel under a few partition settings
//! qunpack bench --elements 16M --partitions 1,4,16
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "qunpack",
    about = "Unpack and dequantize 4-bit and 8-bit packed weight tensors",
    version,
    author
)]
struct Cli {
    /// Path to a TOML file with unpack options (CLI flags override it).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a raw packed tensor file into a wider type.
    Decode(commands::decode::DecodeArgs),

    /// Benchmark every kernel on synthetic data.
    Bench(commands::bench::BenchArgs),

    /// Print the effective unpack options as TOML.
    Config,

    /// List the supported conversions per mode.
    Catalogue,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);
    let options = commands::load_options(cli.config.as_deref())?;

    match cli.command {
        Commands::Decode(args) => commands::decode::execute(args, options),
        Commands::Bench(args) => commands::bench::execute(args, options),
        Commands::Config => commands::config::execute(&options),
        Commands::Catalogue => commands::config::catalogue(),
    }
}
