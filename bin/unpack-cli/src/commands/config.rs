// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `qunpack config` and `qunpack catalogue`.

use tensor_core::DType;
use weight_codec::{Codec, UnpackOptions};

/// Prints the effective options in the same TOML format `--config` reads.
pub fn execute(options: &UnpackOptions) -> anyhow::Result<()> {
    print!("{}", options.to_toml()?);
    Ok(())
}

/// Prints every supported `(from, to)` pair, grouped by mode.
pub fn catalogue() -> anyhow::Result<()> {
    let codec = Codec::global();
    println!("  widen:");
    for (from, to) in codec.conversions() {
        println!("    {from} -> {to}");
    }

    let sources = [DType::I4, DType::U4, DType::I8, DType::U8];
    println!("  symmetric (x * s):");
    for from in sources.iter().filter(|&&d| codec.supports_scaled(d, DType::F16)) {
        println!("    {from} -> f16");
    }
    println!("  asymmetric ((x - z) * s):");
    for from in sources
        .iter()
        .filter(|&&d| codec.supports_asymmetric(d, DType::F16))
    {
        println!("    {from} -> f16");
    }
    Ok(())
}
