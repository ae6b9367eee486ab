// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Unpack timing hooks.
//!
//! A [`crate::Codec`] reports every completed call to its
//! [`UnpackObserver`]. The default observer discards everything;
//! [`UnpackStats`] aggregates calls by kernel and work size.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Receives one record per completed unpack call.
///
/// Called from the thread that issued the call, after all partitions
/// have finished.
pub trait UnpackObserver: Send + Sync {
    /// `kernel` names the conversion (`"i4->f16"`), `work` is the element count.
    fn record(&self, kernel: &'static str, work: usize, elapsed: Duration);
}

/// Observer that ignores every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl UnpackObserver for NoopObserver {
    fn record(&self, _kernel: &'static str, _work: usize, _elapsed: Duration) {}
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    calls: u64,
    total: Duration,
}

/// One aggregated row of [`UnpackStats`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StatsRow {
    /// Conversion name.
    pub kernel: &'static str,
    /// Elements per call.
    pub work: usize,
    /// Number of calls with this kernel and size.
    pub calls: u64,
    /// Summed wall-clock time.
    pub total: Duration,
    /// Mean wall-clock time per call.
    pub average: Duration,
}

/// Thread-safe collector keyed by `(kernel, work size)`.
#[derive(Debug, Default)]
pub struct UnpackStats {
    buckets: Mutex<BTreeMap<(&'static str, usize), Bucket>>,
}

impl UnpackStats {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all rows ordered by kernel then work size.
    pub fn snapshot(&self) -> Vec<StatsRow> {
        let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets
            .iter()
            .map(|(&(kernel, work), b)| StatsRow {
                kernel,
                work,
                calls: b.calls,
                total: b.total,
                average: if b.calls == 0 {
                    Duration::ZERO
                } else {
                    b.total / b.calls as u32
                },
            })
            .collect()
    }

    /// Total number of recorded calls.
    pub fn total_calls(&self) -> u64 {
        let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets.values().map(|b| b.calls).sum()
    }

    /// Drops every record.
    pub fn reset(&self) {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let rows = self.snapshot();
        let mut out = format!("Unpack stats: {} buckets, {} calls", rows.len(), self.total_calls());
        for r in &rows {
            let per_elem_ns = if r.work == 0 {
                0.0
            } else {
                r.average.as_secs_f64() * 1e9 / r.work as f64
            };
            let _ = write!(
                out,
                "\n  {:<14} {:>12} elems  {:>6} calls  avg {:.3}ms  ({:.3} ns/elem)",
                r.kernel,
                r.work,
                r.calls,
                r.average.as_secs_f64() * 1000.0,
                per_elem_ns,
            );
        }
        out
    }
}

impl UnpackObserver for UnpackStats {
    fn record(&self, kernel: &'static str, work: usize, elapsed: Duration) {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let b = buckets.entry((kernel, work)).or_default();
        b.calls += 1;
        b.total += elapsed;
    }
}
