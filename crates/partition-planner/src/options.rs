// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Unpack options loaded from TOML or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! partition_count = 16
//! strict_partitioning = false
//! use_parallel_execution = true
//! ```

use crate::PlannerError;
use std::path::Path;

/// How a single unpack call splits and schedules its work.
///
/// Constructed per call and never mutated by the engine.
///
/// The default is a single job on the calling thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct UnpackOptions {
    /// Target number of partitions. `None` or `Some(0)` runs one job.
    pub partition_count: Option<usize>,
    /// Use `partition_count` verbatim instead of as an upper bound.
    pub strict_partitioning: bool,
    /// Run partitions on the rayon pool rather than in order on the caller.
    pub use_parallel_execution: bool,
}

impl UnpackOptions {
    /// Sets the partition target.
    pub fn with_partitions(mut self, count: usize) -> Self {
        self.partition_count = Some(count);
        self
    }

    /// Sets strict partitioning.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_partitioning = strict;
        self
    }

    /// Enables or disables parallel execution.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.use_parallel_execution = parallel;
        self
    }

    /// Returns the effective partition target, treating zero as absent.
    pub fn partitions(&self) -> Option<usize> {
        self.partition_count.filter(|&n| n > 0)
    }

    /// Loads options from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, PlannerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlannerError::Config(format!("cannot read options '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses options from a TOML string. Missing keys take their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, PlannerError> {
        toml::from_str(toml_str).map_err(|e| PlannerError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises options to TOML.
    pub fn to_toml(&self) -> Result<String, PlannerError> {
        toml::to_string_pretty(self)
            .map_err(|e| PlannerError::Config(format!("TOML serialise error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let o = UnpackOptions::default();
        assert_eq!(o.partitions(), None);
        assert!(!o.strict_partitioning);
        assert!(!o.use_parallel_execution);
    }

    #[test]
    fn test_zero_means_unpartitioned() {
        assert_eq!(UnpackOptions::default().with_partitions(0).partitions(), None);
        assert_eq!(UnpackOptions::default().with_partitions(3).partitions(), Some(3));
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
partition_count = 4
strict_partitioning = true
"#;
        let o = UnpackOptions::from_toml(toml).unwrap();
        assert_eq!(o.partitions(), Some(4));
        assert!(o.strict_partitioning);
        // Missing key falls back to the default.
        assert!(!o.use_parallel_execution);
    }

    #[test]
    fn test_toml_roundtrip() {
        let o = UnpackOptions::default().with_partitions(8).parallel(true);
        let s = o.to_toml().unwrap();
        assert_eq!(UnpackOptions::from_toml(&s).unwrap(), o);

        let o = UnpackOptions::default();
        assert_eq!(UnpackOptions::from_toml(&o.to_toml().unwrap()).unwrap(), o);
    }

    #[test]
    fn test_bad_toml() {
        let err = UnpackOptions::from_toml("partition_count = \"many\"").unwrap_err();
        assert!(matches!(err, PlannerError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = UnpackOptions::from_file(Path::new("/nonexistent/unpack.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read options"));
    }
}
