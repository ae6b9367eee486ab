// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the partition planner.

use tensor_core::ErrorKind;

/// Errors that can occur during partition planning and execution.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// A plan does not tile its work range, or does not fit the buffer it
    /// is asked to split.
    #[error("strategy '{strategy}' produced an invalid plan: {detail}")]
    InvalidPlan { strategy: String, detail: String },

    /// Unpack options could not be read or written.
    #[error("config error: {0}")]
    Config(String),
}

impl PlannerError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvariantViolation
    }

    pub(crate) fn invalid(strategy: &str, detail: impl Into<String>) -> Self {
        PlannerError::InvalidPlan {
            strategy: strategy.to_string(),
            detail: detail.into(),
        }
    }
}
