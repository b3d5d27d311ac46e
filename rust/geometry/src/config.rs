// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Evaluation settings shared by line and point resolution.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for geometry evaluation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvaluationConfig {
    /// Clamp out-of-range parameters to the line ends instead of extrapolating.
    /// Applied to every line produced by line-array resolution.
    pub bounded_lines: bool,
    /// Below this angle (radians) a minimum-curvature arc is treated as straight
    pub parameter_tolerance: f64,
    /// Point counts at or above which materialization runs in parallel
    pub parallel_threshold: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            bounded_lines: false,
            parameter_tolerance: 1e-12,
            parallel_threshold: 4096,
        }
    }
}

impl EvaluationConfig {
    /// Load configuration from environment variables, keeping defaults for
    /// anything absent or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bounded_lines: std::env::var("RESQML_BOUNDED_LINES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bounded_lines),
            parameter_tolerance: std::env::var("RESQML_PARAMETER_TOLERANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|t: &f64| t.is_finite() && *t >= 0.0)
                .unwrap_or(defaults.parameter_tolerance),
            parallel_threshold: std::env::var("RESQML_PARALLEL_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.parallel_threshold),
        }
    }

    pub fn with_bounded_lines(mut self, bounded: bool) -> Self {
        self.bounded_lines = bounded;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EvaluationConfig::default();
        assert!(!config.bounded_lines);
        assert_eq!(config.parallel_threshold, 4096);
        assert!(config.with_bounded_lines(true).bounded_lines);
    }

    #[test]
    fn test_from_env_without_variables_is_default() {
        // Variables are not set by the test harness.
        if std::env::var_os("RESQML_BOUNDED_LINES").is_none()
            && std::env::var_os("RESQML_PARAMETER_TOLERANCE").is_none()
            && std::env::var_os("RESQML_PARALLEL_THRESHOLD").is_none()
        {
            assert_eq!(EvaluationConfig::from_env(), EvaluationConfig::default());
        }
    }
}
