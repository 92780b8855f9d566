// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution configuration

use crate::exec::{ExecutionError, ExecutionResult};
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ExecutionConfig::num_threads`]
pub const ENV_NUM_THREADS: &str = "VEXEC_NUM_THREADS";
/// Environment variable overriding [`ExecutionConfig::enable_zone_map`]
pub const ENV_ENABLE_ZONE_MAP: &str = "VEXEC_ENABLE_ZONE_MAP";

/// Default number of rows per node group of the in-memory tables
pub const DEFAULT_NODE_GROUP_SIZE: usize = 2048 * 64;

/// Query execution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Number of worker threads running copies of a pipeline
    pub num_threads: usize,

    /// Skip node groups whose statistics rule out the scan predicates
    pub enable_zone_map: bool,

    /// Apply semi-masks published by a prior build pipeline
    pub enable_semi_mask: bool,

    /// Rows per node group for tables created with this configuration
    pub node_group_size: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            num_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            enable_zone_map: true,
            enable_semi_mask: true,
            node_group_size: DEFAULT_NODE_GROUP_SIZE,
        }
    }
}

impl ExecutionConfig {
    /// Configuration running every pipeline on a single worker
    pub fn single_threaded() -> Self {
        Self {
            num_threads: 1,
            ..Self::default()
        }
    }

    /// Configuration with small node groups, handy for exercising morsel
    /// distribution on little data
    pub fn small_node_groups(node_group_size: usize) -> Self {
        Self {
            node_group_size,
            ..Self::default()
        }
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> ExecutionResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ExecutionError::ConfigError(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `VEXEC_*` environment overrides
    pub fn with_env_overrides(mut self) -> ExecutionResult<Self> {
        if let Ok(value) = std::env::var(ENV_NUM_THREADS) {
            self.num_threads = value.trim().parse().map_err(|_| {
                ExecutionError::ConfigError(format!(
                    "{} must be a number, got '{}'",
                    ENV_NUM_THREADS, value
                ))
            })?;
        }
        if let Ok(value) = std::env::var(ENV_ENABLE_ZONE_MAP) {
            self.enable_zone_map = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => true,
                "0" | "false" | "off" => false,
                _ => {
                    return Err(ExecutionError::ConfigError(format!(
                        "{} must be a boolean, got '{}'",
                        ENV_ENABLE_ZONE_MAP, value
                    )))
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ExecutionResult<()> {
        if self.num_threads == 0 {
            return Err(ExecutionError::ConfigError(
                "num_threads must be > 0".to_string(),
            ));
        }
        if self.node_group_size == 0 {
            return Err(ExecutionError::ConfigError(
                "node_group_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
