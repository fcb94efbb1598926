// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the worker count.
pub const WORKERS_ENV: &str = "MQPOOL_WORKERS";

const FALLBACK_WORKERS: usize = 4;

/// Settings for a [`FixedThreadPool`](crate::FixedThreadPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PoolConfig {
    /// Number of persistent worker threads.
    pub worker_count: usize,
    /// Worker threads are named `<prefix>-<n>`.
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(FALLBACK_WORKERS),
            thread_name_prefix: "mqpool-worker".to_string(),
        }
    }
}

impl PoolConfig {
    pub fn with_workers(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Self::default()
        }
    }

    /// Parses a JSON document, e.g. `{"worker-count": 8}`. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid pool configuration JSON")
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("could not read pool configuration {}", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("could not parse pool configuration {}", path.display()))
    }

    /// Defaults, with the worker count taken from `MQPOOL_WORKERS` when set.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_env_value(std::env::var(WORKERS_ENV).ok())
    }

    /// Like [`from_env`](Self::from_env), with the value of `MQPOOL_WORKERS`
    /// passed in. `None` means unset.
    pub fn from_env_value(workers: Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(value) = workers {
            config.worker_count = value
                .trim()
                .parse()
                .with_context(|| format!("{WORKERS_ENV} must be a number, got {value:?}"))?;
        }
        Ok(config)
    }
}
