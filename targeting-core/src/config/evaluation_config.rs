//! Evaluation scheduler settings.

use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_MS: u64 = 300_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
const DEFAULT_WORKERS: usize = 2;
const DEFAULT_BATCH_SIZE: usize = 500;

/// Settings for asynchronous evaluation: timeout, bounded retries with
/// backoff, worker pool size, and cursor batch size.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EvaluationConfig {
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub workers: Option<usize>,
    pub batch_size: Option<usize>,
}

impl EvaluationConfig {
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    pub fn retry_backoff_ms(&self) -> u64 {
        self.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS)
    }

    pub fn workers(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_WORKERS).max(1)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1)
    }
}
