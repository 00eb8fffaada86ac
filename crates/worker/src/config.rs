// SPDX-License-Identifier: MIT

//! Worker-side runtime configuration. Sequence length, feature dimension, and
//! labels come from the model descriptor; the knobs here govern cadence and
//! lifecycle and are overridable per deployment via environment variables.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub prediction_interval: u64,
    pub smoothing_window: usize,
    pub idle_timeout: Duration,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self {
            prediction_interval: env_u64("SIGNRT_PREDICTION_INTERVAL", 5),
            smoothing_window: env_usize("SIGNRT_SMOOTHING_WINDOW", 6),
            idle_timeout: Duration::from_millis(env_u64("SIGNRT_IDLE_TIMEOUT_MS", 5 * 60 * 1000)),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { prediction_interval: 5, smoothing_window: 6, idle_timeout: Duration::from_secs(300) }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = WorkerConfig::default();
        assert!(config.prediction_interval > 0);
        assert!(config.smoothing_window > 0);
        assert!(config.idle_timeout > Duration::ZERO);
    }
}
