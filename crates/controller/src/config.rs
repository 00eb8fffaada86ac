// SPDX-License-Identifier: MIT

//! Environment-driven configuration for the fleet controller.

use std::time::Duration;

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Knobs for the fleet controller, each overridable via environment variable
/// with a typed default.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Inclusive low end of the port range workers are allocated from.
    pub port_range_low: u16,
    /// Inclusive high end of the port range workers are allocated from.
    pub port_range_high: u16,
    /// How long `ensure_worker` waits for a spawned worker's `READY` line
    /// before treating the start as failed.
    pub readiness_timeout: Duration,
    /// How long `stop` waits for a graceful exit before sending a hard kill.
    pub shutdown_grace: Duration,
    /// Path to the worker binary to spawn.
    pub worker_bin: String,
    /// Host to embed in returned endpoint URLs.
    pub host: String,
    /// Scheme to embed in returned endpoint URLs ("ws" or "wss").
    pub scheme: String,
}

impl ControllerConfig {
    pub fn from_env() -> Self {
        Self {
            port_range_low: env_u16("SIGNRT_PORT_RANGE_LOW", 9001),
            port_range_high: env_u16("SIGNRT_PORT_RANGE_HIGH", 9100),
            readiness_timeout: Duration::from_millis(env_u64("SIGNRT_READY_TIMEOUT_MS", 10_000)),
            shutdown_grace: Duration::from_millis(env_u64("SIGNRT_SHUTDOWN_GRACE_MS", 3_000)),
            worker_bin: std::env::var("SIGNRT_WORKER_BIN")
                .unwrap_or_else(|_| "signrt-worker".to_string()),
            host: std::env::var("SIGNRT_WORKER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            scheme: std::env::var("SIGNRT_WORKER_SCHEME").unwrap_or_else(|_| "ws".to_string()),
        }
    }

    pub fn endpoint_url(&self, port: u16) -> String {
        format!("{}://{}:{}/ws", self.scheme, self.host, port)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_embeds_scheme_host_port() {
        let cfg = ControllerConfig {
            port_range_low: 9001,
            port_range_high: 9100,
            readiness_timeout: Duration::from_secs(1),
            shutdown_grace: Duration::from_secs(1),
            worker_bin: "signrt-worker".into(),
            host: "127.0.0.1".into(),
            scheme: "ws".into(),
        };
        assert_eq!(cfg.endpoint_url(9007), "ws://127.0.0.1:9007/ws");
    }
}
