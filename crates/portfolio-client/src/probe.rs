//! Backend availability probe
//!
//! A single bounded-time `GET <api_base>/health`. Every failure (timeout,
//! connection error, non-2xx status) reads as "unavailable"; the probe never
//! returns an error.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Whether the backend answered the probe.
///
/// Fixed for the lifetime of the client it is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    enabled: bool,
}

impl Availability {
    /// Backend reachable, operations go over the network
    pub const fn online() -> Self {
        Self { enabled: true }
    }

    /// Backend unreachable, operations use local fallbacks
    pub const fn offline() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Label used in logs and metrics
    pub fn mode(&self) -> &'static str {
        if self.enabled {
            "online"
        } else {
            "offline"
        }
    }

    /// Probe the backend and record the result
    pub async fn probe(http: &reqwest::Client, api_base: &str, limit: Duration) -> Self {
        if probe(http, api_base, limit).await {
            Self::online()
        } else {
            Self::offline()
        }
    }
}

impl From<bool> for Availability {
    fn from(enabled: bool) -> Self {
        Self { enabled }
    }
}

/// Check `<api_base>/health` answers with a 2xx status within `limit`.
///
/// The in-flight request is dropped when `limit` elapses.
pub async fn probe(http: &reqwest::Client, api_base: &str, limit: Duration) -> bool {
    let url = format!("{}/health", api_base.trim_end_matches('/'));
    let start = Instant::now();

    let available = match timeout(limit, http.get(&url).send()).await {
        Ok(Ok(response)) if response.status().is_success() => true,
        Ok(Ok(response)) => {
            tracing::debug!(url = %url, status = %response.status(), "health check returned non-success status");
            false
        }
        Ok(Err(e)) => {
            tracing::debug!(url = %url, error = %e, "health check request failed");
            false
        }
        Err(_) => {
            tracing::debug!(url = %url, timeout_ms = limit.as_millis() as u64, "health check timed out");
            false
        }
    };

    let latency_ms = start.elapsed().as_millis() as u64;
    if available {
        tracing::info!(url = %url, latency_ms, "backend is available");
    } else {
        tracing::warn!(url = %url, latency_ms, "backend unavailable, running in offline mode");
    }
    available
}
