//! Prometheus metrics for client operations
//!
//! - `portfolio_client_requests_total` (counter) - operations by name, mode and result
//! - `portfolio_client_offline_submissions_total` (counter) - contact forms saved locally

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

use crate::error::Result;

/// Operation counters, shared by reference with the client
pub struct ClientMetrics {
    requests_total: IntCounterVec,
    offline_submissions_total: IntCounter,
}

impl ClientMetrics {
    /// Create the metrics and register them with `registry`
    pub fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                "portfolio_client_requests_total",
                "Client operations by operation, mode and result",
            ),
            &["operation", "mode", "result"],
        )?;
        let offline_submissions_total = IntCounter::with_opts(Opts::new(
            "portfolio_client_offline_submissions_total",
            "Contact submissions stored locally while offline",
        ))?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(offline_submissions_total.clone()))?;

        Ok(Self {
            requests_total,
            offline_submissions_total,
        })
    }

    pub fn record_request(&self, operation: &str, mode: &str, result: &str) {
        self.requests_total
            .with_label_values(&[operation, mode, result])
            .inc();
    }

    pub fn record_offline_submission(&self) {
        self.offline_submissions_total.inc();
    }

    /// Current count for one label combination
    pub fn requests(&self, operation: &str, mode: &str, result: &str) -> u64 {
        self.requests_total
            .with_label_values(&[operation, mode, result])
            .get()
    }

    pub fn offline_submissions(&self) -> u64 {
        self.offline_submissions_total.get()
    }
}
