//! Analytics events and best-effort delivery
//!
//! Analytics are telemetry, not user-facing operations. The helpers here
//! return [`BestEffort`] so a failed delivery is visible in the type while
//! callers are free to ignore it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tokio::task::JoinHandle;

use crate::client::{Outcome, PortfolioClient};
use crate::error::{ClientError, Result};

pub const PAGE_VIEW: &str = "page_view";
pub const TIME_SPENT: &str = "time_spent";
pub const SKILLS_SECTION_VIEWED: &str = "skills_section_viewed";

/// One analytics event as posted to `/analytics`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub page: String,
    pub action: String,
    /// Seconds, 0 unless the action measures time
    #[serde(default)]
    pub duration: u64,
}

impl AnalyticsEvent {
    pub fn new(page: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            action: action.into(),
            duration: 0,
        }
    }

    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn page_view(page: impl Into<String>) -> Self {
        Self::new(page, PAGE_VIEW)
    }

    pub fn time_spent(page: impl Into<String>, seconds: u64) -> Self {
        Self::new(page, TIME_SPENT).with_duration(seconds)
    }

    pub fn project_click(page: impl Into<String>, title: &str) -> Self {
        Self::new(page, format!("project_click: {}", title))
    }

    pub fn skills_viewed(page: impl Into<String>) -> Self {
        Self::new(page, SKILLS_SECTION_VIEWED)
    }
}

/// Result of an operation whose failure the caller is allowed to drop
#[derive(Debug)]
pub enum BestEffort<T> {
    /// The backend accepted the request
    Delivered(T),
    /// Nothing was sent because the backend is unavailable
    Offline,
    /// Sending failed; the error is kept for logging only
    Dropped(ClientError),
}

impl<T> BestEffort<T> {
    pub fn is_delivered(&self) -> bool {
        matches!(self, BestEffort::Delivered(_))
    }

    pub fn delivered(self) -> Option<T> {
        match self {
            BestEffort::Delivered(value) => Some(value),
            _ => None,
        }
    }

    /// Collapse a routed result, logging a dropped failure under `operation`
    pub fn from_result(operation: &str, result: Result<Outcome<T>>) -> Self {
        match result {
            Ok(Outcome::Live(value)) => BestEffort::Delivered(value),
            Ok(Outcome::Offline) => BestEffort::Offline,
            Err(e) => {
                tracing::warn!(operation, error = %e, "best-effort request dropped");
                BestEffort::Dropped(e)
            }
        }
    }
}

impl PortfolioClient {
    /// Report a page view
    pub async fn track_page_view(&self, page: &str) -> BestEffort<Value> {
        self.track_best_effort(AnalyticsEvent::page_view(page)).await
    }

    /// Report a user action on `page`
    pub async fn track_action(&self, page: &str, action: &str) -> BestEffort<Value> {
        self.track_best_effort(AnalyticsEvent::new(page, action)).await
    }

    /// Report seconds spent on `page`
    pub async fn track_time_spent(&self, page: &str, seconds: u64) -> BestEffort<Value> {
        self.track_best_effort(AnalyticsEvent::time_spent(page, seconds))
            .await
    }

    /// Report a click on a project card
    pub async fn track_project_click(&self, page: &str, title: &str) -> BestEffort<Value> {
        self.track_best_effort(AnalyticsEvent::project_click(page, title))
            .await
    }

    /// Report that the skills section scrolled into view
    pub async fn track_skills_viewed(&self, page: &str) -> BestEffort<Value> {
        self.track_best_effort(AnalyticsEvent::skills_viewed(page))
            .await
    }

    async fn track_best_effort(&self, event: AnalyticsEvent) -> BestEffort<Value> {
        BestEffort::from_result("analytics", self.track_event(&event).await)
    }

    /// Fire-and-forget sender for events that must outlive the caller
    pub fn beacon(&self) -> Beacon {
        Beacon {
            http: self.http().clone(),
            url: format!("{}/analytics", self.api_base()),
            enabled: self.is_enabled(),
        }
    }
}

/// Sends analytics from a detached task.
///
/// Delivery is not confirmed and nothing is retried. Sending is a no-op when
/// the backend is unavailable.
#[derive(Debug, Clone)]
pub struct Beacon {
    http: reqwest::Client,
    url: String,
    enabled: bool,
}

impl Beacon {
    /// Queue `event` for delivery.
    ///
    /// Returns the task handle so a process about to exit can give it a
    /// moment to finish; dropping the handle does not cancel the send.
    pub fn send(&self, event: AnalyticsEvent) -> Option<JoinHandle<()>> {
        if !self.enabled {
            return None;
        }

        let http = self.http.clone();
        let url = self.url.clone();
        Some(tokio::spawn(async move {
            match http.post(&url).json(&event).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(action = %event.action, "beacon delivered");
                }
                Ok(response) => {
                    tracing::debug!(action = %event.action, status = %response.status(), "beacon rejected");
                }
                Err(e) => {
                    tracing::debug!(action = %event.action, error = %e, "beacon failed");
                }
            }
        }))
    }
}

/// Measures time on a page for the `time_spent` event
#[derive(Debug, Clone)]
pub struct PageSession {
    page: String,
    started: Instant,
}

impl PageSession {
    pub fn start(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            started: Instant::now(),
        }
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    /// Whole seconds since the session started
    pub fn elapsed_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// End the session, producing its `time_spent` event
    pub fn finish(self) -> AnalyticsEvent {
        let seconds = self.elapsed_secs();
        AnalyticsEvent::time_spent(self.page, seconds)
    }

    /// End the session and hand the event to `beacon`
    pub fn finish_with(self, beacon: &Beacon) -> Option<JoinHandle<()>> {
        beacon.send(self.finish())
    }
}
