//! Dual-mode portfolio client
//!
//! Every operation checks the [`Availability`] the client was built with.
//! Online, it sends the request and validates the response. Offline, it
//! answers locally: contact submissions go to the [`SubmissionLog`], every
//! other operation reports [`Outcome::Offline`] without doing any I/O.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::analytics::{AnalyticsEvent, BestEffort};
use crate::config::ClientConfig;
use crate::contact::{ContactForm, ContactSubmission};
use crate::error::{ClientError, Result};
use crate::metrics::ClientMetrics;
use crate::probe::Availability;
use crate::store::{KeyValueStore, SubmissionLog};

/// Result of a routed operation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The backend answered
    Live(T),
    /// Nothing was sent because the backend is unavailable
    Offline,
}

impl<T> Outcome<T> {
    pub fn is_offline(&self) -> bool {
        matches!(self, Outcome::Offline)
    }

    pub fn live(self) -> Option<T> {
        match self {
            Outcome::Live(value) => Some(value),
            Outcome::Offline => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Live(value) => Outcome::Live(f(value)),
            Outcome::Offline => Outcome::Offline,
        }
    }
}

impl Outcome<Value> {
    /// Response body, or `{"status":"offline"}`
    pub fn into_value(self) -> Value {
        match self {
            Outcome::Live(value) => value,
            Outcome::Offline => json!({ "status": "offline" }),
        }
    }
}

impl Outcome<PortfolioData> {
    /// Response body, or `{"status":"offline","data":null}`
    pub fn into_value(self) -> Value {
        match self {
            Outcome::Live(data) => data.into_body(),
            Outcome::Offline => json!({ "status": "offline", "data": null }),
        }
    }
}

/// Result of a contact submission
#[derive(Debug, Clone, PartialEq)]
pub enum ContactReceipt {
    /// Accepted by the backend, carrying its response body
    Delivered(Value),
    /// Stored in the local log; `entries` is the log length afterwards
    SavedOffline { entries: usize },
}

impl ContactReceipt {
    pub const SAVED_OFFLINE_MESSAGE: &'static str = "Saved locally (offline mode)";

    pub fn is_saved_offline(&self) -> bool {
        matches!(self, ContactReceipt::SavedOffline { .. })
    }

    pub fn into_value(self) -> Value {
        match self {
            ContactReceipt::Delivered(body) => body,
            ContactReceipt::SavedOffline { .. } => json!({
                "status": "saved_offline",
                "message": Self::SAVED_OFFLINE_MESSAGE,
            }),
        }
    }
}

/// Body returned by `GET /portfolio`
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioData {
    body: Value,
}

impl PortfolioData {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// The `data` field, when present and not null
    pub fn data(&self) -> Option<&Value> {
        self.body.get("data").filter(|d| !d.is_null())
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}

/// Client for the portfolio backend with offline fallbacks
pub struct PortfolioClient {
    http: Client,
    api_base: String,
    availability: Availability,
    submissions: SubmissionLog,
    metrics: Option<Arc<ClientMetrics>>,
}

impl std::fmt::Debug for PortfolioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioClient")
            .field("api_base", &self.api_base)
            .field("availability", &self.availability)
            .finish_non_exhaustive()
    }
}

impl PortfolioClient {
    /// Create a client with a known availability
    pub fn new(
        config: &ClientConfig,
        availability: Availability,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        config.validate()?;
        let http = build_http(config)?;
        Ok(Self::with_http(config, http, availability, store))
    }

    /// Probe the backend, then create a client for the detected mode
    pub async fn connect(config: &ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        config.validate()?;
        let http = build_http(config)?;
        let availability =
            Availability::probe(&http, &config.api_base(), config.probe_timeout()).await;
        Ok(Self::with_http(config, http, availability, store))
    }

    /// Probe, then report a page view for `page` when the backend is up
    pub async fn start(
        config: &ClientConfig,
        store: Arc<dyn KeyValueStore>,
        page: &str,
    ) -> Result<Self> {
        let client = Self::connect(config, store).await?;
        if client.is_enabled() {
            let _ = client.track_page_view(page).await;
        }
        Ok(client)
    }

    fn with_http(
        config: &ClientConfig,
        http: Client,
        availability: Availability,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            http,
            api_base: config.api_base(),
            availability,
            submissions: SubmissionLog::new(store, config.storage_key.clone()),
            metrics: None,
        }
    }

    /// Count operations in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn is_enabled(&self) -> bool {
        self.availability.is_enabled()
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// The offline submission log
    pub fn submissions(&self) -> &SubmissionLog {
        &self.submissions
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Send a JSON request to `<api_base><endpoint>` and return the parsed body.
    ///
    /// Fails with [`ClientError::Offline`] when the backend is disabled.
    pub async fn request<B>(&self, method: Method, endpoint: &str, body: Option<&B>) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        if !self.is_enabled() {
            return Err(ClientError::Offline);
        }

        let url = format!("{}{}", self.api_base, endpoint);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::debug!(method = %method, url = %url, error = %e, "request failed");
            ClientError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let parsed: Option<Value> = if text.trim().is_empty() {
            Some(Value::Null)
        } else {
            serde_json::from_str(&text).ok()
        };

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .and_then(|body| body.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string);
            tracing::debug!(method = %method, url = %url, status = status.as_u16(), "server reported failure");
            return Err(ClientError::api(status.as_u16(), message));
        }

        parsed.ok_or_else(|| {
            ClientError::Parse(format!("{} {} returned a non-JSON body", method, url))
        })
    }

    /// Backend health status
    pub async fn health_check(&self) -> Result<Outcome<Value>> {
        if !self.is_enabled() {
            self.record("health", "offline");
            return Ok(Outcome::Offline);
        }
        let result = self.request::<()>(Method::GET, "/health", None).await;
        self.record_result("health", &result);
        result.map(Outcome::Live)
    }

    /// Submit a contact form.
    ///
    /// The form is validated first in both modes. Offline, it is appended to
    /// the local log and [`ContactReceipt::SavedOffline`] is returned.
    pub async fn submit_contact(&self, form: &ContactForm) -> Result<ContactReceipt> {
        if let Err(e) = form.validate() {
            self.record("contact", "invalid");
            return Err(e);
        }

        if !self.is_enabled() {
            let submission = ContactSubmission::from_form(form.clone());
            return match self.submissions.append(submission) {
                Ok(entries) => {
                    self.record("contact", "saved_offline");
                    if let Some(metrics) = &self.metrics {
                        metrics.record_offline_submission();
                    }
                    tracing::info!(entries, "contact submission saved locally");
                    Ok(ContactReceipt::SavedOffline { entries })
                }
                Err(e) => {
                    self.record("contact", "error");
                    tracing::error!(error = %e, "contact submission could not be saved");
                    Err(e)
                }
            };
        }

        let result = self.request(Method::POST, "/contact", Some(form)).await;
        self.record_result("contact", &result);
        result.map(ContactReceipt::Delivered)
    }

    /// Portfolio content from the backend
    pub async fn get_portfolio_data(&self) -> Result<Outcome<PortfolioData>> {
        if !self.is_enabled() {
            self.record("portfolio", "offline");
            return Ok(Outcome::Offline);
        }
        let result = self.request::<()>(Method::GET, "/portfolio", None).await;
        self.record_result("portfolio", &result);
        result.map(|body| Outcome::Live(PortfolioData::new(body)))
    }

    /// Portfolio content, with failures logged and dropped
    pub async fn load_portfolio(&self) -> BestEffort<PortfolioData> {
        BestEffort::from_result("portfolio", self.get_portfolio_data().await)
    }

    /// Post one analytics event
    pub async fn track_event(&self, event: &AnalyticsEvent) -> Result<Outcome<Value>> {
        if !self.is_enabled() {
            self.record("analytics", "offline");
            return Ok(Outcome::Offline);
        }
        let result = self.request(Method::POST, "/analytics", Some(event)).await;
        self.record_result("analytics", &result);
        result.map(Outcome::Live)
    }

    fn record(&self, operation: &str, result: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_request(operation, self.availability.mode(), result);
        }
    }

    fn record_result<T>(&self, operation: &str, result: &Result<T>) {
        self.record(operation, if result.is_ok() { "ok" } else { "error" });
    }
}

fn build_http(config: &ClientConfig) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| ClientError::config(format!("failed to create HTTP client: {}", e)))
}
