//! Portfolio Client
//!
//! Client for the optional backend of the portfolio site. The backend may not
//! exist at all (static hosting), so the client probes for it once and then
//! routes every operation through either a live HTTP path or a local fallback.
//!
//! ## Architecture
//!
//! 1. **Probe** (`probe`): one bounded-time `GET /health`; any failure means
//!    offline. Never errors.
//! 2. **Client** (`client`): `PortfolioClient` is built with the probe result
//!    and consults it on every call.
//! 3. **Store** (`store`): offline contact submissions are appended to a
//!    JSON log kept under a single key.
//! 4. **Analytics** (`analytics`): best-effort event helpers and a
//!    fire-and-forget beacon.
//!
//! ## Example
//!
//! ```rust,no_run
//! use portfolio_client::{ClientConfig, ContactForm, FileStore, PortfolioClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), portfolio_client::ClientError> {
//!     let config = ClientConfig::from_env();
//!     let store = Arc::new(FileStore::new(config.data_dir.clone()));
//!     let client = PortfolioClient::connect(&config, store).await?;
//!
//!     let form = ContactForm::new("Ada", "ada@example.com", "Hello", "Nice work");
//!     let receipt = client.submit_contact(&form).await?;
//!     println!("{}", receipt.into_value());
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod client;
pub mod config;
pub mod contact;
pub mod error;
pub mod metrics;
pub mod probe;
pub mod store;

pub use analytics::{AnalyticsEvent, Beacon, BestEffort, PageSession};
pub use client::{ContactReceipt, Outcome, PortfolioClient, PortfolioData};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use contact::{is_valid_email, ContactForm, ContactSubmission};
pub use error::{ClientError, Result};
pub use metrics::ClientMetrics;
pub use probe::{probe, Availability};
pub use store::{FileStore, KeyValueStore, MemoryStore, SubmissionLog};

/// Client version (from Cargo.toml)
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
