#![allow(clippy::doc_markdown)] // Allow technical terms like PromQL, LDAP in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # BigDataOps Client
//!
//! Resilient client library for the BigDataOps admin platform: alert management,
//! LDAP account administration, and cluster monitoring over a big-data stack
//! (HDFS, Hive, ZooKeeper, Azkaban).
//!
//! ## Overview
//!
//! Every backend call flows through a single [`ApiGateway`] that attaches the
//! session token, unwraps the platform's `{code, msg, data}` response envelope,
//! and maps every way a call can fail onto one structured [`ApiError`] with a
//! machine-readable [`ErrorKind`]. A backend that is *reachable but complaining*
//! surfaces user-facing notices; a backend that is *unreachable* stays quiet at
//! the gateway and is reported by the [`HealthMonitor`], a background probe loop
//! that announces recovery exactly once per outage.
//!
//! ## Key Behaviors
//!
//! - **Uniform errors**: callers branch on [`ErrorKind`], never on message text
//! - **Session lifecycle**: a 401 from any endpoint clears the whole session
//!   atomically and emits [`ClientEvent::SessionExpired`] for forced re-login
//! - **Quiet transport failures**: connection errors and timeouts produce no
//!   notices; offline/online transitions are the monitor's to announce
//! - **Optimistic liveness**: the monitor starts out assuming the backend is
//!   healthy and corrects itself on the first probe
//!
//! ## Module Organization
//!
//! - [`gateway`] - The request chokepoint: auth injection, envelope decoding,
//!   failure classification
//! - [`health`] - Background liveness monitor with start/stop lifecycle
//! - [`session`] - Token/username/profile storage with optional file persistence
//! - [`events`] - Broadcast channel for user notices and session-expiry signals
//! - [`services`] - Typed wrappers for the alert, auth, LDAP, and cluster APIs
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bigdataops_client::{ApiGateway, ClientConfig, HealthMonitor, Notifier, SessionStore};
//! use bigdataops_client::services::{AlertService, RuleListQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load()?;
//! let session = SessionStore::in_memory();
//! let notifier = Notifier::new();
//!
//! let gateway = ApiGateway::new(&config, session, notifier.clone())?;
//! let monitor = HealthMonitor::new(&config, notifier)?;
//! monitor.start();
//!
//! let alerts = AlertService::new(gateway);
//! let rules = alerts.rules(&RuleListQuery::default()).await?;
//! println!("{} alert rules configured", rules.total);
//!
//! monitor.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod health;
pub mod services;
pub mod session;

pub use config::{ApiEndpointConfig, ClientConfig, HealthCheckConfig};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use events::{ClientEvent, Notice, NoticeLevel, Notifier};
pub use gateway::{ApiEnvelope, ApiGateway, SUCCESS_CODE};
pub use health::{HealthMonitor, HealthState};
pub use session::{Session, SessionStore};
