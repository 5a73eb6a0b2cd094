//! Built-in metrics for discovery and dispatch.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Discovery attempts, failed attempts and attempt latency
//! - Discoveries that fell back to an empty result
//! - Dispatched batches, listener invocations and listener failures
//! - Active subscriptions
//!
//! # Examples
//!
//! ```rust,no_run
//! use hotswap_namespaces::prelude::*;
//! use hotswap_namespaces::metrics::ClientMetrics;
//! use opentelemetry::global;
//!
//! # fn example() -> Result<()> {
//! let metrics = ClientMetrics::new(global::meter("my-app"));
//!
//! let client = NamespaceClient::builder()
//!     .with_app_id("100004458")
//!     .with_endpoints(["http://config-service:8080"])
//!     .with_metrics(metrics)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod client_metrics;

pub use client_metrics::ClientMetrics;
