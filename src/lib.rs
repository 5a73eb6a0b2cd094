//! # hotswap-namespaces
//!
//! Namespace discovery with multi-endpoint failover and interest-filtered
//! change dispatch for distributed configuration clients.
//!
//! ## Overview
//!
//! A client application reads its settings from named *namespaces* held by a
//! remote configuration service. `hotswap-namespaces` covers the client side of
//! that arrangement:
//! - Discovering which namespaces exist for an application and cluster, trying
//!   each configuration-service endpoint in order until one answers
//! - Merging the discovered names with the statically declared ones
//! - Keeping a registry of listeners, each interested in some keys or key
//!   prefixes of some namespaces
//! - Delivering each change batch once to every interested listener, isolating
//!   listener failures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotswap_namespaces::prelude::*;
//!
//! # async fn example() -> hotswap_namespaces::error::Result<()> {
//! let client = NamespaceClient::builder()
//!     .with_app_id("100004458")
//!     .with_endpoints(["http://config-a:8080", "http://config-b:8080"])
//!     .build()?;
//!
//! // Static names plus whatever the service knows about.
//! let namespaces = client.refresh_namespaces().await;
//! println!("namespaces: {:?}", namespaces);
//!
//! // Only hear about database keys.
//! client
//!     .bind(
//!         &InterestDeclaration::new(|batch: &ChangeBatch| {
//!             for change in batch {
//!                 println!("{} is now {:?}", change.key, change.new_value);
//!             }
//!         })
//!         .with_key_prefixes(["db."]),
//!     )
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Endpoint failover**: Endpoints are tried in order with a per-attempt timeout
//! - **Graceful degradation**: Total discovery failure leaves the static namespaces in place
//! - **Interest filtering**: Listeners subscribe to exact keys, key prefixes, or everything
//! - **Ordered dispatch**: Batches for one namespace are delivered in submission order
//! - **Refresh events**: Republish every change as a broadcast "keys changed" notice
//!
//! ## Feature Flags
//!
//! - `http` (default): reqwest-backed fetcher for the configuration service
//! - `metrics`: OpenTelemetry metrics for discovery and dispatch
//!
//! ```toml
//! [dependencies]
//! hotswap-namespaces = { version = "0.1", features = ["metrics"] }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod discovery;
pub mod error;
pub mod model;
pub mod notify;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        ClientSettings, NamespaceClient, NamespaceClientBuilder, SettingsLoader, Validate,
    };
    pub use crate::discovery::{NamespaceSet, resolve};
    pub use crate::error::{ConfigError, Result, ValidationError};
    pub use crate::model::{ChangeBatch, ChangeRecord, ChangeType, NamespaceDescriptor};
    pub use crate::notify::{
        ChangeListener, DispatchReport, InterestDeclaration, InterestFilter, SubscriptionHandle,
    };
}
