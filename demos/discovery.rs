//! Example demonstrating namespace discovery and change dispatch.
//!
//! This example shows how to:
//! - Build a client from settings (file and environment)
//! - Discover namespaces, falling back to the static ones when the service is down
//! - Bind listeners with key and prefix interests
//! - Receive refresh events for every change
//!
//! Run with: NS_APP_ID=100004458 NS_CONFIG_SERVICE=http://localhost:8080 \
//!     cargo run --example discovery

use hotswap_namespaces::prelude::*;
use std::collections::HashMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hotswap_namespaces=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Namespace Discovery Example ===\n");

    let settings = SettingsLoader::new().with_env_overrides("NS", "__").load()?;
    println!("App {} in cluster {}", settings.app_id, settings.cluster);

    let client = NamespaceClient::builder().with_settings(settings).build()?;
    let mut refreshes = client.refresh_events();

    let namespaces = client.start().await;
    println!("Namespaces: {:?}\n", namespaces);

    client
        .bind(
            &InterestDeclaration::new(|batch: &ChangeBatch| {
                for change in batch {
                    println!(
                        "  [db] {} {} -> {:?}",
                        change.change_type, change.key, change.new_value
                    );
                }
            })
            .with_key_prefixes(["db."]),
        )
        .await;

    client
        .bind(
            &InterestDeclaration::new(|batch: &ChangeBatch| {
                if let Some(change) = batch.change("timeout") {
                    println!("  [timeout] now {:?}", change.new_value);
                }
            })
            .with_keys(["timeout"]),
        )
        .await;

    // Simulate a change pushed by the configuration service.
    let before = HashMap::from([
        ("db.url".to_string(), "postgres://a/app".to_string()),
        ("timeout".to_string(), "30".to_string()),
    ]);
    let after = HashMap::from([
        ("db.url".to_string(), "postgres://b/app".to_string()),
        ("timeout".to_string(), "60".to_string()),
        ("feature.beta".to_string(), "on".to_string()),
    ]);

    if let Some(batch) = ChangeBatch::diff("application", &before, &after) {
        println!("--- Dispatching {} changes ---", batch.len());
        let report = client.dispatch(&batch).await;
        println!(
            "Delivered: {}, skipped: {}, failed: {}\n",
            report.delivered,
            report.skipped,
            report.failures.len()
        );
    }

    if let Some(refreshes) = refreshes.as_mut() {
        while let Ok(event) = refreshes.try_recv() {
            println!("Refresh event for {}: {:?}", event.namespace, event.keys);
        }
    }

    Ok(())
}
