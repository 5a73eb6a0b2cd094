//! Shared utilities for integration tests.

use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// How a mock configuration service answers namespace queries.
#[derive(Clone, Copy)]
#[allow(dead_code)]
pub enum Behavior {
    /// 200 with a JSON namespace list for the requested app and cluster
    Namespaces(&'static [&'static str]),
    /// The given status with an empty body
    Status(u16),
    /// 200 with a body that is not a namespace list
    Garbage,
    /// Answer after the delay
    Slow(Duration, &'static [&'static str]),
}

fn namespace_list(app_id: &str, cluster: &str, names: &[&str]) -> String {
    let items: Vec<serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            serde_json::json!({
                "id": i + 1,
                "appId": app_id,
                "clusterName": cluster,
                "namespaceName": name,
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// Start a mock configuration service on an ephemeral port.
pub async fn start_config_service(behavior: Behavior) -> SocketAddr {
    let app = Router::new().route(
        "/namespaces/{app_id}/{cluster}",
        get(move |Path((app_id, cluster)): Path<(String, String)>| async move {
            match behavior {
                Behavior::Namespaces(names) => {
                    (StatusCode::OK, namespace_list(&app_id, &cluster, names))
                }
                Behavior::Status(code) => (
                    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    String::new(),
                ),
                Behavior::Garbage => (StatusCode::OK, "<html>maintenance</html>".to_string()),
                Behavior::Slow(delay, names) => {
                    tokio::time::sleep(delay).await;
                    (StatusCode::OK, namespace_list(&app_id, &cluster, names))
                }
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Base URL of a service started by [`start_config_service`].
pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}
