//! Binding declarations and dispatching change batches through a client.

use async_trait::async_trait;
use hotswap_namespaces::prelude::*;
use hotswap_namespaces::sources::{FetchResponse, HttpFetcher};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;
use url::Url;

/// Serves a fixed namespace list for every request.
struct FixedFetcher(&'static str);

#[async_trait]
impl HttpFetcher for FixedFetcher {
    async fn get(&self, _url: &Url, _timeout: Duration) -> Result<FetchResponse> {
        Ok(FetchResponse::new(200, self.0))
    }
}

const NAMESPACES: &str = r#"[
    {"id": 1, "appId": "app1", "clusterName": "default", "namespaceName": "application"},
    {"id": 2, "appId": "app1", "clusterName": "default", "namespaceName": "redis"}
]"#;

async fn started_client() -> NamespaceClient {
    let client = NamespaceClient::builder()
        .with_app_id("app1")
        .with_endpoints(["http://config:8080"])
        .with_fetcher(Arc::new(FixedFetcher(NAMESPACES)))
        .build()
        .unwrap();
    client.refresh_namespaces().await;
    client
}

/// Records every batch it receives as (namespace, keys).
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(String, Vec<String>)>>,
}

impl ChangeListener for Recorder {
    fn on_change(&self, batch: &ChangeBatch) -> Result<()> {
        self.seen.lock().push((
            batch.namespace().to_string(),
            batch.iter().map(|c| c.key.clone()).collect(),
        ));
        Ok(())
    }
}

fn batch(namespace: &str, keys: &[&str]) -> ChangeBatch {
    ChangeBatch::new(
        namespace,
        keys.iter()
            .map(|key| ChangeRecord::modified(namespace, *key, "old", "new"))
            .collect(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_interest_filtered_delivery() {
    let client = started_client().await;

    let all = Arc::new(Recorder::default());
    let timeouts = Arc::new(Recorder::default());
    let db = Arc::new(Recorder::default());

    client
        .bind_all(&[
            InterestDeclaration::from_shared(all.clone()),
            InterestDeclaration::from_shared(timeouts.clone()).with_keys(["timeout"]),
            InterestDeclaration::from_shared(db.clone()).with_key_prefixes(["db."]),
        ])
        .await;

    let report = client.dispatch(&batch("application", &["timeout", "name"])).await;
    assert_eq!(report.delivered, 2);
    assert_eq!(report.skipped, 1);

    let report = client.dispatch(&batch("application", &["db.url"])).await;
    assert_eq!(report.delivered, 2);

    assert_eq!(all.seen.lock().len(), 2);
    assert_eq!(
        timeouts.seen.lock().as_slice(),
        &[(
            "application".to_string(),
            vec!["timeout".to_string(), "name".to_string()]
        )]
    );
    assert_eq!(db.seen.lock().len(), 1);
}

#[tokio::test]
async fn test_discovered_namespaces_are_bound() {
    let client = started_client().await;
    let recorder = Arc::new(Recorder::default());

    let handles = client
        .bind(&InterestDeclaration::from_shared(recorder.clone()))
        .await;
    assert_eq!(handles.len(), 2);

    client.dispatch(&batch("redis", &["host"])).await;
    client.dispatch(&batch("unknown", &["host"])).await;

    assert_eq!(
        recorder.seen.lock().as_slice(),
        &[("redis".to_string(), vec!["host".to_string()])]
    );
}

#[tokio::test]
async fn test_failing_listener_does_not_block_others() {
    let client = started_client().await;
    let recorder = Arc::new(Recorder::default());

    client
        .bind(&InterestDeclaration::new(|batch: &ChangeBatch| {
            if batch.is_changed("timeout") {
                panic!("cannot handle timeout change");
            }
        }))
        .await;
    client
        .bind(&InterestDeclaration::from_shared(recorder.clone()))
        .await;

    let report = client.dispatch(&batch("application", &["timeout"])).await;

    assert_eq!(report.delivered, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        &report.failures[0],
        ConfigError::ListenerInvocationFailed { namespace, .. } if namespace == "application"
    ));
    assert_eq!(recorder.seen.lock().len(), 1);
}

#[tokio::test]
async fn test_unbind_stops_delivery() {
    let client = started_client().await;
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);

    let handles = client
        .bind(&InterestDeclaration::new(move |_: &ChangeBatch| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .await;

    client.dispatch(&batch("application", &["a"])).await;
    assert_eq!(client.unbind(&handles).await, handles.len());
    assert_eq!(client.unbind(&handles).await, 0);
    client.dispatch(&batch("application", &["b"])).await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

/// Blocks on the first batch touching `hold` until released.
struct Holding {
    hold: &'static str,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
    recorder: Recorder,
}

impl ChangeListener for Holding {
    fn on_change(&self, batch: &ChangeBatch) -> Result<()> {
        if batch.is_changed(self.hold) {
            self.entered.lock().send(()).ok();
            self.release.lock().recv().ok();
        }
        self.recorder.on_change(batch)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batches_for_one_namespace_arrive_in_order() {
    let client = started_client().await;
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let listener = Arc::new(Holding {
        hold: "held",
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
        recorder: Recorder::default(),
    });
    client
        .bind(&InterestDeclaration::from_shared(listener.clone()))
        .await;

    let mut tasks = Vec::new();
    let first = client.clone();
    tasks.push(tokio::spawn(async move {
        first.dispatch(&batch("application", &["held"])).await
    }));
    tokio::task::spawn_blocking(move || entered_rx.recv().unwrap())
        .await
        .unwrap();

    for i in 0..5 {
        let change = batch("application", &[format!("key{}", i).as_str()]);
        let client = client.clone();
        tasks.push(tokio::spawn(async move { client.dispatch(&change).await }));
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    // Another namespace is not held up by the blocked one.
    let report = client.dispatch(&batch("redis", &["host"])).await;
    assert_eq!(report.delivered, 1);

    release_tx.send(()).unwrap();
    for task in tasks {
        assert_eq!(task.await.unwrap().delivered, 1);
    }

    let application: Vec<String> = listener
        .recorder
        .seen
        .lock()
        .iter()
        .filter(|(namespace, _)| namespace == "application")
        .map(|(_, keys)| keys[0].clone())
        .collect();
    assert_eq!(application, vec!["held", "key0", "key1", "key2", "key3", "key4"]);
}

#[tokio::test]
async fn test_diff_batch_reaches_key_listener() {
    let client = started_client().await;
    let recorder = Arc::new(Recorder::default());
    client
        .bind(&InterestDeclaration::from_shared(recorder.clone()).with_keys(["port"]))
        .await;

    let before = HashMap::from([
        ("port".to_string(), "8080".to_string()),
        ("host".to_string(), "a".to_string()),
    ]);
    let after = HashMap::from([("port".to_string(), "9090".to_string())]);
    let change = ChangeBatch::diff("application", &before, &after).unwrap();

    client.dispatch(&change).await;

    let seen = recorder.seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, vec!["host".to_string(), "port".to_string()]);
}
