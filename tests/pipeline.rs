// tests/pipeline.rs

//! Orchestrator guarantees and the submission endpoint contract.

mod common;

use std::sync::Arc;

use common::{ScriptedServer, build_collector, test_config};
use tempfile::TempDir;

use kitjar::collector::{KitAcquirer, scheduler};
use kitjar::models::{PhishKit, Sample};
use kitjar::server;
use kitjar::store::{KitStore, LocalStore, SampleIndex};
use kitjar::utils::http;

/// Read the persisted sample records straight from disk.
fn stored_samples(tmp: &TempDir) -> Vec<serde_json::Value> {
    let path = tmp.path().join("data").join("samples.json");
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

async fn closed_port_addr() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn unreachable_page_still_yields_exactly_one_record() {
    let addr = closed_port_addr().await;

    let tmp = TempDir::new().unwrap();
    let (collector, store) = build_collector(test_config(&tmp)).await;

    let sample = Sample::new("s1", format!("http://{addr}/x/y.php"), "openphish");
    collector.process(sample).await;

    let records = stored_samples(&tmp);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status_code"], 0);
    assert_eq!(records[0]["html"], "");
    assert_eq!(records[0]["kit_hashes"].as_array().unwrap().len(), 0);
    assert_eq!(records[0]["has_kit"], false);

    // The attempt is findable by its normalized URL afterwards.
    assert!(
        store
            .exists(&format!("http://{addr}/x/y.php"))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn blacklisted_host_is_recorded_degraded_without_network() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.collector.blacklist = vec!["blocked.example".to_string()];
    let (collector, _store) = build_collector(config).await;

    let sample = Sample::new("s1", "http://blocked.example/kit/login.php", "openphish");
    collector.process(sample).await;

    let records = stored_samples(&tmp);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status_code"], 0);
    assert_eq!(records[0]["html"], "");
}

#[tokio::test]
async fn obfuscated_scheme_is_normalized_before_collection() {
    let server = ScriptedServer::new();
    server.html("/page.php", "<html>login</html>");
    let addr = server.spawn().await;

    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.collector.guess_archives = false;
    let (collector, store) = build_collector(config).await;

    let sample = Sample::new("s1", format!("hxxp://{addr}/page.php"), "server");
    collector.process(sample).await;

    let record = store.most_recent("server").await.unwrap().unwrap();
    assert_eq!(record.url, format!("http://{addr}/page.php"));
    assert_eq!(record.status_code, 200);
}

#[tokio::test]
async fn known_kit_url_is_returned_without_network_access() {
    let server = ScriptedServer::new();
    server.zip("/kit.zip", b"PK\x03\x04 bytes");
    let addr = server.spawn().await;
    let kit_url = format!("http://{addr}/kit.zip");

    let tmp = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::open(tmp.path().join("data")).await.unwrap());
    let existing = PhishKit {
        hash: "cafebabe".to_string(),
        url: kit_url.clone(),
        filename: "kit.zip".to_string(),
        filepath: "/tmp/other-kit.zip".to_string(),
        filesize: 7,
    };
    KitStore::upsert(store.as_ref(), &existing).await.unwrap();

    let config = test_config(&tmp);
    let acquirer = KitAcquirer::new(
        &config.collector,
        http::create_client(&config.collector).unwrap(),
        store,
    );

    let kit = acquirer.acquire(&kit_url, "s2").await.unwrap();
    assert_eq!(kit, existing);
    assert_eq!(server.request_count("/kit.zip"), 0);
}

#[tokio::test]
async fn zip_url_serving_html_is_not_a_kit() {
    let server = ScriptedServer::new();
    server.html("/fake.zip", "<html>404 but with a 200</html>");
    let addr = server.spawn().await;

    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let store = Arc::new(LocalStore::open(tmp.path().join("data")).await.unwrap());
    let acquirer = KitAcquirer::new(
        &config.collector,
        http::create_client(&config.collector).unwrap(),
        store.clone(),
    );

    let kit = acquirer
        .acquire(&format!("http://{addr}/fake.zip"), "s1")
        .await;
    assert!(kit.is_none());
    assert!(
        store
            .find_by_url(&format!("http://{addr}/fake.zip"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn batch_run_records_every_sample() {
    let server = ScriptedServer::new();
    server.html("/ok/page.php", "<html>live</html>");
    let addr = server.spawn().await;
    let closed = closed_port_addr().await;

    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.collector.guess_archives = false;
    let (collector, _store) = build_collector(config).await;

    let samples = vec![
        Sample::new("ok", format!("http://{addr}/ok/page.php"), "openphish"),
        Sample::new("down", format!("http://{closed}/x/page.php"), "openphish"),
    ];

    let report = scheduler::run_batch(collector, samples, 4).await;
    assert_eq!(report.processed, 2);

    let records = stored_samples(&tmp);
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn submission_endpoint_enqueues_and_acknowledges() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Sample>();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server::router(tx);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();

    // Missing url is rejected at the boundary.
    let response = client
        .post(format!("http://{addr}/"))
        .form(&[("feed", "manual")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // A bare url is accepted immediately, with defaults filled in.
    let response = client
        .post(format!("http://{addr}/"))
        .form(&[("url", "http://evil.test/kit/login.php")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value =
        serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(body["processing"], true);

    let sample = rx.recv().await.unwrap();
    assert_eq!(sample.url, "http://evil.test/kit/login.php");
    assert_eq!(sample.feed, "server");
    assert!(!sample.id.is_empty());

    // Explicit id and feed are preserved.
    client
        .post(format!("http://{addr}/"))
        .form(&[
            ("url", "http://evil.test/other"),
            ("id", "custom-1"),
            ("feed", "manual"),
        ])
        .send()
        .await
        .unwrap();
    let sample = rx.recv().await.unwrap();
    assert_eq!(sample.id, "custom-1");
    assert_eq!(sample.feed, "manual");
}

#[tokio::test]
async fn queue_workers_process_submitted_samples() {
    let server = ScriptedServer::new();
    server.html("/live/page.php", "<html>live</html>");
    let addr = server.spawn().await;

    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.collector.guess_archives = false;
    let (collector, store) = build_collector(config).await;

    let tx = scheduler::spawn_workers(collector, 2);
    tx.send(Sample::new(
        "live-1",
        format!("http://{addr}/live/page.php"),
        "server",
    ))
    .unwrap();

    // The live path has no join; poll the index for the terminal record.
    for _ in 0..50 {
        if let Some(record) = store.most_recent("server").await.unwrap() {
            assert_eq!(record.id, "live-1");
            assert_eq!(record.status_code, 200);
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("submitted sample was never recorded");
}
