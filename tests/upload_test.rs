//! Upload flow against in-memory storage and a mock YOURLS server
//!
//! Exercises the real storage and shortener clients end to end without any
//! external service.

use axum::{Form, Json, Router, routing::post};
use minls::commands::{UploadError, UploadPipeline, render_table};
use minls::config::{HumanDuration, ShortenerConfig};
use minls::ledger::{LedgerStore, StoreOptions};
use minls::shortener::ShortenerClient;
use minls::storage::{StorageClient, Visibility};
use std::collections::HashMap;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Mock YOURLS API: echoes the keyword back as the short link
async fn yourls(Form(form): Form<HashMap<String, String>>) -> Json<serde_json::Value> {
    let keyword = form.get("keyword").cloned().unwrap_or_default();
    Json(serde_json::json!({
        "status": "success",
        "shorturl": format!("https://sho.rt/{keyword}"),
        "url": {"url": form.get("url")}
    }))
}

async fn start_yourls() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/yourls-api.php", post(yourls));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/yourls-api.php")
}

fn shortener(endpoint: String) -> ShortenerClient {
    ShortenerClient::new(&ShortenerConfig {
        endpoint: Some(endpoint),
        signature: Some("secret".to_string()),
        timeout: HumanDuration::from_secs(5),
        ..ShortenerConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_upload_shorten_record() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("report.pdf");
    std::fs::write(&file, b"%PDF-1.7").unwrap();

    let storage = StorageClient::in_memory("http://127.0.0.1:9000").unwrap();
    let pipeline = UploadPipeline::new(storage, shortener(start_yourls().await));
    let mut store = LedgerStore::new(StoreOptions::new(temp_dir.path().join("data")));

    let first = pipeline.run(&file, Visibility::Public, &mut store).await.unwrap();
    let second = pipeline.run(&file, Visibility::Public, &mut store).await.unwrap();

    assert_eq!((first.id, second.id), (1, 2));
    assert!(first.object_link.starts_with("http://127.0.0.1:9000/minls-public/"));
    assert!(first.object_link.ends_with(".pdf"));
    assert!(first.short_link.starts_with("https://sho.rt/"));
    assert_ne!(first.object_link, second.object_link);

    let ledger = LedgerStore::new(store.options().clone()).read_data().unwrap();
    assert_eq!(ledger.entries, vec![first.clone(), second]);

    let table = render_table(&ledger.entries);
    let keyword = first.short_link.rsplit('/').next().unwrap();
    assert!(table.contains(keyword));
}

#[tokio::test]
async fn test_shortener_failure_records_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("a.txt");
    std::fs::write(&file, b"a").unwrap();

    // Nothing listens on the route, every request gets a 404
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new()).await.unwrap();
    });

    let storage = StorageClient::in_memory("http://127.0.0.1:9000").unwrap();
    let pipeline = UploadPipeline::new(
        storage,
        shortener(format!("http://{addr}/yourls-api.php")),
    );
    let mut store = LedgerStore::new(StoreOptions::new(temp_dir.path().join("data")));

    let err = pipeline
        .run(&file, Visibility::Public, &mut store)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Shorten(_)));
    assert!(store.read_data().unwrap().is_empty());
}
