#![allow(dead_code)]

use axum::Router;
use axum::response::Html;
use axum::routing::get;
use salesdash_container::CommandOutput;
use salesdash_container::testing::RecordingRunner;
use salesdash_core::{LaunchConfig, RetryPolicy};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;

pub const DASHBOARD_HTML: &str =
    "<html><body><h1>Sales Dashboard</h1><table><tr><td>Widget</td><td>350.49</td></tr></table></body></html>";

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Config pointing at the fixtures, with fast readiness policies
///
/// Port preflight is off: the fake app already holds the app port.
pub fn test_config(publish_dir: &Path, app_port: u16) -> LaunchConfig {
    let mut config = LaunchConfig::default();
    config.network = "salesdash-test-net".to_string();
    config.database.host_port = free_port();
    config.app.host_port = app_port;
    config.data.products_csv = fixtures_dir().join("products.csv");
    config.data.sales_csv = fixtures_dir().join("sales_data.csv");
    config.publish.dir = publish_dir.to_path_buf();
    config.publish.bind = "127.0.0.1".to_string();
    config.publish.port = free_port();
    config.readiness.database = RetryPolicy::new(3, 10);
    config.readiness.fetch = RetryPolicy::new(5, 20);
    config.preflight_ports = false;
    config
}

/// Runner that behaves like a healthy docker host with the given table counts
pub fn runner_with_counts(products: u64, sales: u64) -> RecordingRunner {
    RecordingRunner::new()
        .on(
            "network inspect",
            CommandOutput::failure(1, "Error: No such network: salesdash-test-net"),
        )
        .on(
            "COUNT(*) FROM products",
            CommandOutput::success(format!("{}\n", products)),
        )
        .on(
            "COUNT(*) FROM sales_data",
            CommandOutput::success(format!("{}\n", sales)),
        )
}

pub fn healthy_runner() -> RecordingRunner {
    runner_with_counts(3, 10)
}

/// Stand-in for the dashboard container, listening on a random local port
pub async fn spawn_fake_app() -> (u16, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let app = Router::new().route("/", get(|| async { Html(DASHBOARD_HTML) }));
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (port, handle)
}
