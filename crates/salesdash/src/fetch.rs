//! Dashboard content fetch
//!
//! The application is polled over HTTP until it answers at all. Any status
//! counts as an answer: the body is persisted as-is, error pages included.

use crate::error::Result;
use salesdash_container::poll_for;
use salesdash_core::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the persisted page inside the publish directory
pub const ARTIFACT_NAME: &str = "index.html";

/// Client with a per-request timeout so a hung connection counts as a failed attempt
pub fn http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(concat!("salesdash/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// GET `url` until a response arrives; returns the body and the attempts used
pub async fn fetch_dashboard(
    client: &reqwest::Client,
    url: &str,
    policy: &RetryPolicy,
) -> Result<(Vec<u8>, u32)> {
    let readiness = poll_for(policy, || {
        let client = client.clone();
        let url = url.to_string();
        async move {
            match get_body(&client, &url).await {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::debug!("fetch {} failed: {}", url, e);
                    None
                }
            }
        }
    })
    .await;

    let attempts = readiness.attempts();
    let body = readiness.into_result(url)?;
    Ok((body, attempts))
}

async fn get_body(client: &reqwest::Client, url: &str) -> reqwest::Result<Vec<u8>> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        tracing::warn!("{} answered with {}; keeping the body anyway", url, status);
    }
    Ok(response.bytes().await?.to_vec())
}

/// Write `body` to `<dir>/index.html`, creating `dir` if needed
pub async fn write_artifact(dir: &Path, body: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(ARTIFACT_NAME);
    tokio::fs::write(&path, body).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LaunchError;
    use salesdash_container::ContainerError;

    #[tokio::test]
    async fn test_write_artifact_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("static");

        let path = write_artifact(&target, b"<h1>Sales</h1>").await.unwrap();

        assert_eq!(path, target.join("index.html"));
        assert_eq!(std::fs::read(&path).unwrap(), b"<h1>Sales</h1>");
    }

    #[tokio::test]
    async fn test_write_artifact_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), b"old page").await.unwrap();
        let path = write_artifact(dir.path(), b"new").await.unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_unreachable_app_times_out() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = http_client().unwrap();
        let url = format!("http://127.0.0.1:{}/", port);

        let err = fetch_dashboard(&client, &url, &RetryPolicy::new(2, 10))
            .await
            .unwrap_err();

        match err {
            LaunchError::Container(ContainerError::ReadinessTimeout { target, attempts }) => {
                assert_eq!(target, url);
                assert_eq!(attempts, 2);
            }
            other => panic!("expected a readiness timeout, got {:?}", other),
        }
    }
}
