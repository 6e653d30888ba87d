//! Static republish of the fetched dashboard
//!
//! An axum server on a background task serves the publish directory. `/`
//! maps to `index.html`; anything that tries to leave the directory is a 404.

use crate::error::{LaunchError, Result};
use crate::fetch::ARTIFACT_NAME;
use axum::Router;
use axum::extract::{Path as UrlPath, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const STOP_GRACE: Duration = Duration::from_secs(5);

/// Handle on the running static file server
pub struct StaticServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl StaticServer {
    /// Bind `bind:port` and start serving `root`
    ///
    /// Binding happens before this returns, so a taken port is reported here
    /// rather than from the background task.
    pub async fn start(root: PathBuf, bind: &str, port: u16) -> Result<Self> {
        let addr = format!("{}:{}", bind, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| LaunchError::Publish {
                addr: addr.clone(),
                source,
            })?;
        let local = listener.local_addr()?;

        let (tx, rx) = oneshot::channel::<()>();
        let app = router(root);
        let handle = tokio::spawn(async move {
            let signal = async move {
                let _ = rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(signal)
                .await
            {
                tracing::error!("static server error: {}", e);
            }
            tracing::debug!("static server stopped");
        });

        tracing::info!("serving static content on {}", local);
        Ok(Self {
            addr: local,
            shutdown: Some(tx),
            handle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Loopback URL for the server, even when bound to a wildcard address
    pub fn url(&self) -> String {
        let host = if self.addr.ip().is_unspecified() {
            "127.0.0.1".to_string()
        } else {
            self.addr.ip().to_string()
        };
        format!("http://{}:{}/", host, self.addr.port())
    }

    /// Graceful shutdown; aborts the task if connections linger
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match tokio::time::timeout(STOP_GRACE, &mut self.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("static server task failed: {}", e),
            Err(_) => {
                tracing::warn!("static server did not stop in time, aborting");
                self.handle.abort();
            }
        }
    }
}

fn router(root: PathBuf) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_path))
        .with_state(Arc::new(root))
}

async fn serve_index(State(root): State<Arc<PathBuf>>) -> Response {
    serve_file(&root.join(ARTIFACT_NAME)).await
}

async fn serve_path(
    State(root): State<Arc<PathBuf>>,
    UrlPath(path): UrlPath<String>,
) -> Response {
    match resolve(&root, &path) {
        Some(file) => serve_file(&file).await,
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Map a request path onto a file under `root`, refusing anything but plain names
fn resolve(root: &Path, request: &str) -> Option<PathBuf> {
    let relative = Path::new(request.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            _ => return None,
        }
    }
    if resolved.is_dir() {
        resolved.push(ARTIFACT_NAME);
    }
    Some(resolved)
}

async fn serve_file(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(path))], bytes).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::warn!("failed to read {}: {}", path.display(), e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("csv") => "text/csv; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/srv/static");
        assert_eq!(resolve(root, "../etc/passwd"), None);
        assert_eq!(resolve(root, "css/../../secret"), None);
        assert_eq!(
            resolve(root, "css/site.css"),
            Some(PathBuf::from("/srv/static/css/site.css"))
        );
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_serves_index_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Dashboard</h1>").unwrap();

        let server = StaticServer::start(dir.path().to_path_buf(), "127.0.0.1", 0)
            .await
            .unwrap();
        let url = server.url();

        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );
        assert_eq!(response.text().await.unwrap(), "<h1>Dashboard</h1>");

        let missing = reqwest::get(format!("{}nope.html", url)).await.unwrap();
        assert_eq!(missing.status(), 404);

        let addr = server.local_addr();
        server.stop().await;
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_taken_port_is_a_publish_error() {
        let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = holder.local_addr().unwrap().port();

        let err = StaticServer::start(PathBuf::from("."), "127.0.0.1", port)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, LaunchError::Publish { .. }));
    }
}
