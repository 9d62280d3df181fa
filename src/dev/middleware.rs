//! Development middlewares attached to the HTTP adapter.
//!
//! # Responsibilities
//! - Serve current in-memory client assets, holding requests while a
//!   rebuild is in flight
//! - Push change notifications to connected clients over SSE

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::BroadcastStream;

use crate::adapter::{Middleware, MiddlewareOutcome};
use crate::dev::pipeline::BuildPhase;
use crate::dev::vfs::MemoryFs;

/// One build-generation notification pushed to connected clients.
#[derive(Debug, Clone, Copy)]
pub struct HotUpdate {
    /// Monotonic build generation.
    pub generation: u64,
}

/// Serves client assets from the virtual filesystem.
pub struct AssetMiddleware {
    vfs: Arc<MemoryFs>,
    public_path: String,
    phase: watch::Receiver<BuildPhase>,
}

impl AssetMiddleware {
    pub fn new(vfs: Arc<MemoryFs>, public_path: String, phase: watch::Receiver<BuildPhase>) -> Self {
        Self {
            vfs,
            public_path,
            phase,
        }
    }

    /// Map a request path to an output-relative file path.
    fn relative_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.public_path.as_str())?;
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    /// Hold until the in-flight rebuild completes.
    async fn wait_ready(&self) {
        let mut phase = self.phase.clone();
        while *phase.borrow_and_update() == BuildPhase::Building {
            if phase.changed().await.is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl Middleware for AssetMiddleware {
    async fn handle(&self, req: Request<Body>) -> MiddlewareOutcome {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return MiddlewareOutcome::Continue(req);
        }

        let Some(relative) = self
            .relative_path(req.uri().path())
            .map(str::to_string)
        else {
            return MiddlewareOutcome::Continue(req);
        };

        self.wait_ready().await;

        match self.vfs.read(Path::new(&relative)) {
            Some(bytes) => {
                let response = (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, content_type(&relative))],
                    bytes.as_ref().clone(),
                )
                    .into_response();
                MiddlewareOutcome::Respond(response)
            }
            None => MiddlewareOutcome::Continue(req),
        }
    }
}

/// Streams build notifications to connected clients.
pub struct HotUpdateMiddleware {
    path: String,
    updates: broadcast::Sender<HotUpdate>,
    heartbeat: Duration,
}

impl HotUpdateMiddleware {
    pub fn new(path: String, updates: broadcast::Sender<HotUpdate>, heartbeat: Duration) -> Self {
        Self {
            path,
            updates,
            heartbeat,
        }
    }

    fn stream_response(&self) -> Response {
        let stream = BroadcastStream::new(self.updates.subscribe()).filter_map(|update| async move {
            // A lagged receiver just skips to the next notification.
            update.ok().map(|u| {
                Ok::<Event, Infallible>(
                    Event::default()
                        .event("rebuilt")
                        .data(u.generation.to_string()),
                )
            })
        });

        Sse::new(stream)
            .keep_alive(KeepAlive::new().interval(self.heartbeat).text("ping"))
            .into_response()
    }
}

#[async_trait]
impl Middleware for HotUpdateMiddleware {
    async fn handle(&self, req: Request<Body>) -> MiddlewareOutcome {
        if req.uri().path() == self.path {
            MiddlewareOutcome::Respond(self.stream_response())
        } else {
            MiddlewareOutcome::Continue(req)
        }
    }
}

fn content_type(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("html") => "text/html; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    fn ready_assets(vfs: Arc<MemoryFs>) -> (AssetMiddleware, watch::Sender<BuildPhase>) {
        let (tx, rx) = watch::channel(BuildPhase::Ready);
        (AssetMiddleware::new(vfs, "/".to_string(), rx), tx)
    }

    #[tokio::test]
    async fn serves_vfs_files_with_content_type() {
        let vfs = Arc::new(MemoryFs::new());
        vfs.write("app.js", "console.log(1)");
        let (assets, _tx) = ready_assets(vfs);

        match assets.handle(get("/app.js")).await {
            MiddlewareOutcome::Respond(response) => {
                assert_eq!(response.status(), StatusCode::OK);
                assert_eq!(
                    response.headers()[header::CONTENT_TYPE],
                    "application/javascript"
                );
            }
            MiddlewareOutcome::Continue(_) => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn unknown_paths_fall_through() {
        let (assets, _tx) = ready_assets(Arc::new(MemoryFs::new()));

        assert!(matches!(
            assets.handle(get("/page")).await,
            MiddlewareOutcome::Continue(_)
        ));
    }

    #[tokio::test]
    async fn requests_hold_until_rebuild_completes() {
        let vfs = Arc::new(MemoryFs::new());
        vfs.write("app.js", "ok");
        let (tx, rx) = watch::channel(BuildPhase::Building);
        let assets = Arc::new(AssetMiddleware::new(vfs, "/".to_string(), rx));

        let pending = {
            let assets = assets.clone();
            tokio::spawn(async move { assets.handle(get("/app.js")).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        tx.send(BuildPhase::Ready).unwrap();
        match pending.await.unwrap() {
            MiddlewareOutcome::Respond(response) => assert_eq!(response.status(), StatusCode::OK),
            MiddlewareOutcome::Continue(_) => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn hot_middleware_only_claims_its_route() {
        let (tx, _) = broadcast::channel(4);
        let hot = HotUpdateMiddleware::new(
            "/__ssr_hot".to_string(),
            tx,
            Duration::from_secs(10),
        );

        assert!(matches!(
            hot.handle(get("/page")).await,
            MiddlewareOutcome::Continue(_)
        ));
        assert!(matches!(
            hot.handle(get("/__ssr_hot")).await,
            MiddlewareOutcome::Respond(_)
        ));
    }
}
