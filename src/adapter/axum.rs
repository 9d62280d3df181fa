//! Default HTTP adapter built on Axum.
//!
//! # Responsibilities
//! - Bind the configured address, with optional TLS termination
//! - Run the registered middleware chain as the fallback handler
//! - Wire cross-cutting layers (tracing, request timeout)
//! - Graceful shutdown via the server lifecycle

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ::axum::body::Body;
use ::axum::extract::State;
use ::axum::http::{Request, StatusCode};
use ::axum::response::{IntoResponse, Response};
use ::axum::Router;
use async_trait::async_trait;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::adapter::{
    AdapterError, HttpAdapter, Middleware, MiddlewareEntry, MiddlewareOutcome, RenderHandler,
};
use crate::config::schema::HttpOptions;

/// Shared request-chain state, read per request by the fallback handler.
struct ChainState {
    middleware: RwLock<Vec<MiddlewareEntry>>,
    renderer: RwLock<Option<Arc<dyn RenderHandler>>>,
}

/// Running serve loop.
struct Serving {
    handle: Handle,
    join: JoinHandle<std::io::Result<()>>,
}

/// Axum-backed [`HttpAdapter`].
pub struct AxumAdapter {
    http: RwLock<HttpOptions>,
    chain: Arc<ChainState>,
    serving: tokio::sync::Mutex<Option<Serving>>,
    bound_port: AtomicU16,
}

impl AxumAdapter {
    /// Create a new adapter with the given HTTP options.
    pub fn new(http: HttpOptions) -> Self {
        Self {
            http: RwLock::new(http),
            chain: Arc::new(ChainState {
                middleware: RwLock::new(Vec::new()),
                renderer: RwLock::new(None),
            }),
            serving: tokio::sync::Mutex::new(None),
            bound_port: AtomicU16::new(0),
        }
    }

    fn router(&self, http: &HttpOptions) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(self.chain.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        http.request_timeout_secs,
                    ))),
            )
    }
}

/// Walk the middleware chain, then hand the request to the renderer.
async fn dispatch(State(chain): State<Arc<ChainState>>, req: Request<Body>) -> Response {
    let entries = chain.middleware.read().clone();
    let mut req = req;

    for entry in entries {
        if entry.matches(req.uri().path()) {
            match entry.middleware.handle(req).await {
                MiddlewareOutcome::Respond(response) => return response,
                MiddlewareOutcome::Continue(next) => req = next,
            }
        }
    }

    let renderer = chain.renderer.read().clone();
    match renderer {
        Some(renderer) => renderer.render(req).await,
        None => (StatusCode::SERVICE_UNAVAILABLE, "Renderer not ready").into_response(),
    }
}

#[async_trait]
impl HttpAdapter for AxumAdapter {
    fn create_app(&self, args: &Value) -> Result<(), AdapterError> {
        if args.is_null() {
            return Ok(());
        }
        // Adapter args accept per-app overrides of the HTTP layer settings.
        if let Some(timeout) = args.get("request_timeout_secs").and_then(Value::as_u64) {
            self.http.write().request_timeout_secs = timeout;
        }
        if let Some(obj) = args.as_object() {
            for key in obj.keys().filter(|k| *k != "request_timeout_secs") {
                tracing::warn!(arg = %key, "Unknown adapter argument ignored");
            }
        }
        Ok(())
    }

    fn use_middleware(&self, middleware: Arc<dyn Middleware>) {
        self.chain.middleware.write().push(MiddlewareEntry {
            path: None,
            middleware,
        });
    }

    fn use_middleware_at(&self, path: &str, middleware: Arc<dyn Middleware>) {
        self.chain.middleware.write().push(MiddlewareEntry {
            path: Some(path.to_string()),
            middleware,
        });
    }

    fn setup_renderer(&self, renderer: Arc<dyn RenderHandler>) {
        *self.chain.renderer.write() = Some(renderer);
    }

    async fn start(&self) -> Result<SocketAddr, AdapterError> {
        let http = self.http.read().clone();
        let addr: SocketAddr = format!("{}:{}", http.host, http.port).parse()?;

        let listener = std::net::TcpListener::bind(addr).map_err(AdapterError::Bind)?;
        listener.set_nonblocking(true).map_err(AdapterError::Bind)?;
        let local = listener.local_addr().map_err(AdapterError::Bind)?;

        let app = self.router(&http);
        let handle = Handle::new();

        let join = match &http.tls {
            Some(tls) => {
                let config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                    .await
                    .map_err(AdapterError::Tls)?;
                let server = axum_server::from_tcp_rustls(listener, config).handle(handle.clone());
                tokio::spawn(server.serve(app.into_make_service()))
            }
            None => {
                let server = axum_server::from_tcp(listener).handle(handle.clone());
                tokio::spawn(server.serve(app.into_make_service()))
            }
        };

        self.bound_port.store(local.port(), Ordering::Relaxed);
        *self.serving.lock().await = Some(Serving { handle, join });

        tracing::debug!(address = %local, https = http.tls.is_some(), "Adapter listening");
        Ok(local)
    }

    async fn stop(&self) -> Result<(), AdapterError> {
        let serving = self.serving.lock().await.take();
        let Some(serving) = serving else {
            return Ok(());
        };

        serving.handle.graceful_shutdown(Some(Duration::from_secs(30)));

        match serving.join.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(AdapterError::Serve(e.to_string())),
            Err(e) => Err(AdapterError::Serve(e.to_string())),
        }
    }

    fn is_https(&self) -> bool {
        self.http.read().tls.is_some()
    }

    fn host(&self) -> String {
        self.http.read().host.clone()
    }

    fn port(&self) -> u16 {
        let bound = self.bound_port.load(Ordering::Relaxed);
        if bound != 0 {
            bound
        } else {
            self.http.read().port
        }
    }
}
