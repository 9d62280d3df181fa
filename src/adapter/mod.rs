//! HTTP adapter subsystem.
//!
//! # Data Flow
//! ```text
//! request
//!     → adapter listener
//!     → registered middleware, in installation order
//!     → terminal renderer (installed last by the server)
//!     → response
//! ```
//!
//! # Design Decisions
//! - The host depends only on the [`HttpAdapter`] capability shape, not on
//!   a specific HTTP framework
//! - Middleware ordering relative to the renderer installation is a
//!   correctness invariant: application middleware always runs first
//! - One uniform [`Middleware`] trait for every adapter kind, so dev
//!   middlewares attach without per-framework wrapping

pub mod axum;

use std::net::SocketAddr;
use std::sync::Arc;

use ::axum::body::Body;
use ::axum::http::Request;
use ::axum::response::Response;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use self::axum::AxumAdapter;

/// Error type for adapter operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The configured host/port pair is not a valid socket address.
    #[error("invalid listen address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    /// Failed to bind to the configured address.
    #[error("failed to bind: {0}")]
    Bind(std::io::Error),

    /// Failed to load TLS material.
    #[error("failed to load TLS configuration: {0}")]
    Tls(std::io::Error),

    /// The serve loop ended abnormally.
    #[error("serve loop failed: {0}")]
    Serve(String),
}

/// Decision a middleware makes for one request.
pub enum MiddlewareOutcome {
    /// Short-circuit with a full response.
    Respond(Response),
    /// Pass the (possibly modified) request to the next middleware.
    Continue(Request<Body>),
}

/// A single layer of the request chain.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, req: Request<Body>) -> MiddlewareOutcome;
}

/// Terminal handler producing the rendered response.
///
/// Installed by the server once artifacts are ready; always runs after
/// every registered middleware.
#[async_trait]
pub trait RenderHandler: Send + Sync {
    async fn render(&self, req: Request<Body>) -> Response;
}

/// A registered middleware with its optional path scope.
#[derive(Clone)]
pub struct MiddlewareEntry {
    /// Path prefix this middleware applies to; `None` applies everywhere.
    pub path: Option<String>,
    /// The middleware instance.
    pub middleware: Arc<dyn Middleware>,
}

impl MiddlewareEntry {
    /// Whether this middleware applies to the request path.
    pub fn matches(&self, path: &str) -> bool {
        match &self.path {
            Some(prefix) => path.starts_with(prefix.as_str()),
            None => true,
        }
    }
}

/// HTTP adapter capability contract.
#[async_trait]
pub trait HttpAdapter: Send + Sync {
    /// Build the underlying application with adapter-specific arguments.
    /// Called once by the server at construction.
    fn create_app(&self, args: &Value) -> Result<(), AdapterError>;

    /// Register a middleware behind every route.
    fn use_middleware(&self, middleware: Arc<dyn Middleware>);

    /// Register a middleware for a path prefix.
    fn use_middleware_at(&self, path: &str, middleware: Arc<dyn Middleware>);

    /// Install the renderer as the terminal middleware. The server calls
    /// this after every other middleware registration.
    fn setup_renderer(&self, renderer: Arc<dyn RenderHandler>);

    /// Bind and begin accepting connections. Resolves once listening.
    async fn start(&self) -> Result<SocketAddr, AdapterError>;

    /// Stop accepting connections and drain in-flight requests.
    /// Safe to call when not running.
    async fn stop(&self) -> Result<(), AdapterError>;

    /// Whether the adapter terminates TLS.
    fn is_https(&self) -> bool;

    /// Configured host.
    fn host(&self) -> String;

    /// Bound port once started, configured port otherwise.
    fn port(&self) -> u16;
}
