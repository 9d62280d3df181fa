//! Plugin trait and hook definitions.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::adapter::Middleware;
use crate::config::schema::ServerOptions;
use crate::plugin::context::{AppOptions, RenderContext};

/// Error raised by a plugin hook.
///
/// Propagates out of the registry, aborting the remaining invocations for
/// that call. Fails the single render, never the server.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A hook reported a failure.
    #[error("plugin hook failed: {0}")]
    Hook(String),

    /// A store action or component fetch failed.
    #[error("data resolution failed: {0}")]
    Data(String),
}

/// Hooks called synchronously during a render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncHook {
    /// Fires once per render, after the application instance is constructed
    /// and before any route work.
    BeforeCreate,
    /// Fires once per server-side render, to let plugins inject extra
    /// fields into the serialized payload.
    SendSsrData,
}

/// Hooks awaited in registration order during a render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncHook {
    /// Fires before any route resolution, for hydrating state.
    BeforeStart,
    /// Fires once the matched route's components are known, for fetching
    /// the data they require.
    RouteResolve,
}

/// Host surface exposed to plugins during `install`.
pub trait ServerApi: Send + Sync {
    /// Register a middleware behind every route.
    fn use_middleware(&self, middleware: Arc<dyn Middleware>);

    /// Register a middleware for a path prefix.
    fn use_middleware_at(&self, path: &str, middleware: Arc<dyn Middleware>);

    /// Server options, read-only.
    fn options(&self) -> &ServerOptions;
}

/// A host plugin.
///
/// Every hook has a no-op default body; a plugin implements only the subset
/// it cares about and the registry skips the rest by construction.
#[async_trait]
pub trait ServerPlugin: Send + Sync {
    /// Plugin name, for logging.
    fn name(&self) -> &'static str;

    /// One-time setup at registration, before `start()`.
    fn install(&self, _server: &dyn ServerApi, _options: &Value) {}

    /// See [`SyncHook::BeforeCreate`]. Receives the application construction
    /// options so plugins can capture collaborators from them.
    fn before_create(
        &self,
        _ctx: &mut RenderContext,
        _app: &AppOptions,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    /// See [`AsyncHook::BeforeStart`].
    async fn before_start(&self, _ctx: &mut RenderContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// See [`AsyncHook::RouteResolve`].
    async fn route_resolve(&self, _ctx: &mut RenderContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// See [`SyncHook::SendSsrData`].
    fn send_ssr_data(&self, _ctx: &mut RenderContext) -> Result<(), PluginError> {
        Ok(())
    }
}
