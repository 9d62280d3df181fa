//! Request-scoped render context shared between plugin hooks.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::plugin::hooks::PluginError;

/// Mutable context threaded through every hook of one render cycle.
///
/// Mutation by one hook is visible to subsequent hooks in the same
/// invocation, by contract. The context never crosses render cycles.
pub struct RenderContext {
    /// Request path and query.
    pub url: String,

    /// Correlation ID for this render.
    pub request_id: String,

    /// Components matched for the requested route, populated before the
    /// `route_resolve` hook fires.
    pub route_components: Vec<Arc<dyn RouteComponent>>,

    /// Data store injected by a plugin during `before_create`.
    pub store: Option<Arc<dyn DataStore>>,

    /// Inbound serialized payload, when the caller carries one.
    pub payload: Option<Value>,

    /// Outbound hydration payload sent to the client.
    pub ssr: SsrData,

    /// Redirect target set by a hook; short-circuits rendering.
    pub redirect: Option<String>,
}

impl RenderContext {
    /// Create a fresh context for one render cycle.
    pub fn new(url: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_id: request_id.into(),
            route_components: Vec::new(),
            store: None,
            payload: None,
            ssr: SsrData::default(),
            redirect: None,
        }
    }
}

/// Serialized payload sent to the client for hydration.
///
/// Carries at least a `state` field when a store plugin is active.
#[derive(Debug, Default, Clone)]
pub struct SsrData {
    /// Payload fields, serialized into the hydration global.
    pub data: serde_json::Map<String, Value>,
}

impl SsrData {
    /// Set one payload field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }
}

/// Construction options of the underlying application instance.
///
/// Passed to `before_create` so plugins can pick up collaborators the
/// application was built with.
#[derive(Default, Clone)]
pub struct AppOptions {
    /// Application data store, if one is configured.
    pub store: Option<Arc<dyn DataStore>>,
}

/// Application data store collaborator.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Snapshot of the current store state.
    fn state(&self) -> Value;

    /// Replace the entire state with a deserialized snapshot.
    fn replace_state(&self, state: Value);

    /// Whether the store defines the named action.
    fn has_action(&self, name: &str) -> bool;

    /// Dispatch a named action with the request context.
    async fn dispatch(&self, action: &str, ctx: &RenderContext) -> Result<(), PluginError>;
}

/// A component matched for the requested route.
#[async_trait]
pub trait RouteComponent: Send + Sync {
    /// Component name, for logging.
    fn name(&self) -> &str;

    /// Fetch data this component needs before rendering.
    async fn fetch(&self, _ctx: &RenderContext) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Maps a request URL to the components of its matched route.
pub trait RouteResolver: Send + Sync {
    fn resolve(&self, url: &str) -> Vec<Arc<dyn RouteComponent>>;
}
