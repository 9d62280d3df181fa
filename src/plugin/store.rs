//! Data-store hydration plugin.
//!
//! Bridges an application data store into the render cycle: hydrates state
//! from an inbound payload, dispatches a per-request action, runs component
//! data fetching, and snapshots the store into the outbound payload.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::future::try_join_all;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;

use crate::plugin::context::{AppOptions, RenderContext};
use crate::plugin::hooks::{PluginError, ServerApi, ServerPlugin};

/// Store action dispatched once per request render.
pub const ON_HTTP_REQUEST: &str = "on_http_request";

/// Options accepted at registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreHydrationOptions {
    /// Run component `fetch` during route resolution.
    pub fetch: bool,

    /// Dispatch the per-request store action.
    pub on_http_request: bool,
}

impl Default for StoreHydrationOptions {
    fn default() -> Self {
        Self {
            fetch: false,
            on_http_request: true,
        }
    }
}

/// Plugin wiring a [`crate::plugin::DataStore`] into the hook surface.
///
/// When no store is present the plugin warns once and every later hook
/// no-ops instead of failing the render.
pub struct StoreHydrationPlugin {
    options: RwLock<StoreHydrationOptions>,
    missing_store_warned: AtomicBool,
}

impl StoreHydrationPlugin {
    pub fn new() -> Self {
        Self {
            options: RwLock::new(StoreHydrationOptions::default()),
            missing_store_warned: AtomicBool::new(false),
        }
    }
}

impl Default for StoreHydrationPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServerPlugin for StoreHydrationPlugin {
    fn name(&self) -> &'static str {
        "store-hydration"
    }

    fn install(&self, _server: &dyn ServerApi, options: &Value) {
        if options.is_null() {
            return;
        }
        match StoreHydrationOptions::deserialize(options) {
            Ok(parsed) => *self.options.write() = parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid store hydration options, keeping defaults");
            }
        }
    }

    fn before_create(&self, ctx: &mut RenderContext, app: &AppOptions) -> Result<(), PluginError> {
        match &app.store {
            Some(store) => ctx.store = Some(store.clone()),
            None => {
                if !self.missing_store_warned.swap(true, Ordering::Relaxed) {
                    tracing::warn!("Store hydration plugin installed but no store provided");
                }
            }
        }
        Ok(())
    }

    async fn before_start(&self, ctx: &mut RenderContext) -> Result<(), PluginError> {
        let Some(store) = ctx.store.clone() else {
            return Ok(());
        };

        if let Some(state) = ctx.payload.as_ref().and_then(|p| p.get("state")) {
            store.replace_state(state.clone());
        }

        let dispatch = self.options.read().on_http_request;
        if dispatch && store.has_action(ON_HTTP_REQUEST) {
            store.dispatch(ON_HTTP_REQUEST, ctx).await?;
        }
        Ok(())
    }

    async fn route_resolve(&self, ctx: &mut RenderContext) -> Result<(), PluginError> {
        if ctx.store.is_none() || !self.options.read().fetch {
            return Ok(());
        }

        let components = ctx.route_components.clone();
        let shared: &RenderContext = ctx;
        try_join_all(components.iter().map(|c| c.fetch(shared))).await?;
        Ok(())
    }

    fn send_ssr_data(&self, ctx: &mut RenderContext) -> Result<(), PluginError> {
        if let Some(store) = &ctx.store {
            ctx.ssr.set("state", store.state());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    use crate::plugin::context::DataStore;

    struct FakeStore {
        state: Mutex<Value>,
        dispatched: Mutex<Vec<String>>,
    }

    impl FakeStore {
        fn new(state: Value) -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(state),
                dispatched: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DataStore for FakeStore {
        fn state(&self) -> Value {
            self.state.lock().clone()
        }

        fn replace_state(&self, state: Value) {
            *self.state.lock() = state;
        }

        fn has_action(&self, name: &str) -> bool {
            name == ON_HTTP_REQUEST
        }

        async fn dispatch(&self, action: &str, _ctx: &RenderContext) -> Result<(), PluginError> {
            self.dispatched.lock().push(action.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn hydrates_then_dispatches_then_snapshots() {
        let store = FakeStore::new(json!({ "count": 0 }));
        let plugin = StoreHydrationPlugin::new();
        let app = AppOptions {
            store: Some(store.clone()),
        };

        let mut ctx = RenderContext::new("/", "req-1");
        ctx.payload = Some(json!({ "state": { "count": 7 } }));

        plugin.before_create(&mut ctx, &app).unwrap();
        plugin.before_start(&mut ctx).await.unwrap();
        plugin.send_ssr_data(&mut ctx).unwrap();

        assert_eq!(store.state(), json!({ "count": 7 }));
        assert_eq!(*store.dispatched.lock(), vec![ON_HTTP_REQUEST.to_string()]);
        assert_eq!(ctx.ssr.data.get("state"), Some(&json!({ "count": 7 })));
    }

    #[tokio::test]
    async fn missing_store_makes_hooks_noop() {
        let plugin = StoreHydrationPlugin::new();
        let mut ctx = RenderContext::new("/", "req-1");

        plugin
            .before_create(&mut ctx, &AppOptions::default())
            .unwrap();
        plugin.before_start(&mut ctx).await.unwrap();
        plugin.send_ssr_data(&mut ctx).unwrap();

        assert!(ctx.store.is_none());
        assert!(ctx.ssr.data.is_empty());
    }

    #[test]
    fn install_parses_options() {
        let plugin = StoreHydrationPlugin::new();
        struct NullApi;
        impl ServerApi for NullApi {
            fn use_middleware(&self, _m: Arc<dyn crate::adapter::Middleware>) {}
            fn use_middleware_at(&self, _p: &str, _m: Arc<dyn crate::adapter::Middleware>) {}
            fn options(&self) -> &crate::config::ServerOptions {
                unimplemented!("not needed by this plugin")
            }
        }

        plugin.install(&NullApi, &json!({ "fetch": true, "on_http_request": false }));

        let options = plugin.options.read().clone();
        assert!(options.fetch);
        assert!(!options.on_http_request);
    }
}
