//! Ordered plugin registry and hook invocation.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::plugin::context::{AppOptions, RenderContext};
use crate::plugin::hooks::{AsyncHook, PluginError, ServerPlugin, SyncHook};

/// One registered plugin with its options.
#[derive(Clone)]
pub struct PluginRegistration {
    /// The plugin instance.
    pub plugin: Arc<dyn ServerPlugin>,
    /// Options it was registered with.
    pub options: Value,
}

/// Stores plugins in registration order and invokes hooks on each.
///
/// Registration order is the invocation order for every hook; later plugins
/// may depend on context state earlier plugins set.
pub struct PluginRegistry {
    entries: RwLock<Vec<PluginRegistration>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append a plugin. Must happen before the server starts for the plugin
    /// to observe every subsequent lifecycle hook.
    pub fn add(&self, plugin: Arc<dyn ServerPlugin>, options: Value) {
        self.entries.write().push(PluginRegistration { plugin, options });
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the registrations, in order.
    pub fn registrations(&self) -> Vec<PluginRegistration> {
        self.entries.read().clone()
    }

    /// Call a synchronous hook on each plugin, in registration order.
    ///
    /// The first error aborts the remaining invocations and propagates.
    pub fn invoke(
        &self,
        hook: SyncHook,
        ctx: &mut RenderContext,
        app: &AppOptions,
    ) -> Result<(), PluginError> {
        for entry in self.registrations() {
            match hook {
                SyncHook::BeforeCreate => entry.plugin.before_create(ctx, app)?,
                SyncHook::SendSsrData => entry.plugin.send_ssr_data(ctx)?,
            }
        }
        Ok(())
    }

    /// Call an awaited hook on each plugin, in registration order.
    ///
    /// Each plugin's hook fully resolves before the next begins, so a later
    /// plugin always observes side effects of an earlier one. The first
    /// error aborts the remaining invocations and propagates.
    pub async fn invoke_async(
        &self,
        hook: AsyncHook,
        ctx: &mut RenderContext,
    ) -> Result<(), PluginError> {
        for entry in self.registrations() {
            match hook {
                AsyncHook::BeforeStart => entry.plugin.before_start(ctx).await?,
                AsyncHook::RouteResolve => entry.plugin.route_resolve(ctx).await?,
            }
        }
        Ok(())
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
