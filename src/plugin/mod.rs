//! Plugin and hook subsystem.
//!
//! # Data Flow
//! ```text
//! add_plugin(plugin, options)
//!     → registry appends in registration order, install() runs once
//!
//! per render:
//!     before_create → before_start → route_resolve → render → send_ssr_data
//!     each hook sees mutations made by earlier plugins in the same call
//! ```
//!
//! # Design Decisions
//! - Hook names are a closed set: sync hooks and awaited hooks are separate
//!   enums, so presence checks are a trait-default body, not reflection
//! - Invocation order is strictly registration order, no priorities
//! - A failing hook aborts the remaining invocations for that call

pub mod context;
pub mod hooks;
pub mod registry;
pub mod store;

pub use context::{AppOptions, DataStore, RenderContext, RouteComponent, RouteResolver, SsrData};
pub use hooks::{AsyncHook, PluginError, ServerApi, ServerPlugin, SyncHook};
pub use registry::{PluginRegistration, PluginRegistry};
pub use store::StoreHydrationPlugin;
