//! Pluggable server-side-rendering host library.

pub mod adapter;
pub mod artifacts;
pub mod config;
pub mod dev;
pub mod lifecycle;
pub mod observability;
pub mod plugin;
pub mod renderer;
pub mod server;

pub use adapter::{HttpAdapter, Middleware, MiddlewareOutcome};
pub use artifacts::RenderArtifacts;
pub use config::ServerOptions;
pub use lifecycle::Shutdown;
pub use plugin::{RenderContext, ServerPlugin};
pub use server::Server;
