//! Artifact value types.

use serde_json::Value;

/// HTML template strings for both render modes.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    /// Served without server rendering.
    pub spa: String,
    /// Rendered markup is injected into this one.
    pub ssr: String,
}

/// The three immutable inputs a renderer needs.
///
/// One consistent triple per build generation; consumers hold it behind an
/// `Arc` and swaps are whole-snapshot reassignments.
#[derive(Debug, Clone)]
pub struct RenderArtifacts {
    /// Compiled server bundle.
    pub server_bundle: Value,
    /// Client asset manifest.
    pub client_manifest: Value,
    /// SPA and SSR templates.
    pub templates: Templates,
}
