//! Renderer subsystem.
//!
//! # Data Flow
//! ```text
//! RenderArtifacts + renderer options
//!     → Renderer (one immutable snapshot per build generation)
//!     → engine produces application markup
//!     → template assembly: outlet substitution, asset tags, payload
//! ```
//!
//! # Design Decisions
//! - The renderer holds exactly one artifact snapshot; rebuilds swap the
//!   whole renderer through [`RendererSlot`], never mutate it in place
//! - Application markup generation is delegated to a [`RenderEngine`]
//!   collaborator; the default emits the bare mount point and leaves the
//!   page to client hydration

pub mod payload;
pub mod service;

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::artifacts::RenderArtifacts;
use crate::config::schema::RendererConfig;
use crate::plugin::context::RenderContext;
use crate::plugin::hooks::PluginError;

pub use service::RenderService;

/// Atomically swapped renderer slot shared between the server and the
/// terminal middleware. In-flight renders keep the snapshot they loaded.
pub type RendererSlot = Arc<ArcSwapOption<Renderer>>;

/// Error during a render cycle.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The render engine failed to produce markup.
    #[error("render engine failed: {0}")]
    Engine(String),

    /// A plugin hook failed during the cycle.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Payload serialization failed.
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Produces application markup from the compiled server bundle.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn render_app(
        &self,
        server_bundle: &Value,
        ctx: &RenderContext,
    ) -> Result<String, RenderError>;
}

/// Default engine: emits the application mount point and defers content to
/// client hydration.
pub struct ShellEngine {
    mount_id: String,
}

impl ShellEngine {
    pub fn new(mount_id: impl Into<String>) -> Self {
        Self {
            mount_id: mount_id.into(),
        }
    }
}

impl Default for ShellEngine {
    fn default() -> Self {
        Self::new("app")
    }
}

#[async_trait]
impl RenderEngine for ShellEngine {
    async fn render_app(
        &self,
        _server_bundle: &Value,
        _ctx: &RenderContext,
    ) -> Result<String, RenderError> {
        Ok(format!("<div id=\"{}\"></div>", self.mount_id))
    }
}

/// Turns one artifact snapshot plus a request context into response HTML.
pub struct Renderer {
    artifacts: Arc<RenderArtifacts>,
    config: RendererConfig,
    engine: Arc<dyn RenderEngine>,
}

impl Renderer {
    pub fn new(
        artifacts: Arc<RenderArtifacts>,
        config: RendererConfig,
        engine: Arc<dyn RenderEngine>,
    ) -> Self {
        Self {
            artifacts,
            config,
            engine,
        }
    }

    /// The artifact snapshot this renderer was built from.
    pub fn artifacts(&self) -> &Arc<RenderArtifacts> {
        &self.artifacts
    }

    /// Whether the path is served from the SPA template.
    pub fn matches_spa(&self, path: &str) -> bool {
        self.config
            .spa_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Produce the application markup for this request.
    pub async fn render_app_markup(&self, ctx: &RenderContext) -> Result<String, RenderError> {
        self.engine
            .render_app(&self.artifacts.server_bundle, ctx)
            .await
    }

    /// Assemble the full document around already-rendered markup.
    pub fn assemble(&self, markup: &str, ctx: &RenderContext) -> Result<String, RenderError> {
        let mut html = self
            .artifacts
            .templates
            .ssr
            .replace(&self.config.outlet, markup);

        let assets = payload::asset_tags(&self.artifacts.client_manifest);
        if !assets.styles.is_empty() {
            html = inject_before(html, "</head>", &assets.styles);
        }

        let data_script = payload::hydration_script(&self.config.data_global, &ctx.ssr)?;
        let tail = format!("{}{}", data_script, assets.scripts);
        html = inject_before(html, "</body>", &tail);

        Ok(html)
    }

    /// Full render: markup then assembly, without firing any hooks.
    pub async fn render(&self, ctx: &RenderContext) -> Result<String, RenderError> {
        let markup = self.render_app_markup(ctx).await?;
        self.assemble(&markup, ctx)
    }

    /// The SPA template, served verbatim.
    pub fn render_spa(&self) -> String {
        self.artifacts.templates.spa.clone()
    }
}

/// Insert `content` before `marker`, or append when the marker is absent.
fn inject_before(mut html: String, marker: &str, content: &str) -> String {
    match html.find(marker) {
        Some(index) => {
            html.insert_str(index, content);
            html
        }
        None => {
            html.push_str(content);
            html
        }
    }
}
