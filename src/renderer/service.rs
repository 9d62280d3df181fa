//! Terminal render middleware.
//!
//! Drives the hook-registry render cycle for each request:
//! `before_create → before_start → route_resolve → markup → send_ssr_data →
//! assembly`. Hook failures fail the single render, never the server.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use async_trait::async_trait;
use uuid::Uuid;

use crate::adapter::RenderHandler;
use crate::plugin::context::{AppOptions, RenderContext, RouteResolver};
use crate::plugin::hooks::{AsyncHook, SyncHook};
use crate::plugin::registry::PluginRegistry;
use crate::renderer::{RenderError, Renderer, RendererSlot};

enum RenderOutcome {
    Page(String),
    Redirect(String),
}

/// Hook-driven terminal middleware over the current renderer snapshot.
pub struct RenderService {
    registry: Arc<PluginRegistry>,
    renderer: RendererSlot,
    app: Arc<AppOptions>,
    resolver: Option<Arc<dyn RouteResolver>>,
}

impl RenderService {
    pub fn new(
        registry: Arc<PluginRegistry>,
        renderer: RendererSlot,
        app: Arc<AppOptions>,
        resolver: Option<Arc<dyn RouteResolver>>,
    ) -> Self {
        Self {
            registry,
            renderer,
            app,
            resolver,
        }
    }

    async fn render_cycle(
        &self,
        renderer: &Renderer,
        url: &str,
        request_id: String,
    ) -> Result<RenderOutcome, RenderError> {
        let mut ctx = RenderContext::new(url, request_id);

        self.registry
            .invoke(SyncHook::BeforeCreate, &mut ctx, &self.app)?;
        self.registry
            .invoke_async(AsyncHook::BeforeStart, &mut ctx)
            .await?;
        if let Some(location) = ctx.redirect.take() {
            return Ok(RenderOutcome::Redirect(location));
        }

        if let Some(resolver) = &self.resolver {
            ctx.route_components = resolver.resolve(url);
        }
        self.registry
            .invoke_async(AsyncHook::RouteResolve, &mut ctx)
            .await?;
        if let Some(location) = ctx.redirect.take() {
            return Ok(RenderOutcome::Redirect(location));
        }

        let markup = renderer.render_app_markup(&ctx).await?;
        self.registry
            .invoke(SyncHook::SendSsrData, &mut ctx, &self.app)?;

        Ok(RenderOutcome::Page(renderer.assemble(&markup, &ctx)?))
    }
}

#[async_trait]
impl RenderHandler for RenderService {
    async fn render(&self, req: Request<Body>) -> Response {
        let Some(renderer) = self.renderer.load_full() else {
            return (StatusCode::SERVICE_UNAVAILABLE, "Renderer not ready").into_response();
        };

        let path = req.uri().path().to_string();
        if renderer.matches_spa(&path) {
            return Html(renderer.render_spa()).into_response();
        }

        let url = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or(path);
        let request_id = req
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        match self.render_cycle(&renderer, &url, request_id.clone()).await {
            Ok(RenderOutcome::Page(html)) => Html(html).into_response(),
            Ok(RenderOutcome::Redirect(location)) => Redirect::temporary(&location).into_response(),
            Err(e) => {
                tracing::error!(request_id = %request_id, url = %url, error = %e, "Render failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Render failed").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_swap::ArcSwapOption;
    use serde_json::{json, Value};

    use crate::artifacts::{RenderArtifacts, Templates};
    use crate::config::schema::RendererConfig;
    use crate::plugin::hooks::{PluginError, ServerPlugin};
    use crate::renderer::ShellEngine;

    fn slot_with_renderer() -> RendererSlot {
        let artifacts = Arc::new(RenderArtifacts {
            server_bundle: json!(null),
            client_manifest: json!(null),
            templates: Templates {
                spa: "<html>spa</html>".to_string(),
                ssr: "<html><body><!--ssr-outlet--></body></html>".to_string(),
            },
        });
        let renderer = Renderer::new(
            artifacts,
            RendererConfig::default(),
            Arc::new(ShellEngine::default()),
        );
        Arc::new(ArcSwapOption::from(Some(Arc::new(renderer))))
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    struct PayloadPlugin;

    #[async_trait]
    impl ServerPlugin for PayloadPlugin {
        fn name(&self) -> &'static str {
            "payload"
        }

        fn send_ssr_data(&self, ctx: &mut RenderContext) -> Result<(), PluginError> {
            ctx.ssr.set("marker", Value::from("present"));
            Ok(())
        }
    }

    struct FailingPlugin;

    #[async_trait]
    impl ServerPlugin for FailingPlugin {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn before_start(&self, _ctx: &mut RenderContext) -> Result<(), PluginError> {
            Err(PluginError::Hook("boom".to_string()))
        }
    }

    struct RedirectPlugin;

    #[async_trait]
    impl ServerPlugin for RedirectPlugin {
        fn name(&self) -> &'static str {
            "redirect"
        }

        async fn before_start(&self, ctx: &mut RenderContext) -> Result<(), PluginError> {
            ctx.redirect = Some("/login".to_string());
            Ok(())
        }
    }

    fn service(registry: PluginRegistry) -> RenderService {
        RenderService::new(
            Arc::new(registry),
            slot_with_renderer(),
            Arc::new(AppOptions::default()),
            None,
        )
    }

    #[tokio::test]
    async fn renders_page_with_plugin_payload() {
        let registry = PluginRegistry::new();
        registry.add(Arc::new(PayloadPlugin), Value::Null);
        let service = service(registry);

        let response = service.render(get("/page")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("\"marker\":\"present\""));
    }

    #[tokio::test]
    async fn hook_failure_fails_only_that_render() {
        let registry = PluginRegistry::new();
        registry.add(Arc::new(FailingPlugin), Value::Null);
        let service = service(registry);

        let response = service.render(get("/page")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn redirect_short_circuits_rendering() {
        let registry = PluginRegistry::new();
        registry.add(Arc::new(RedirectPlugin), Value::Null);
        let service = service(registry);

        let response = service.render(get("/account")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn empty_slot_is_unavailable() {
        let service = RenderService::new(
            Arc::new(PluginRegistry::new()),
            Arc::new(ArcSwapOption::empty()),
            Arc::new(AppOptions::default()),
            None,
        );

        let response = service.render(get("/")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
