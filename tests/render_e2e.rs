//! End-to-end rendering through the default Axum adapter.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use ssr_host::plugin::hooks::PluginError;
use ssr_host::plugin::{DataStore, RenderContext, StoreHydrationPlugin};
use ssr_host::Server;

mod common;
use common::production_options;

struct CounterStore {
    state: Mutex<Value>,
}

#[async_trait]
impl DataStore for CounterStore {
    fn state(&self) -> Value {
        self.state.lock().clone()
    }

    fn replace_state(&self, state: Value) {
        *self.state.lock() = state;
    }

    fn has_action(&self, name: &str) -> bool {
        name == "on_http_request"
    }

    async fn dispatch(&self, _action: &str, ctx: &RenderContext) -> Result<(), PluginError> {
        *self.state.lock() = json!({ "url": ctx.url });
        Ok(())
    }
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}

#[tokio::test]
async fn serves_hydratable_page_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = production_options(dir.path());
    options.http.port = 0;

    let server = Server::new(options).unwrap();
    server.add_plugin(Arc::new(StoreHydrationPlugin::new()), Value::Null);
    server.set_store(Arc::new(CounterStore {
        state: Mutex::new(Value::Null),
    }));

    server.start().await.unwrap();
    let port = server.adapter().port();

    let body = http_client()
        .get(format!("http://127.0.0.1:{}/products?page=2", port))
        .send()
        .await
        .expect("host unreachable")
        .text()
        .await
        .unwrap();

    assert!(body.contains("<div id=\"app\"></div>"));
    assert!(body.contains("window.__DATA__"));
    assert!(body.contains("/products?page=2"));
    assert!(body.contains("src=\"/app.js\""));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn spa_paths_bypass_server_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = production_options(dir.path());
    options.http.port = 0;
    options.renderer.spa_paths = vec!["/admin".to_string()];

    let server = Server::new(options).unwrap();
    server.start().await.unwrap();
    let port = server.adapter().port();

    let body = http_client()
        .get(format!("http://127.0.0.1:{}/admin/users", port))
        .send()
        .await
        .expect("host unreachable")
        .text()
        .await
        .unwrap();

    assert_eq!(body, "<html><body>spa</body></html>");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn middleware_runs_before_the_renderer() {
    struct Teapot;

    #[async_trait]
    impl ssr_host::Middleware for Teapot {
        async fn handle(
            &self,
            req: axum::http::Request<axum::body::Body>,
        ) -> ssr_host::MiddlewareOutcome {
            if req.uri().path() == "/teapot" {
                ssr_host::MiddlewareOutcome::Respond(
                    axum::response::IntoResponse::into_response(
                        axum::http::StatusCode::IM_A_TEAPOT,
                    ),
                )
            } else {
                ssr_host::MiddlewareOutcome::Continue(req)
            }
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let mut options = production_options(dir.path());
    options.http.port = 0;

    let server = Server::new(options).unwrap();
    server.use_middleware(Arc::new(Teapot));
    server.start().await.unwrap();
    let port = server.adapter().port();

    let status = http_client()
        .get(format!("http://127.0.0.1:{}/teapot", port))
        .send()
        .await
        .expect("host unreachable")
        .status();
    assert_eq!(status, reqwest::StatusCode::IM_A_TEAPOT);

    let status = http_client()
        .get(format!("http://127.0.0.1:{}/other", port))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::OK);

    server.stop().await.unwrap();
}
