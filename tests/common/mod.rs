//! Shared fakes for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use ssr_host::adapter::{AdapterError, HttpAdapter, Middleware, RenderHandler};
use ssr_host::config::schema::DevOptions;
use ssr_host::config::ServerOptions;
use ssr_host::dev::{BundleCompiler, CompileError, CompileEvent, MemoryFs};

/// Adapter that records lifecycle calls instead of serving traffic.
pub struct FakeAdapter {
    events: Mutex<Vec<String>>,
    fail_start: bool,
}

impl FakeAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            fail_start: false,
        })
    }

    #[allow(dead_code)]
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            fail_start: true,
        })
    }

    pub fn log(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl HttpAdapter for FakeAdapter {
    fn create_app(&self, _args: &Value) -> Result<(), AdapterError> {
        self.events.lock().push("create_app".to_string());
        Ok(())
    }

    fn use_middleware(&self, _middleware: Arc<dyn Middleware>) {
        self.events.lock().push("use".to_string());
    }

    fn use_middleware_at(&self, path: &str, _middleware: Arc<dyn Middleware>) {
        self.events.lock().push(format!("use:{}", path));
    }

    fn setup_renderer(&self, _renderer: Arc<dyn RenderHandler>) {
        self.events.lock().push("setup_renderer".to_string());
    }

    async fn start(&self) -> Result<SocketAddr, AdapterError> {
        if self.fail_start {
            return Err(AdapterError::Bind(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "address in use",
            )));
        }
        self.events.lock().push("start".to_string());
        Ok("127.0.0.1:0".parse().unwrap())
    }

    async fn stop(&self) -> Result<(), AdapterError> {
        self.events.lock().push("stop".to_string());
        Ok(())
    }

    fn is_https(&self) -> bool {
        false
    }

    fn host(&self) -> String {
        "127.0.0.1".to_string()
    }

    fn port(&self) -> u16 {
        0
    }
}

/// Handles a [`ScriptedCompiler`] hands back to the test once started.
#[allow(dead_code)]
pub struct CompilerHandles {
    pub vfs: Arc<MemoryFs>,
    pub events: mpsc::UnboundedSender<CompileEvent>,
}

/// Compiler the test drives by hand: it only exposes the virtual
/// filesystem and event channel it was started with.
pub struct ScriptedCompiler {
    handles: Arc<Mutex<Option<CompilerHandles>>>,
}

impl ScriptedCompiler {
    #[allow(dead_code)]
    pub fn new() -> (Box<Self>, Arc<Mutex<Option<CompilerHandles>>>) {
        let handles = Arc::new(Mutex::new(None));
        (
            Box::new(Self {
                handles: handles.clone(),
            }),
            handles,
        )
    }
}

impl BundleCompiler for ScriptedCompiler {
    fn start(
        self: Box<Self>,
        _dev: DevOptions,
        output: Arc<MemoryFs>,
        events: mpsc::UnboundedSender<CompileEvent>,
    ) -> Result<(), CompileError> {
        *self.handles.lock() = Some(CompilerHandles {
            vfs: output,
            events,
        });
        Ok(())
    }
}

/// Wait until the scripted compiler has been started by the pipeline.
#[allow(dead_code)]
pub async fn wait_for_handles(handles: &Arc<Mutex<Option<CompilerHandles>>>) {
    for _ in 0..100 {
        if handles.lock().is_some() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("compiler was never started");
}

/// Write a complete production build into `dir` and return options using it.
#[allow(dead_code)]
pub fn production_options(dir: &Path) -> ServerOptions {
    let mut options = ServerOptions::default();
    options.paths.output_dir = dir.to_path_buf();

    std::fs::write(
        dir.join(&options.paths.client_manifest),
        r#"{ "publicPath": "/", "initial": ["app.js"] }"#,
    )
    .unwrap();
    std::fs::write(
        dir.join(&options.paths.server_bundle),
        r#"{ "entry": "server" }"#,
    )
    .unwrap();
    std::fs::write(dir.join(&options.paths.templates.spa), "<html><body>spa</body></html>").unwrap();
    std::fs::write(
        dir.join(&options.paths.templates.ssr),
        "<html><head></head><body><!--ssr-outlet--></body></html>",
    )
    .unwrap();

    options
}
