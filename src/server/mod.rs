//! Server lifecycle controller.
//!
//! # Data Flow
//! ```text
//! new(options)
//!     → default adapter fill → create_app → logger init
//! start()
//!     → dev or prod artifact path → renderer built
//!     → renderer installed as terminal middleware (after all others)
//!     → adapter bind → started = true → signal handlers installed
//! stop()
//!     → no-op when not started
//!     → signal handlers removed → shutdown broadcast → adapter drains
//! ```
//!
//! # Design Decisions
//! - `start()` is single-shot; calling it on a started server is a caller
//!   error, while `stop()` is always safe to call
//! - Renderer installation happens-after artifact readiness and
//!   happens-before adapter bind
//! - Dev rebuilds swap the renderer snapshot; in-flight renders finish on
//!   the snapshot they loaded

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::adapter::{AdapterError, AxumAdapter, HttpAdapter, Middleware};
use crate::artifacts::provider::{built_files, ArtifactError};
use crate::config::loader::ConfigError;
use crate::config::schema::{LogFormat, ServerOptions};
use crate::config::validation::validate_options;
use crate::dev::compiler::BundleCompiler;
use crate::dev::pipeline::{setup_dev_pipeline, BuildCallback, DevError};
use crate::dev::CommandCompiler;
use crate::lifecycle::signals::spawn_signal_task;
use crate::lifecycle::Shutdown;
use crate::observability::logging;
use crate::plugin::context::{AppOptions, DataStore, RouteResolver};
use crate::plugin::hooks::{ServerApi, ServerPlugin};
use crate::plugin::registry::PluginRegistry;
use crate::renderer::{RenderEngine, RenderService, Renderer, RendererSlot, ShellEngine};

/// Fatal server error.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Artifacts(#[from] ArtifactError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Dev(#[from] DevError),

    #[error("server already started")]
    AlreadyStarted,
}

/// The long-lived aggregate root owning adapter, plugins, and renderer.
pub struct Server {
    options: Arc<ServerOptions>,
    adapter: Arc<dyn HttpAdapter>,
    registry: Arc<PluginRegistry>,
    renderer: RendererSlot,
    app: Mutex<AppOptions>,
    engine: Mutex<Arc<dyn RenderEngine>>,
    resolver: Mutex<Option<Arc<dyn RouteResolver>>>,
    compiler: Mutex<Option<Box<dyn BundleCompiler>>>,
    shutdown: Shutdown,
    signal_task: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Construct a server with the default HTTP adapter.
    pub fn new(options: ServerOptions) -> Result<Self, ServerError> {
        let adapter: Arc<dyn HttpAdapter> = Arc::new(AxumAdapter::new(options.http.clone()));
        Self::with_adapter(options, adapter)
    }

    /// Construct a server on a caller-supplied adapter.
    pub fn with_adapter(
        options: ServerOptions,
        adapter: Arc<dyn HttpAdapter>,
    ) -> Result<Self, ServerError> {
        validate_options(&options).map_err(ConfigError::Validation)?;

        let format = options.logger.format.unwrap_or(if options.dev.is_some() {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        });
        logging::init(&options.logger, format);

        adapter.create_app(&options.adapter_args)?;

        Ok(Self {
            options: Arc::new(options),
            adapter,
            registry: Arc::new(PluginRegistry::new()),
            renderer: Arc::new(ArcSwapOption::empty()),
            app: Mutex::new(AppOptions::default()),
            engine: Mutex::new(Arc::new(ShellEngine::default())),
            resolver: Mutex::new(None),
            compiler: Mutex::new(None),
            shutdown: Shutdown::new(),
            signal_task: Mutex::new(None),
            started: AtomicBool::new(false),
        })
    }

    /// Server options, read-only.
    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    /// The HTTP adapter.
    pub fn adapter(&self) -> &Arc<dyn HttpAdapter> {
        &self.adapter
    }

    /// The renderer slot shared with the terminal middleware.
    pub fn renderer_slot(&self) -> RendererSlot {
        self.renderer.clone()
    }

    /// The hook registry driving the render pipeline.
    pub fn plugins(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Whether `start()` has completed and `stop()` has not.
    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Set the application data store passed to plugins at `before_create`.
    pub fn set_store(&self, store: Arc<dyn DataStore>) {
        self.app.lock().store = Some(store);
    }

    /// Replace the render engine. Defaults to the hydration shell engine.
    pub fn set_engine(&self, engine: Arc<dyn RenderEngine>) {
        *self.engine.lock() = engine;
    }

    /// Set the route resolver populating context components per request.
    pub fn set_route_resolver(&self, resolver: Arc<dyn RouteResolver>) {
        *self.resolver.lock() = Some(resolver);
    }

    /// Inject a development compiler. Defaults to the command compiler.
    pub fn set_compiler(&self, compiler: Box<dyn BundleCompiler>) {
        *self.compiler.lock() = Some(compiler);
    }

    /// Register a plugin. Must be called before `start()` for the plugin to
    /// observe every lifecycle hook.
    pub fn add_plugin(&self, plugin: Arc<dyn ServerPlugin>, options: Value) -> &Self {
        self.registry.add(plugin.clone(), options.clone());
        plugin.install(self, &options);
        self
    }

    /// Register a middleware behind every route.
    pub fn use_middleware(&self, middleware: Arc<dyn Middleware>) -> &Self {
        self.adapter.use_middleware(middleware);
        self
    }

    /// Register a middleware for a path prefix.
    pub fn use_middleware_at(&self, path: &str, middleware: Arc<dyn Middleware>) -> &Self {
        self.adapter.use_middleware_at(path, middleware);
        self
    }

    /// Start the server.
    ///
    /// Resolves once the adapter is accepting connections. Fails if
    /// artifact retrieval fails or the adapter cannot bind.
    pub async fn start(&self) -> Result<(), ServerError> {
        if self.started() {
            return Err(ServerError::AlreadyStarted);
        }

        let engine = self.engine.lock().clone();

        if let Some(dev) = &self.options.dev {
            let compiler = self
                .compiler
                .lock()
                .take()
                .unwrap_or_else(|| Box::new(CommandCompiler::new()));

            let slot = self.renderer.clone();
            let renderer_config = self.options.renderer.clone();
            let build_engine = engine.clone();
            let callback: BuildCallback = Box::new(move |artifacts| {
                let renderer = Renderer::new(
                    Arc::new(artifacts),
                    renderer_config.clone(),
                    build_engine.clone(),
                );
                slot.store(Some(Arc::new(renderer)));
            });

            setup_dev_pipeline(
                &self.options.paths,
                dev,
                self.adapter.as_ref(),
                compiler,
                callback,
                &self.shutdown,
            )
            .await?;
        } else {
            let artifacts = built_files(&self.options.paths)?;
            let renderer = Renderer::new(
                Arc::new(artifacts),
                self.options.renderer.clone(),
                engine.clone(),
            );
            self.renderer.store(Some(Arc::new(renderer)));
        }

        // Terminal middleware goes in last, after user, plugin, and dev
        // middleware, so application middleware always runs first.
        let service = RenderService::new(
            self.registry.clone(),
            self.renderer.clone(),
            Arc::new(self.app.lock().clone()),
            self.resolver.lock().clone(),
        );
        self.adapter.setup_renderer(Arc::new(service));

        self.adapter.start().await?;
        self.started.store(true, Ordering::SeqCst);

        tracing::info!(uri = %self.listen_uri(), "Server listening");

        *self.signal_task.lock() = Some(spawn_signal_task(
            self.adapter.clone(),
            self.shutdown.clone(),
        ));

        Ok(())
    }

    /// Stop the server. No-op when not started.
    pub async fn stop(&self) -> Result<(), ServerError> {
        if !self.started.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        tracing::info!("Stopping server");

        // Remove the signal handlers so a later start does not stack them.
        if let Some(task) = self.signal_task.lock().take() {
            task.abort();
        }

        self.shutdown.trigger();
        self.adapter.stop().await?;
        Ok(())
    }

    /// Block until shutdown is triggered by `stop()` or a signal.
    pub async fn wait_shutdown(&self) {
        let mut rx = self.shutdown.subscribe();
        let _ = rx.recv().await;
    }

    fn listen_uri(&self) -> String {
        let scheme = if self.adapter.is_https() {
            "https"
        } else {
            "http"
        };
        format!(
            "{}://{}:{}",
            scheme,
            self.adapter.host(),
            self.adapter.port()
        )
    }
}

impl ServerApi for Server {
    fn use_middleware(&self, middleware: Arc<dyn Middleware>) {
        self.adapter.use_middleware(middleware);
    }

    fn use_middleware_at(&self, path: &str, middleware: Arc<dyn Middleware>) {
        self.adapter.use_middleware_at(path, middleware);
    }

    fn options(&self) -> &ServerOptions {
        &self.options
    }
}
