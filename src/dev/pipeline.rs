//! Development pipeline orchestration.
//!
//! Provides the same `RenderArtifacts` shape as the production provider,
//! sourced from a continuously-recompiling in-memory build, and resolves
//! only once the first full build is available.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::adapter::HttpAdapter;
use crate::artifacts::{RenderArtifacts, Templates};
use crate::config::schema::{DevOptions, PathsConfig};
use crate::dev::compiler::{BundleCompiler, CompileError, CompileEvent, CompileStats};
use crate::dev::middleware::{AssetMiddleware, HotUpdate, HotUpdateMiddleware};
use crate::dev::vfs::MemoryFs;
use crate::lifecycle::Shutdown;

/// Entry injected into the client bundle for hot reloading.
pub const HOT_CLIENT_ENTRY: &str = "ssr-host/hot-client";

/// Stable client output filename, so the virtual filesystem can be re-read
/// by fixed path across rebuilds.
pub const DEV_CLIENT_FILENAME: &str = "app.js";

/// Invoked with fresh artifacts on the first and every later usable build.
pub type BuildCallback = Box<dyn Fn(RenderArtifacts) + Send + Sync>;

/// Build phase observed by the asset middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Building,
    Ready,
}

/// Error type for the development pipeline.
#[derive(Debug, Error)]
pub enum DevError {
    /// The compiler failed before the first usable build.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The pipeline shut down before the first build completed.
    #[error("development pipeline closed before the first build completed")]
    ClosedBeforeReady,
}

/// Set up the development pipeline on the adapter.
///
/// Resolves after the first build with both the client manifest and the
/// server bundle present. Every later usable build re-invokes `callback`
/// so the caller can swap in a fresh renderer.
pub async fn setup_dev_pipeline(
    paths: &PathsConfig,
    dev: &DevOptions,
    adapter: &dyn HttpAdapter,
    compiler: Box<dyn BundleCompiler>,
    callback: BuildCallback,
    shutdown: &Shutdown,
) -> Result<(), DevError> {
    // Hot-reload entry goes first; output filename is pinned so rebuilds
    // land on the same virtual path.
    let mut dev = dev.clone();
    if !dev.client.entry.iter().any(|e| e == HOT_CLIENT_ENTRY) {
        dev.client.entry.insert(0, HOT_CLIENT_ENTRY.to_string());
    }
    dev.client.output_filename = DEV_CLIENT_FILENAME.to_string();

    let vfs = Arc::new(MemoryFs::new());
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let (phase_tx, phase_rx) = watch::channel(BuildPhase::Building);
    let (hot_tx, _) = broadcast::channel(16);

    adapter.use_middleware(Arc::new(AssetMiddleware::new(
        vfs.clone(),
        dev.client.public_path.clone(),
        phase_rx,
    )));
    adapter.use_middleware(Arc::new(HotUpdateMiddleware::new(
        dev.hot_path.clone(),
        hot_tx.clone(),
        Duration::from_secs(dev.heartbeat_secs),
    )));

    compiler.start(dev.clone(), vfs.clone(), events_tx)?;

    let (ready_tx, ready_rx) = oneshot::channel();
    spawn_event_loop(EventLoop {
        paths: paths.clone(),
        vfs,
        events_rx,
        phase_tx,
        hot_tx,
        callback,
        ready_tx: Some(ready_tx),
        generation: 0,
        shutdown: shutdown.subscribe(),
    });

    ready_rx.await.map_err(|_| DevError::ClosedBeforeReady)?
}

struct EventLoop {
    paths: PathsConfig,
    vfs: Arc<MemoryFs>,
    events_rx: mpsc::UnboundedReceiver<CompileEvent>,
    phase_tx: watch::Sender<BuildPhase>,
    hot_tx: broadcast::Sender<HotUpdate>,
    callback: BuildCallback,
    /// Taken on the first usable build; the readiness gate opens once.
    ready_tx: Option<oneshot::Sender<Result<(), DevError>>>,
    generation: u64,
    shutdown: broadcast::Receiver<()>,
}

fn spawn_event_loop(mut state: EventLoop) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = state.events_rx.recv() => {
                    let Some(event) = event else {
                        tracing::debug!("Compiler event channel closed");
                        break;
                    };
                    if !state.handle_event(event) {
                        break;
                    }
                }
                _ = state.shutdown.recv() => {
                    tracing::debug!("Development pipeline shutting down");
                    break;
                }
            }
        }
    });
}

impl EventLoop {
    /// Returns false when the pipeline should stop.
    fn handle_event(&mut self, event: CompileEvent) -> bool {
        match event {
            CompileEvent::Invalidated => {
                let _ = self.phase_tx.send(BuildPhase::Building);
                true
            }
            CompileEvent::ClientDone(stats) => {
                log_stats("client", &stats);
                self.try_publish();
                true
            }
            CompileEvent::ServerDone(Ok(stats)) => {
                log_stats("server", &stats);
                self.try_publish();
                true
            }
            CompileEvent::ServerDone(Err(e)) => {
                match self.ready_tx.take() {
                    // Before the first usable build a broken server bundle
                    // is a fatal startup error.
                    Some(tx) => {
                        let _ = tx.send(Err(e.into()));
                        false
                    }
                    // Afterwards the previous build keeps serving.
                    None => {
                        tracing::error!(error = %e, "Server bundle compilation failed, keeping previous build");
                        let _ = self.phase_tx.send(BuildPhase::Ready);
                        true
                    }
                }
            }
        }
    }

    /// Publish a build generation when both gated artifacts are present.
    fn try_publish(&mut self) {
        let manifest = self
            .vfs
            .read_json(Path::new(&self.paths.client_manifest))
            .filter(|v| !v.is_null());
        let bundle = self
            .vfs
            .read_json(Path::new(&self.paths.server_bundle))
            .filter(|v| !v.is_null());

        let (Some(client_manifest), Some(server_bundle)) = (manifest, bundle) else {
            return;
        };

        self.generation += 1;
        let artifacts = RenderArtifacts {
            server_bundle,
            client_manifest,
            templates: Templates {
                spa: self
                    .vfs
                    .read_to_string(Path::new(&self.paths.templates.spa))
                    .unwrap_or_default(),
                ssr: self
                    .vfs
                    .read_to_string(Path::new(&self.paths.templates.ssr))
                    .unwrap_or_default(),
            },
        };

        (self.callback)(artifacts);
        let _ = self.phase_tx.send(BuildPhase::Ready);
        let _ = self.hot_tx.send(HotUpdate {
            generation: self.generation,
        });

        if let Some(tx) = self.ready_tx.take() {
            let _ = tx.send(Ok(()));
        }

        tracing::info!(generation = self.generation, "Development build published");
    }
}

fn log_stats(bundle: &str, stats: &CompileStats) {
    for error in &stats.errors {
        tracing::error!(bundle, "{}", error);
    }
    for warning in &stats.warnings {
        tracing::warn!(bundle, "{}", warning);
    }
}
