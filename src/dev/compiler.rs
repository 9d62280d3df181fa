//! Incremental compiler collaborator contract.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::schema::DevOptions;
use crate::dev::vfs::MemoryFs;

/// Diagnostics collected from one compile pass.
///
/// Entries here never block a build from being considered usable; they are
/// logged by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct CompileStats {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Progress reported by a compiler's watch loop.
#[derive(Debug)]
pub enum CompileEvent {
    /// A rebuild started; asset requests hold until the next done event.
    Invalidated,

    /// The client bundle finished a pass.
    ClientDone(CompileStats),

    /// The server bundle finished a watch cycle. An `Err` means the cycle
    /// produced no usable bundle.
    ServerDone(Result<CompileStats, CompileError>),
}

/// Error from the compiler itself, as opposed to diagnostics in stats.
#[derive(Debug, Error)]
pub enum CompileError {
    /// No build command configured for development mode.
    #[error("no build command configured for development mode")]
    MissingCommand,

    /// The build command exited unsuccessfully.
    #[error("build command failed with status {status}: {stderr}")]
    Command { status: i32, stderr: String },

    /// Reading build outputs failed.
    #[error("build output error: {0}")]
    Io(#[from] std::io::Error),

    /// The source watcher failed.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// An incremental compiler building both the client and server bundles.
///
/// The host never looks inside a compiler; it only consumes the outputs
/// published into the virtual filesystem and the events on the channel.
pub trait BundleCompiler: Send {
    /// Begin the watch loop with the pipeline-prepared build configuration.
    /// Returns once watching is established; compile passes run in the
    /// background for the life of the process.
    fn start(
        self: Box<Self>,
        dev: DevOptions,
        output: Arc<MemoryFs>,
        events: mpsc::UnboundedSender<CompileEvent>,
    ) -> Result<(), CompileError>;
}
