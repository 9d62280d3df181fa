//! Development pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! source change
//!     → compiler watch loop (command.rs or an embedded compiler)
//!     → outputs published into the in-memory filesystem (vfs.rs)
//!     → compile events (compiler.rs)
//!     → pipeline gate: manifest AND server bundle present (pipeline.rs)
//!     → fresh RenderArtifacts delivered to the server, renderer swapped
//!     → hot-update notification pushed to connected clients (middleware.rs)
//! ```
//!
//! # Design Decisions
//! - The readiness gate opens on the conjunction of both bundles, not on
//!   either event alone; client and server compiles finish independently
//! - Readiness resolves exactly once; later builds only deliver artifacts
//! - No disk writes in development: all outputs live in the virtual
//!   filesystem and are replaced wholesale per build generation

pub mod command;
pub mod compiler;
pub mod middleware;
pub mod pipeline;
pub mod vfs;

pub use command::CommandCompiler;
pub use compiler::{BundleCompiler, CompileError, CompileEvent, CompileStats};
pub use middleware::{AssetMiddleware, HotUpdate, HotUpdateMiddleware};
pub use pipeline::{setup_dev_pipeline, BuildCallback, BuildPhase, DevError};
pub use vfs::MemoryFs;
