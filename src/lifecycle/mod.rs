//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (server module):
//!     Resolve artifacts → Build renderer → Install terminal middleware → Bind
//!
//! Shutdown (shutdown.rs):
//!     stop() or signal → Trigger broadcast → Adapter drains → Dev tasks exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful stop → process exit 0
//! ```
//!
//! # Design Decisions
//! - Signal handlers are owned by the server and installed only after a
//!   successful start, so a half-started server keeps default disposition
//! - Ordered shutdown: stop accepting, drain in-flight renders, exit

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
