//! Observability subsystem.
//!
//! Structured logging via the `tracing` ecosystem. Initialized once by the
//! server from merged default + user logger options.

pub mod logging;
