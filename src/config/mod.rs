//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerOptions (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Options are immutable once loaded; the only mutation is the one-time
//!   default-filling performed by the server at construction
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BundleConfig;
pub use schema::DevOptions;
pub use schema::HttpOptions;
pub use schema::LoggerOptions;
pub use schema::PathsConfig;
pub use schema::RendererConfig;
pub use schema::ServerOptions;
