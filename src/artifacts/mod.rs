//! Render artifacts and their providers.
//!
//! # Data Flow
//! ```text
//! production:  output_dir on disk → provider.rs → RenderArtifacts
//! development: in-memory build    → dev pipeline → RenderArtifacts
//! ```
//!
//! Artifacts are produced exactly once per (re)compilation and replaced
//! wholesale on every successful rebuild, never partially updated.

pub mod provider;
pub mod types;

pub use provider::{built_files, ArtifactError};
pub use types::{RenderArtifacts, Templates};
