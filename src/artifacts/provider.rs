//! Production artifact provider.
//!
//! Reads the three render inputs from the configured output directory. A
//! missing or malformed file is a fatal startup error: production artifacts
//! come from a prior build step the host does not control, so there is
//! nothing to retry.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::artifacts::types::{RenderArtifacts, Templates};
use crate::config::schema::PathsConfig;

/// Error reading a built artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read the built files for the renderer.
pub fn built_files(paths: &PathsConfig) -> Result<RenderArtifacts, ArtifactError> {
    let dir = &paths.output_dir;

    Ok(RenderArtifacts {
        client_manifest: read_json(&dir.join(&paths.client_manifest))?,
        server_bundle: read_json(&dir.join(&paths.server_bundle))?,
        templates: Templates {
            spa: read_text(&dir.join(&paths.templates.spa))?,
            ssr: read_text(&dir.join(&paths.templates.ssr))?,
        },
    })
}

fn read_text(path: &Path) -> Result<String, ArtifactError> {
    fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json(path: &Path) -> Result<Value, ArtifactError> {
    let content = read_text(path)?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
