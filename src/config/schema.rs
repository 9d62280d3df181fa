//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the host.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the SSR host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerOptions {
    /// HTTP options (bind host/port, TLS, timeouts).
    pub http: HttpOptions,

    /// Filesystem layout of the built artifacts.
    pub paths: PathsConfig,

    /// Renderer options (template markers, SPA fallback paths).
    pub renderer: RendererConfig,

    /// Development-bundler configuration. Presence selects development mode.
    pub dev: Option<DevOptions>,

    /// Logger settings.
    pub logger: LoggerOptions,

    /// Opaque arguments forwarded to the adapter's app construction.
    pub adapter_args: serde_json::Value,
}

/// HTTP options for the adapter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpOptions {
    /// Host to bind (e.g., "127.0.0.1").
    pub host: String,

    /// Port to bind. Port 0 binds an ephemeral port.
    pub port: u16,

    /// Optional TLS configuration. Presence switches the adapter to HTTPS.
    pub tls: Option<TlsConfig>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            tls: None,
            request_timeout_secs: 30,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Locations of the three render inputs under the output directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory the production build writes into.
    pub output_dir: PathBuf,

    /// Server bundle filename (JSON).
    pub server_bundle: String,

    /// Client asset manifest filename (JSON).
    pub client_manifest: String,

    /// Template filenames.
    pub templates: TemplatePaths,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("dist"),
            server_bundle: "server-bundle.json".to_string(),
            client_manifest: "client-manifest.json".to_string(),
            templates: TemplatePaths::default(),
        }
    }
}

/// SPA and SSR template filenames.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplatePaths {
    /// Template served without server rendering.
    pub spa: String,

    /// Template the rendered markup is injected into.
    pub ssr: String,
}

impl Default for TemplatePaths {
    fn default() -> Self {
        Self {
            spa: "index.spa.html".to_string(),
            ssr: "index.ssr.html".to_string(),
        }
    }
}

/// Renderer options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Marker in the SSR template replaced with the rendered markup.
    pub outlet: String,

    /// Name of the JS global carrying the serialized hydration payload.
    pub data_global: String,

    /// Path prefixes served from the SPA template instead of rendering.
    pub spa_paths: Vec<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            outlet: "<!--ssr-outlet-->".to_string(),
            data_global: "__DATA__".to_string(),
            spa_paths: Vec::new(),
        }
    }
}

/// Development mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevOptions {
    /// Client bundle build configuration.
    pub client: BundleConfig,

    /// Server bundle build configuration.
    pub server: BundleConfig,

    /// Command invoked to produce a development build.
    pub build_command: Option<String>,

    /// Directory the build command writes outputs into.
    pub build_dir: PathBuf,

    /// Source directories watched for changes.
    pub watch: Vec<PathBuf>,

    /// Delay used to coalesce bursts of filesystem events.
    pub debounce_ms: u64,

    /// Heartbeat interval for the hot-update stream, in seconds.
    pub heartbeat_secs: u64,

    /// Route the hot-update stream is served on.
    pub hot_path: String,
}

impl Default for DevOptions {
    fn default() -> Self {
        Self {
            client: BundleConfig {
                entry: vec!["src/entry-client".to_string()],
                output_filename: "app.js".to_string(),
                public_path: "/".to_string(),
            },
            server: BundleConfig {
                entry: vec!["src/entry-server".to_string()],
                output_filename: "server-bundle.json".to_string(),
                public_path: "/".to_string(),
            },
            build_command: None,
            build_dir: PathBuf::from(".ssr-dev"),
            watch: vec![PathBuf::from("src")],
            debounce_ms: 300,
            heartbeat_secs: 10,
            hot_path: "/__ssr_hot".to_string(),
        }
    }
}

/// Build configuration for one bundle.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BundleConfig {
    /// Entry modules, in order.
    pub entry: Vec<String>,

    /// Output filename. Pinned by the dev pipeline so the virtual
    /// filesystem can be re-read by fixed path across rebuilds.
    pub output_filename: String,

    /// Public URL prefix the bundle's assets are served under.
    pub public_path: String,
}

/// Logger settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerOptions {
    /// Default log level when RUST_LOG is not set.
    pub level: String,

    /// Output format. When unset, the server picks pretty output in
    /// development mode and JSON otherwise.
    pub format: Option<LogFormat>,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}
