//! Default compiler: drives an external bundler command.
//!
//! # Responsibilities
//! - Watch configured source directories for changes
//! - Re-run the build command, coalescing bursts of filesystem events
//! - Publish the command's output directory into the virtual filesystem
//!
//! Bundler internals stay outside the host; this compiler only knows how to
//! invoke one and where it writes.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::config::schema::DevOptions;
use crate::dev::compiler::{BundleCompiler, CompileError, CompileEvent, CompileStats};
use crate::dev::vfs::MemoryFs;

/// Environment passed to the build command so it can honor the prepared
/// bundle configuration.
const ENV_CLIENT_ENTRY: &str = "SSR_DEV_CLIENT_ENTRY";
const ENV_CLIENT_FILENAME: &str = "SSR_DEV_CLIENT_FILENAME";
const ENV_SERVER_ENTRY: &str = "SSR_DEV_SERVER_ENTRY";
const ENV_OUT_DIR: &str = "SSR_DEV_OUT_DIR";

/// [`BundleCompiler`] that shells out to a configured build command.
pub struct CommandCompiler;

impl CommandCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CommandCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleCompiler for CommandCompiler {
    fn start(
        self: Box<Self>,
        dev: DevOptions,
        output: Arc<MemoryFs>,
        events: mpsc::UnboundedSender<CompileEvent>,
    ) -> Result<(), CompileError> {
        if dev.build_command.is_none() {
            return Err(CompileError::MissingCommand);
        }

        let (change_tx, mut change_rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        let _ = change_tx.send(());
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default(),
        )?;

        for dir in &dev.watch {
            if dir.is_dir() {
                watcher.watch(dir, RecursiveMode::Recursive)?;
            } else {
                tracing::warn!(path = %dir.display(), "Watch directory missing, skipping");
            }
        }
        tracing::info!(dirs = dev.watch.len(), "Source watcher started");

        tokio::spawn(async move {
            // Keeps the watcher registered for the life of the loop.
            let _watcher = watcher;
            let debounce = Duration::from_millis(dev.debounce_ms);

            loop {
                run_build(&dev, &output, &events).await;

                if change_rx.recv().await.is_none() {
                    break;
                }
                let _ = events.send(CompileEvent::Invalidated);

                // Coalesce the burst of events one save produces.
                tokio::time::sleep(debounce).await;
                while change_rx.try_recv().is_ok() {}
            }
        });

        Ok(())
    }
}

async fn run_build(
    dev: &DevOptions,
    output: &Arc<MemoryFs>,
    events: &mpsc::UnboundedSender<CompileEvent>,
) {
    match run_command(dev).await {
        Ok(stats) => {
            if let Err(e) = publish_outputs(&dev.build_dir, output) {
                let _ = events.send(CompileEvent::ServerDone(Err(e.into())));
                return;
            }
            let _ = events.send(CompileEvent::ClientDone(stats.clone()));
            let _ = events.send(CompileEvent::ServerDone(Ok(stats)));
        }
        Err(e) => {
            let _ = events.send(CompileEvent::ServerDone(Err(e)));
        }
    }
}

async fn run_command(dev: &DevOptions) -> Result<CompileStats, CompileError> {
    let command_line = dev
        .build_command
        .as_deref()
        .ok_or(CompileError::MissingCommand)?;

    let mut parts = command_line.split_whitespace();
    let program = parts.next().ok_or(CompileError::MissingCommand)?;

    let output = Command::new(program)
        .args(parts)
        .env(ENV_CLIENT_ENTRY, dev.client.entry.join(","))
        .env(ENV_CLIENT_FILENAME, &dev.client.output_filename)
        .env(ENV_SERVER_ENTRY, dev.server.entry.join(","))
        .env(ENV_OUT_DIR, &dev.build_dir)
        .output()
        .await?;

    if !output.status.success() {
        return Err(CompileError::Command {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    // The command's stderr carries bundler warnings even on success.
    let warnings = String::from_utf8_lossy(&output.stderr)
        .lines()
        .map(str::to_string)
        .collect();

    Ok(CompileStats {
        errors: Vec::new(),
        warnings,
    })
}

/// Mirror the command's output directory into the virtual filesystem.
fn publish_outputs(build_dir: &Path, vfs: &MemoryFs) -> std::io::Result<()> {
    fn walk(root: &Path, dir: &Path, vfs: &MemoryFs) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, vfs)?;
            } else {
                let contents = std::fs::read(&path)?;
                let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                vfs.write(relative, contents);
            }
        }
        Ok(())
    }

    walk(build_dir, build_dir, vfs)
}
