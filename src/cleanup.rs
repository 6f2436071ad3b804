use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

/// Tracks scratch paths that must be removed if the run is interrupted.
#[derive(Default)]
pub struct CleanupContext {
    #[cfg(test)]
    pub paths: Vec<PathBuf>,
    #[cfg(not(test))]
    paths: Vec<PathBuf>,
}

impl CleanupContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn remove(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    /// Removes every registered path from disk.
    pub fn cleanup(&self) {
        for path in &self.paths {
            debug!("Cleaning up: {:?}", path);
            if path.is_dir() {
                let _ = std::fs::remove_dir_all(path);
            } else {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}

pub type SharedCleanupContext = Arc<Mutex<CleanupContext>>;

pub fn new_shared() -> SharedCleanupContext {
    Arc::new(Mutex::new(CleanupContext::new()))
}

fn lock(ctx: &SharedCleanupContext) -> MutexGuard<'_, CleanupContext> {
    // A panicking worker must not stop the others from cleaning up.
    ctx.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps a path registered for interruption cleanup while the guard lives.
/// Dropping the guard only unregisters; the owner removes the path itself.
pub struct CleanupGuard {
    ctx: SharedCleanupContext,
    path: PathBuf,
}

impl CleanupGuard {
    pub fn new(ctx: SharedCleanupContext, path: PathBuf) -> Self {
        lock(&ctx).add(path.clone());
        Self { ctx, path }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        lock(&self.ctx).remove(&self.path);
    }
}

/// A directory that lives as long as the guard. It is registered with the
/// cleanup context while it exists and removed from disk on drop.
pub struct ScratchDir {
    ctx: SharedCleanupContext,
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(ctx: SharedCleanupContext, path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create scratch directory {:?}", path))?;
        lock(&ctx).add(path.clone());
        Ok(Self { ctx, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            debug!("Failed to remove {:?}: {}", self.path, e);
        }
        lock(&self.ctx).remove(&self.path);
    }
}

/// On Ctrl-C, removes everything registered in `ctx` and exits with the
/// conventional status 130. Abort the returned handle once the work is done.
pub fn spawn_interrupt_handler(ctx: SharedCleanupContext) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, cleaning up...");
            lock(&ctx).cleanup();
            std::process::exit(130);
        }
    })
}
