//! Revision scan: fan out one task per revision, bounded by the worker
//! count, and fold the results back into revision order.

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::cleanup::{CleanupGuard, ScratchDir, SharedCleanupContext};
use crate::config::Config;
use crate::download::download_revision;
use crate::http::HttpClient;
use crate::snap::MetadataReader;
use crate::store::{RevisionRange, SnapStore};

/// What one revision of a snap was built as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRecord {
    pub revision: u32,
    pub version: String,
    pub architecture: String,
}

/// Outcome of a scan, keyed by revision regardless of completion order.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub results: BTreeMap<u32, RevisionRecord>,
    pub failures: BTreeMap<u32, String>,
}

type JoinedRevision = Result<(u32, Result<RevisionRecord>), JoinError>;

impl ScanReport {
    pub fn records(&self) -> impl Iterator<Item = &RevisionRecord> {
        self.results.values()
    }

    /// Records one finished task, logging failures as they arrive.
    fn absorb(&mut self, joined: JoinedRevision) {
        match joined {
            Ok((revision, Ok(record))) => {
                debug!("Revision {} done", revision);
                self.results.insert(revision, record);
            }
            Ok((revision, Err(e))) => {
                error!("Error processing revision {}: {:#}", revision, e);
                self.failures.insert(revision, format!("{:#}", e));
            }
            Err(e) => warn!("Revision task did not complete: {}", e),
        }
    }
}

pub struct ScanOptions {
    pub workers: NonZeroUsize,
    pub range: RevisionRange,
    /// Parent of the run's scratch directory; the system temp dir if unset.
    pub work_dir: Option<PathBuf>,
}

pub struct Scanner<S: SnapStore, M: MetadataReader> {
    store: Arc<S>,
    http: HttpClient,
    reader: Arc<M>,
    options: ScanOptions,
    cleanup: SharedCleanupContext,
}

impl<S: SnapStore + 'static, M: MetadataReader + 'static> Scanner<S, M> {
    pub fn new(config: Config<S, M>, options: ScanOptions, cleanup: SharedCleanupContext) -> Self {
        Self {
            store: Arc::new(config.store),
            http: config.http,
            reader: Arc::new(config.reader),
            options,
            cleanup,
        }
    }

    /// Looks up `snap` in the store and processes every revision in range.
    ///
    /// Only the store lookup and scratch setup are fatal; a revision that
    /// fails to download or parse is recorded in `ScanReport::failures`.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, snap: &str) -> Result<ScanReport> {
        let info = self.store.snap_info(snap).await?;
        let revisions = info.revisions(self.options.range)?;
        if let Ok(latest) = info.latest_revision() {
            info!("Current revision: {}", latest);
        }
        info!(
            "Processing {} revisions ({}..={}) with {} workers",
            revisions.len(),
            revisions.last().copied().unwrap_or_default(),
            revisions.first().copied().unwrap_or_default(),
            self.options.workers
        );

        let run_dir = match &self.options.work_dir {
            Some(parent) => tempfile::Builder::new()
                .prefix("snaprev-")
                .tempdir_in(parent),
            None => tempfile::Builder::new().prefix("snaprev-").tempdir(),
        }
        .context("Failed to create scratch directory")?;
        // An interrupted run exits without dropping `run_dir`.
        let _run_dir_guard =
            CleanupGuard::new(Arc::clone(&self.cleanup), run_dir.path().to_path_buf());
        debug!("Scratch directory: {:?}", run_dir.path());

        let semaphore = Arc::new(Semaphore::new(self.options.workers.get()));
        let mut tasks = JoinSet::new();
        let mut report = ScanReport::default();

        for &revision in &revisions {
            // Report revisions as they finish while waiting for a free worker.
            let permit = loop {
                tokio::select! {
                    Some(joined) = tasks.join_next(), if !tasks.is_empty() => report.absorb(joined),
                    permit = semaphore.clone().acquire_owned() => {
                        break permit.context("Worker pool closed")?;
                    }
                }
            };

            let job = RevisionJob {
                store: Arc::clone(&self.store),
                http: self.http.clone(),
                reader: Arc::clone(&self.reader),
                cleanup: Arc::clone(&self.cleanup),
                snap: info.name.clone(),
                snap_id: info.snap_id.clone(),
                scratch: run_dir.path().join(revision.to_string()),
                revision,
            };

            tasks.spawn(async move {
                let result = job.process().await;
                drop(permit);
                (revision, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            report.absorb(joined);
        }

        // A task that panicked never reports its revision.
        for revision in revisions {
            if !report.results.contains_key(&revision) && !report.failures.contains_key(&revision)
            {
                error!("Error processing revision {}: task aborted", revision);
                report
                    .failures
                    .insert(revision, "task aborted".to_string());
            }
        }

        info!(
            "{} revisions processed, {} failed",
            report.results.len(),
            report.failures.len()
        );
        Ok(report)
    }
}

/// Everything one worker needs, owned so the task can be spawned.
struct RevisionJob<S: SnapStore, M: MetadataReader> {
    store: Arc<S>,
    http: HttpClient,
    reader: Arc<M>,
    cleanup: SharedCleanupContext,
    snap: String,
    snap_id: String,
    scratch: PathBuf,
    revision: u32,
}

impl<S: SnapStore + 'static, M: MetadataReader + 'static> RevisionJob<S, M> {
    async fn process(self) -> Result<RevisionRecord> {
        info!("Processing revision {}", self.revision);

        // Dropped on every exit path, taking the download with it.
        let scratch = ScratchDir::new(self.cleanup, self.scratch)?;

        let url = self.store.download_url(&self.snap_id, self.revision);
        let archive =
            download_revision(&self.http, &url, scratch.path(), &self.snap, self.revision).await?;

        let reader = self.reader;
        let scratch_path = scratch.path().to_path_buf();
        let meta = tokio::task::spawn_blocking(move || reader.read_meta(&archive, &scratch_path))
            .await
            .context("Metadata extraction task failed")??;

        if meta.name != self.snap {
            warn!(
                "Revision {} carries snap name '{}', expected '{}'",
                self.revision, meta.name, self.snap
            );
        }

        let architecture = meta.architecture()?.to_string();
        debug!(
            "Revision {} is version {} for {}",
            self.revision, meta.version, architecture
        );

        Ok(RevisionRecord {
            revision: self.revision,
            version: meta.version,
            architecture,
        })
    }
}
