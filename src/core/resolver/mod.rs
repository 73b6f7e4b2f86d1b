// ─── Dependency Resolver ───
// Expands seed requirements into the required-dependency closure for one
// game version / loader pair, fetching every artifact into the cache.
//
// A bounded pool of tasks (lookup + download each) drains a frontier that
// grows as dependencies are discovered. The scheduling loop is the only
// owner of `ResolutionState`, so the processed-set test-and-set needs no
// lock and no task ever holds one across its two network calls.

mod state;

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use state::{RequirementState, ResolutionReport, ResolutionState, TaskOutcome};

use crate::core::downloader::ArtifactFetcher;
use crate::core::error::FailureKind;
use crate::core::registry::{ModRegistry, ModRequirement};
use crate::core::version::LoaderType;

/// Default number of requirements resolved in parallel.
pub const DEFAULT_WORKERS: usize = 5;

pub struct DependencyResolver {
    registry: Arc<dyn ModRegistry>,
    fetcher: Arc<dyn ArtifactFetcher>,
    /// Maximum number of requirements in flight.
    concurrency: usize,
}

impl DependencyResolver {
    pub fn new(registry: Arc<dyn ModRegistry>, fetcher: Arc<dyn ArtifactFetcher>) -> Self {
        Self {
            registry,
            fetcher,
            concurrency: DEFAULT_WORKERS,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Resolve `seeds` and their required dependencies into `cache_dir`.
    ///
    /// Never fails as a whole: per-requirement problems end up in
    /// [`ResolutionReport::failures`]. When `cancel` fires, in-flight
    /// tasks are aborted, pending work is reported as cancelled and
    /// artifacts already cached stay where they are.
    pub async fn resolve(
        &self,
        seeds: impl IntoIterator<Item = ModRequirement>,
        game_version: &str,
        loader: LoaderType,
        cache_dir: &Path,
        cancel: &CancellationToken,
    ) -> ResolutionReport {
        let mut state = ResolutionState::new(seeds);
        let mut tasks: JoinSet<(String, TaskOutcome)> = JoinSet::new();

        info!(
            "Resolving mods for {} ({}), concurrency={}",
            game_version, loader, self.concurrency
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            while tasks.len() < self.concurrency {
                let Some(requirement) = state.claim_next() else {
                    break;
                };
                let registry = Arc::clone(&self.registry);
                let fetcher = Arc::clone(&self.fetcher);
                let game_version = game_version.to_string();
                let cache_dir = cache_dir.to_path_buf();

                tasks.spawn(async move {
                    let outcome = resolve_one(
                        registry.as_ref(),
                        fetcher.as_ref(),
                        &requirement.project_id,
                        &game_version,
                        loader,
                        &cache_dir,
                    )
                    .await;
                    (requirement.project_id, outcome)
                });
            }

            if tasks.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                joined = tasks.join_next() => match joined {
                    Some(Ok((project_id, outcome))) => state.record(&project_id, outcome),
                    Some(Err(e)) => warn!("Resolution task ended abnormally: {}", e),
                    None => break,
                },
            }
        }

        if cancel.is_cancelled() {
            info!("Mod resolution cancelled, {} task(s) aborted", tasks.len());
            tasks.abort_all();
            while let Some(joined) = tasks.join_next().await {
                // A task may have completed before the abort reached it.
                if let Ok((project_id, outcome)) = joined {
                    state.record(&project_id, outcome);
                }
            }
            state.cancel_outstanding();
        }

        let report = state.into_report();
        info!(
            "Resolved {} mod(s), {} failure(s)",
            report.files.len(),
            report.failures.len()
        );
        report
    }
}

/// Registry lookup followed by the download, for one project id.
async fn resolve_one(
    registry: &dyn ModRegistry,
    fetcher: &dyn ArtifactFetcher,
    project_id: &str,
    game_version: &str,
    loader: LoaderType,
    cache_dir: &Path,
) -> TaskOutcome {
    let version = match registry
        .latest_version(project_id, game_version, loader)
        .await
    {
        Ok(Some(version)) => version,
        Ok(None) => return TaskOutcome::Unresolved,
        Err(error) => {
            return TaskOutcome::Failed {
                kind: FailureKind::Registry,
                error,
            }
        }
    };

    match fetcher.ensure_cached(&version, cache_dir).await {
        Ok(path) => TaskOutcome::Done { path, version },
        Err(error) => TaskOutcome::Failed {
            kind: FailureKind::Download,
            error,
        },
    }
}

/// Cached filenames of a report, for logs and summaries.
pub fn file_names(report: &ResolutionReport) -> Vec<String> {
    report
        .files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect()
}
