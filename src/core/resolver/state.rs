use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::error::{FailureKind, LauncherError, ResolutionFailure};
use crate::core::registry::{ModRequirement, ResolvedVersion};

/// Lifecycle of one project id within a resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementState {
    /// Enqueued, not yet picked up.
    Pending,
    /// Picked up; lookup and download outstanding.
    InFlight,
    /// Artifact cached, required dependencies enqueued.
    Done,
    /// The registry has no compatible build.
    Unresolved,
    /// Lookup or download failed, or the run was cancelled first.
    Failed,
}

/// What a single resolve-one-requirement task produced.
#[derive(Debug)]
pub enum TaskOutcome {
    Done {
        path: PathBuf,
        version: ResolvedVersion,
    },
    Unresolved,
    Failed {
        kind: FailureKind,
        error: LauncherError,
    },
}

/// Best-effort closure of one run.
#[derive(Debug, Default, Serialize)]
pub struct ResolutionReport {
    /// Cached artifact paths of every resolved requirement.
    pub files: BTreeSet<PathBuf>,
    /// Chosen version per resolved project id.
    pub resolved: BTreeMap<String, ResolvedVersion>,
    /// Requirements that dropped out, sorted by project id.
    pub failures: Vec<ResolutionFailure>,
    /// Final state of every project id seen during the run.
    pub states: BTreeMap<String, RequirementState>,
}

impl ResolutionReport {
    pub fn failure_for(&self, project_id: &str) -> Option<&ResolutionFailure> {
        self.failures.iter().find(|f| f.project_id == project_id)
    }

    pub fn state_of(&self, project_id: &str) -> Option<RequirementState> {
        self.states.get(project_id).copied()
    }

    /// True when every requirement made it into the closure.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ephemeral bookkeeping for one run. Owned by the scheduling loop; tasks
/// never touch it, they hand their [`TaskOutcome`] back instead.
#[derive(Debug, Default)]
pub struct ResolutionState {
    /// Project ids that have been picked up. Only grows.
    processed: HashSet<String>,
    /// Pending work; may hold the same project id more than once.
    frontier: VecDeque<ModRequirement>,
    states: HashMap<String, RequirementState>,
    in_flight: usize,
    /// Which project each cached path was resolved for.
    owners: HashMap<PathBuf, String>,
    result_files: BTreeSet<PathBuf>,
    resolved: BTreeMap<String, ResolvedVersion>,
    failures: Vec<ResolutionFailure>,
}

impl ResolutionState {
    pub fn new(seeds: impl IntoIterator<Item = ModRequirement>) -> Self {
        let mut state = Self::default();
        for seed in seeds {
            state.enqueue(seed);
        }
        state
    }

    /// Add a requirement to the frontier unless it was already picked up.
    pub fn enqueue(&mut self, requirement: ModRequirement) -> bool {
        if self.processed.contains(&requirement.project_id) {
            return false;
        }
        self.states
            .entry(requirement.project_id.clone())
            .or_insert(RequirementState::Pending);
        self.frontier.push_back(requirement);
        true
    }

    /// Dequeue the next requirement nobody has picked up yet.
    ///
    /// Marking the id processed and handing it out is one step: the
    /// `HashSet::insert` result is the test-and-set, so duplicates still
    /// sitting in the frontier are skipped here.
    pub fn claim_next(&mut self) -> Option<ModRequirement> {
        while let Some(requirement) = self.frontier.pop_front() {
            if self.processed.insert(requirement.project_id.clone()) {
                self.states
                    .insert(requirement.project_id.clone(), RequirementState::InFlight);
                self.in_flight += 1;
                return Some(requirement);
            }
        }
        None
    }

    /// Fold a finished task back in, growing the frontier on success.
    pub fn record(&mut self, project_id: &str, outcome: TaskOutcome) {
        if self.states.get(project_id) != Some(&RequirementState::InFlight) {
            warn!("Ignoring outcome for {} which is not in flight", project_id);
            return;
        }
        self.in_flight -= 1;

        match outcome {
            TaskOutcome::Done { path, version } => {
                if let Some(owner) = self.collides(&path, &version) {
                    warn!(
                        "{} and {} both publish {:?}, keeping {}",
                        owner, project_id, version.filename, owner
                    );
                    self.failures.push(
                        ResolutionFailure::new(project_id, FailureKind::Download).with_message(
                            format!("{} is already taken by {}", version.filename, owner),
                        ),
                    );
                    self.states
                        .insert(project_id.to_string(), RequirementState::Failed);
                    return;
                }
                self.owners
                    .entry(path.clone())
                    .or_insert_with(|| project_id.to_string());
                for dep in version.required_dependencies() {
                    if self.enqueue(dep.clone()) {
                        debug!(
                            "Queued dependency {} (required by {})",
                            dep.project_id, project_id
                        );
                    }
                }
                self.result_files.insert(path);
                self.resolved.insert(project_id.to_string(), version);
                self.states
                    .insert(project_id.to_string(), RequirementState::Done);
            }
            TaskOutcome::Unresolved => {
                warn!("No compatible version found for {}", project_id);
                self.failures.push(ResolutionFailure::new(
                    project_id,
                    FailureKind::NoCompatibleVersion,
                ));
                self.states
                    .insert(project_id.to_string(), RequirementState::Unresolved);
            }
            TaskOutcome::Failed { kind, error } => {
                warn!("Failed to resolve {} ({}): {}", project_id, kind, error);
                self.failures.push(
                    ResolutionFailure::new(project_id, kind).with_message(error.to_string()),
                );
                self.states
                    .insert(project_id.to_string(), RequirementState::Failed);
            }
        }
    }

    /// Another project already resolved to the same cache entry with
    /// content that is not known to be identical.
    fn collides(&self, path: &Path, version: &ResolvedVersion) -> Option<String> {
        let owner = self.owners.get(path)?;
        let same_artifact = match (&version.content_hash, self.resolved.get(owner)) {
            (Some(hash), Some(theirs)) => theirs
                .content_hash
                .as_deref()
                .is_some_and(|h| h.eq_ignore_ascii_case(hash)),
            _ => false,
        };
        (!same_artifact).then(|| owner.clone())
    }

    /// Drain the frontier without scheduling it and fail whatever is
    /// still in flight; both are reported as cancelled.
    pub fn cancel_outstanding(&mut self) {
        while let Some(requirement) = self.frontier.pop_front() {
            if self.processed.insert(requirement.project_id.clone()) {
                self.mark_cancelled(&requirement.project_id);
            }
        }

        let in_flight: Vec<String> = self
            .states
            .iter()
            .filter(|(_, s)| **s == RequirementState::InFlight)
            .map(|(id, _)| id.clone())
            .collect();
        for project_id in in_flight {
            self.mark_cancelled(&project_id);
        }
        self.in_flight = 0;
    }

    fn mark_cancelled(&mut self, project_id: &str) {
        self.failures
            .push(ResolutionFailure::new(project_id, FailureKind::Cancelled));
        self.states
            .insert(project_id.to_string(), RequirementState::Failed);
    }

    pub fn state_of(&self, project_id: &str) -> Option<RequirementState> {
        self.states.get(project_id).copied()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// No pending work and nothing outstanding.
    pub fn is_finished(&self) -> bool {
        self.in_flight == 0 && self.frontier.is_empty()
    }

    pub fn into_report(mut self) -> ResolutionReport {
        // Tasks that vanished without reporting (aborted or panicked).
        if self.in_flight > 0 {
            self.cancel_outstanding();
        }
        self.failures
            .sort_by(|a, b| a.project_id.cmp(&b.project_id));

        ResolutionReport {
            files: self.result_files,
            resolved: self.resolved,
            failures: self.failures,
            states: self.states.into_iter().collect(),
        }
    }
}
