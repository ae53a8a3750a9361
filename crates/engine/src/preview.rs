//! Live preview of the generated handler while a flow is being edited.
//!
//! Every edit opens a new generation epoch.  A regeneration run remembers the
//! epoch it was started for and may only publish while that epoch is still
//! the latest one; older runs are left to finish and their results are
//! dropped.  The epoch check and the hand-off to the sink happen under one
//! lock, so a stale run can never overwrite a newer publication.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::codegen::{generate, Artifact, GeneratorConfig};
use crate::models::Graph;
use crate::schedule::schedule;
use crate::validate::validate;
use crate::Diagnostic;

/// Monotonic counter identifying one edit.
pub type Epoch = u64;

/// Where the synchronizer currently is for the latest epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewState {
    Idle,
    Validating,
    /// Diagnostics were published.
    Invalid,
    Scheduling,
    Generating,
    /// An artifact was published.
    Published,
    /// The generator reported a defect.
    Failed,
}

/// What a regeneration run hands to the preview surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    Artifact(Artifact),
    Invalid(Vec<Diagnostic>),
    Failed(String),
}

impl PreviewOutcome {
    fn state(&self) -> PreviewState {
        match self {
            Self::Artifact(_) => PreviewState::Published,
            Self::Invalid(_)  => PreviewState::Invalid,
            Self::Failed(_)   => PreviewState::Failed,
        }
    }
}

/// Passive renderer of whatever was last published.
pub trait PreviewSink: Send + Sync {
    fn on_published(&self, epoch: Epoch, outcome: &PreviewOutcome);
}

impl<T: PreviewSink + ?Sized> PreviewSink for Arc<T> {
    fn on_published(&self, epoch: Epoch, outcome: &PreviewOutcome) {
        (**self).on_published(epoch, outcome)
    }
}

/// Sink that keeps every publication in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    published: Mutex<Vec<(Epoch, PreviewOutcome)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(Epoch, PreviewOutcome)> {
        lock(&self.published).clone()
    }

    pub fn latest(&self) -> Option<(Epoch, PreviewOutcome)> {
        lock(&self.published).last().cloned()
    }
}

impl PreviewSink for RecordingSink {
    fn on_published(&self, epoch: Epoch, outcome: &PreviewOutcome) {
        lock(&self.published).push((epoch, outcome.clone()));
    }
}

#[derive(Debug)]
struct Status {
    state: PreviewState,
    published: Option<Epoch>,
}

/// Keeps the displayed source in step with the latest edit.
pub struct PreviewSynchronizer<S> {
    epoch: AtomicU64,
    status: Mutex<Status>,
    sink: S,
    config: GeneratorConfig,
}

impl<S: PreviewSink> PreviewSynchronizer<S> {
    pub fn new(sink: S, config: GeneratorConfig) -> Self {
        Self {
            epoch: AtomicU64::new(0),
            status: Mutex::new(Status {
                state: PreviewState::Idle,
                published: None,
            }),
            sink,
            config,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Open a new epoch, superseding every run still in flight.
    pub fn begin(&self) -> Epoch {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(epoch, "preview epoch opened");
        epoch
    }

    pub fn current_epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> PreviewState {
        lock(&self.status).state
    }

    /// Epoch of the most recent publication, if any.
    pub fn last_published(&self) -> Option<Epoch> {
        lock(&self.status).published
    }

    /// Run validate, schedule and generate for `graph` on behalf of `epoch`.
    ///
    /// Returns the outcome if it was published, `None` if `epoch` was
    /// superseded at any point along the way.
    pub fn regenerate(&self, epoch: Epoch, graph: &Graph) -> Option<PreviewOutcome> {
        if !self.enter(epoch, PreviewState::Validating) {
            return self.superseded(epoch);
        }

        let outcome = match validate(graph) {
            Err(diagnostics) => PreviewOutcome::Invalid(diagnostics),
            Ok(valid) => {
                if !self.enter(epoch, PreviewState::Scheduling) {
                    return self.superseded(epoch);
                }
                let order = schedule(&valid);

                if !self.enter(epoch, PreviewState::Generating) {
                    return self.superseded(epoch);
                }
                match generate(&order, &self.config) {
                    Ok(artifact) => PreviewOutcome::Artifact(artifact),
                    Err(e) => {
                        error!(epoch, error = %e, "generator rejected a validated graph");
                        PreviewOutcome::Failed(e.to_string())
                    }
                }
            }
        };

        self.publish(epoch, outcome)
    }

    /// Open a new epoch for `graph` and regenerate it on the blocking pool.
    pub fn spawn(self: &Arc<Self>, graph: Graph) -> (Epoch, JoinHandle<Option<PreviewOutcome>>)
    where
        S: 'static,
    {
        let epoch = self.begin();
        let this = Arc::clone(self);
        let handle = tokio::task::spawn_blocking(move || this.regenerate(epoch, &graph));
        (epoch, handle)
    }

    fn is_current(&self, epoch: Epoch) -> bool {
        self.current_epoch() == epoch
    }

    /// Record `state` for `epoch` if it is still current.
    fn enter(&self, epoch: Epoch, state: PreviewState) -> bool {
        let mut status = lock(&self.status);
        if !self.is_current(epoch) {
            return false;
        }
        status.state = state;
        true
    }

    fn publish(&self, epoch: Epoch, outcome: PreviewOutcome) -> Option<PreviewOutcome> {
        let mut status = lock(&self.status);
        if !self.is_current(epoch) {
            drop(status);
            return self.superseded(epoch);
        }

        status.state = outcome.state();
        status.published = Some(epoch);
        self.sink.on_published(epoch, &outcome);
        info!(epoch, state = ?status.state, "preview published");

        Some(outcome)
    }

    fn superseded(&self, epoch: Epoch) -> Option<PreviewOutcome> {
        warn!(epoch, current = self.current_epoch(), "discarding superseded preview");
        None
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edge, Node};
    use nodes::{HttpMethod, NodeConfig, ResponseFormat};

    fn flow(path: &str) -> Graph {
        Graph::new(
            vec![
                Node::new("t", "", NodeConfig::trigger(HttpMethod::Get, path)),
                Node::new("r", "", NodeConfig::response(ResponseFormat::Json)),
            ],
            vec![Edge::new("t", "r")],
        )
    }

    fn synchronizer() -> PreviewSynchronizer<Arc<RecordingSink>> {
        PreviewSynchronizer::new(Arc::new(RecordingSink::new()), GeneratorConfig::default())
    }

    #[test]
    fn current_epoch_is_published() {
        let sync = synchronizer();
        assert_eq!(sync.state(), PreviewState::Idle);

        let epoch = sync.begin();
        let outcome = sync.regenerate(epoch, &flow("/a"));

        assert!(matches!(outcome, Some(PreviewOutcome::Artifact(ref a)) if a.path == "/a"));
        assert_eq!(sync.state(), PreviewState::Published);
        assert_eq!(sync.last_published(), Some(epoch));
        assert_eq!(sync.sink().published().len(), 1);
    }

    #[test]
    fn superseded_run_is_discarded() {
        let sync = synchronizer();
        let old = sync.begin();
        let new = sync.begin();

        assert!(sync.regenerate(new, &flow("/new")).is_some());
        assert!(sync.regenerate(old, &flow("/old")).is_none());

        let published = sync.sink().published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, new);
        assert_eq!(sync.last_published(), Some(new));
    }

    #[test]
    fn invalid_epoch_does_not_poison_the_next() {
        let sync = synchronizer();

        let broken = Graph::new(vec![Node::new("r", "", NodeConfig::response(ResponseFormat::Json))], vec![]);
        let first = sync.begin();
        assert!(matches!(sync.regenerate(first, &broken), Some(PreviewOutcome::Invalid(_))));
        assert_eq!(sync.state(), PreviewState::Invalid);

        let second = sync.begin();
        assert!(matches!(sync.regenerate(second, &flow("/ok")), Some(PreviewOutcome::Artifact(_))));
        assert_eq!(sync.state(), PreviewState::Published);
    }

    #[tokio::test]
    async fn spawned_runs_converge_on_the_last_edit() {
        let sync = Arc::new(synchronizer());

        let mut handles = Vec::new();
        for i in 0..8 {
            handles.push(sync.spawn(flow(&format!("/v{i}"))));
        }
        let last = handles.last().map(|(epoch, _)| *epoch).unwrap();
        for (_, handle) in handles {
            handle.await.unwrap();
        }

        assert_eq!(sync.current_epoch(), last);
        assert_eq!(sync.last_published(), Some(last));
        let (epoch, outcome) = sync.sink().latest().unwrap();
        assert_eq!(epoch, last);
        assert!(matches!(outcome, PreviewOutcome::Artifact(ref a) if a.path == "/v7"));

        // Publications only ever move forward.
        let epochs: Vec<Epoch> = sync.sink().published().iter().map(|(e, _)| *e).collect();
        assert!(epochs.windows(2).all(|w| w[0] < w[1]));
    }
}
