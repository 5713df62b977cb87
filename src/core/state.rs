//! Tool session: the event loop that owns one activated tool's queue.
//!
//! All queue and status mutations go through `&mut ToolSession`, so structural
//! changes are serialized. Per-item transforms run on the blocking pool and
//! report back over a completion channel; the session applies each completion
//! by id against the queue as it is *now*, discarding completions whose item
//! was removed in the meantime.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::core::item::{ItemId, QueueItem, SourceFile};
use crate::core::progress::{PipelineEvent, Progress};
use crate::core::status::{CommitStatus, Stage};
use crate::core::tool::{OutputMode, Tool};
use crate::core::types::PipelineConfig;
use crate::output::{OutputArtifact, assemble_commit, assemble_item};
use crate::preview::PreviewRegistry;
use crate::processing::engine::{Completion, Transform, TransformEngine};
use crate::processing::ingest::FileIngestor;
use crate::queue::OrderedQueue;
use crate::utils::{PipelineError, PipelineResult, Rejection};

/// Result of one ingestion call.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Ids of the newly queued items, in arrival order
    pub accepted: Vec<ItemId>,
    /// Files that never entered the queue
    pub rejected: Vec<Rejection>,
}

impl IngestOutcome {
    /// Each rejection as an ingestion-scoped error.
    pub fn rejection_errors(&self) -> impl Iterator<Item = PipelineError> + '_ {
        self.rejected.iter().cloned().map(PipelineError::IngestionRejected)
    }
}

/// What applying one completion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The item was still queued and moved to `stage`
    Applied { id: ItemId, stage: Stage },
    /// The item had been removed; the result was dropped
    Discarded { id: ItemId },
}

/// One activated tool: queue, previews, engine and event channel.
///
/// Dropping the session is tool teardown: every preview still held by a
/// queued item is released.
///
/// Per-item transforms run on the Tokio runtime current when the session was
/// created. A session built outside any runtime still queues files, but its
/// per-item transforms fail with [`PipelineError::TransformFailed`].
pub struct ToolSession {
    tool: Tool,
    config: PipelineConfig,
    queue: OrderedQueue,
    previews: Arc<PreviewRegistry>,
    engine: TransformEngine,
    runtime: Option<Handle>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    events: broadcast::Sender<PipelineEvent>,
    last_commit: Option<CommitStatus>,
}

impl ToolSession {
    /// Activates `tool` with the default codec backends.
    pub fn activate(tool: Tool, config: PipelineConfig) -> Self {
        Self::with_engine(
            tool,
            config,
            TransformEngine::new(),
            Arc::new(PreviewRegistry::new()),
        )
    }

    /// Activates `tool` with explicit backends and preview registry.
    pub fn with_engine(
        tool: Tool,
        config: PipelineConfig,
        engine: TransformEngine,
        previews: Arc<PreviewRegistry>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            warn!("{} activated outside an async runtime", tool);
        }
        info!("Activated {} tool", tool);

        Self {
            tool,
            config,
            queue: OrderedQueue::new(),
            previews,
            engine,
            runtime,
            completions_tx,
            completions_rx,
            in_flight: 0,
            events,
            last_commit: None,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────────────

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn items(&self) -> &[QueueItem] {
        self.queue.items()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.queue.ids()
    }

    pub fn get(&self, id: ItemId) -> Option<&QueueItem> {
        self.queue.get(id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue revision; bumps on every list replacement.
    pub fn revision(&self) -> u64 {
        self.queue.revision()
    }

    pub fn previews(&self) -> &Arc<PreviewRegistry> {
        &self.previews
    }

    /// Transforms dispatched whose completion has not been applied yet,
    /// including ones for items removed since.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// The most recent commit attempt, if any.
    pub fn last_commit(&self) -> Option<&CommitStatus> {
        self.last_commit.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    pub fn progress(&self) -> Progress {
        let (mut done, mut failed) = (0, 0);
        for item in self.queue.items() {
            match item.status().stage() {
                Stage::Done => done += 1,
                Stage::Error => failed += 1,
                _ => {}
            }
        }
        Progress::new(done, failed, self.queue.len())
    }

    // ── Queue operations ────────────────────────────────────────────────────────────

    /// Admits `files` into the queue.
    ///
    /// For per-item tools every accepted item starts processing immediately;
    /// whole-queue tools leave them `Pending` until [`commit`](Self::commit).
    pub fn ingest(&mut self, files: Vec<SourceFile>) -> IngestOutcome {
        let report = FileIngestor::new(self.tool.accepted_kinds(), &self.config.admission)
            .ingest(files, self.queue.len(), self.queue.total_bytes(), &self.previews);

        let mut outcome = IngestOutcome {
            accepted: Vec::with_capacity(report.items.len()),
            rejected: report.rejected,
        };
        for error in outcome.rejection_errors() {
            warn!("{}", error);
        }
        for rejection in &outcome.rejected {
            self.emit(PipelineEvent::ItemRejected {
                rejection: rejection.clone(),
            });
        }

        for item in report.items {
            let event = PipelineEvent::ItemQueued {
                id: item.id(),
                name: item.name().to_string(),
                original_size: item.original_size(),
                preview_url: item.preview().map(|handle| handle.url()),
            };
            let id = item.id();

            if let Err(mut duplicate) = self.queue.insert(item) {
                warn!("Duplicate item id {}; dropping '{}'", id, duplicate.name());
                self.release_preview(&mut duplicate);
                continue;
            }
            self.emit(event);
            outcome.accepted.push(id);
        }

        if self.tool.output_mode() == OutputMode::PerItem {
            for &id in &outcome.accepted {
                self.start_item(id);
            }
        }

        debug!(
            "Ingested {} files ({} rejected), queue now {}",
            outcome.accepted.len(),
            outcome.rejected.len(),
            self.queue.len()
        );
        outcome
    }

    /// Removes one item and releases its preview.
    ///
    /// An in-flight transform for the item keeps running; its completion is
    /// discarded when it arrives.
    pub fn remove(&mut self, id: ItemId) -> PipelineResult<()> {
        let mut item = self.queue.remove(id).ok_or(PipelineError::NotFound(id))?;
        self.release_preview(&mut item);

        debug!("Removed '{}'", item.name());
        self.emit(PipelineEvent::ItemRemoved { id });
        Ok(())
    }

    /// Moves the item one place towards the head. Returns whether it moved.
    pub fn move_up(&mut self, id: ItemId) -> PipelineResult<bool> {
        self.ensure_queued(id)?;
        let moved = self.queue.move_up(id);
        if moved {
            self.emit_order();
        }
        Ok(moved)
    }

    /// Moves the item one place towards the tail. Returns whether it moved.
    pub fn move_down(&mut self, id: ItemId) -> PipelineResult<bool> {
        self.ensure_queued(id)?;
        let moved = self.queue.move_down(id);
        if moved {
            self.emit_order();
        }
        Ok(moved)
    }

    /// Empties the queue, releasing every preview. Returns the item count.
    pub fn clear(&mut self) -> usize {
        let removed = self.release_all();
        self.emit(PipelineEvent::QueueCleared { removed });
        removed
    }

    /// Explicit teardown; equivalent to dropping the session.
    pub fn deactivate(self) {
        info!("Deactivating {} tool", self.tool);
    }

    // ── Completions ─────────────────────────────────────────────────────────────────

    /// Waits for and applies the next per-item completion.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<CompletionOutcome> {
        if self.in_flight == 0 {
            return None;
        }

        // The session holds a sender, so the channel cannot close under us
        let completion = self.completions_rx.recv().await?;
        self.in_flight -= 1;
        Some(self.apply_completion(completion))
    }

    /// Applies completions until nothing is in flight.
    ///
    /// A transform that never finishes keeps this waiting; there is no timeout.
    pub async fn run_until_idle(&mut self) -> Vec<CompletionOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.next_completion().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    // ── Output ──────────────────────────────────────────────────────────────────────

    /// Artifact for a `Done` item under its `compressed-` name.
    pub fn download(&self, id: ItemId) -> Option<OutputArtifact> {
        self.queue.get(id).and_then(assemble_item)
    }

    /// Artifacts of every `Done` item, in queue order.
    pub fn downloads(&self) -> Vec<OutputArtifact> {
        self.queue.items().iter().filter_map(assemble_item).collect()
    }

    /// Runs the tool's whole-queue transform over a snapshot of the current order.
    ///
    /// The queue is left untouched whatever the outcome, so items can be
    /// reordered or removed and the commit repeated.
    ///
    /// Queued items are not moved to `Processing` and stay `Pending`. The
    /// attempt's `Pending → Processing → Done | Error` transitions are tracked
    /// on its own [`CommitStatus`], readable through
    /// [`last_commit`](Self::last_commit), and a failure is
    /// [`PipelineError::CommitFailed`] for the attempt as a whole.
    pub async fn commit(&mut self) -> PipelineResult<OutputArtifact> {
        let transform = Transform::for_tool(self.tool, &self.config);
        if transform.is_per_item() {
            return Err(PipelineError::unsupported(format!(
                "{} has no commit step",
                self.tool
            )));
        }
        if self.queue.is_empty() {
            return Err(PipelineError::EmptyQueue);
        }

        let snapshot = self.queue.snapshot();
        let mut attempt = CommitStatus::Pending;
        attempt.begin()?;
        info!(
            "Committing {} items for {} (revision {})",
            snapshot.len(),
            self.tool,
            self.queue.revision()
        );
        self.emit(PipelineEvent::CommitStarted {
            items: snapshot.len(),
        });

        let result = self
            .engine
            .run_whole_queue(transform, snapshot)
            .await
            .and_then(|bytes| {
                assemble_commit(self.tool, bytes)
                    .ok_or_else(|| PipelineError::unsupported("tool has no commit output"))
            });

        match result {
            Ok(artifact) => {
                attempt.complete(artifact.clone())?;
                info!("{} ready ({} bytes)", artifact.file_name(), artifact.size());
                self.emit(PipelineEvent::CommitCompleted {
                    file_name: artifact.file_name().to_string(),
                    size: artifact.size(),
                });
                self.last_commit = Some(attempt);
                Ok(artifact)
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("Commit for {} failed: {}", self.tool, reason);
                attempt.fail(PipelineError::CommitFailed(reason.clone()))?;
                self.emit(PipelineEvent::CommitFailed {
                    error: reason.clone(),
                });
                self.last_commit = Some(attempt);
                Err(PipelineError::CommitFailed(reason))
            }
        }
    }

    // ── Internals ───────────────────────────────────────────────────────────────────

    fn start_item(&mut self, id: ItemId) {
        let Transform::ImageCompress(settings) = Transform::for_tool(self.tool, &self.config)
        else {
            return;
        };

        let started = self.queue.update(id, |item| {
            item.status.begin().map(|_| item.source().clone())
        });

        match started {
            Some(Ok(source)) => {
                self.emit(PipelineEvent::ItemStarted { id });
                match self.runtime.clone() {
                    Some(runtime) => {
                        self.in_flight += 1;
                        self.engine.spawn_item(
                            &runtime,
                            id,
                            source,
                            settings,
                            self.completions_tx.clone(),
                        );
                    }
                    None => {
                        let error = PipelineError::TransformFailed(format!(
                            "no async runtime to process '{}'",
                            source.name()
                        ));
                        self.apply_completion(Completion { id, result: Err(error) });
                    }
                }
            }
            Some(Err(e)) => warn!("Cannot start item {}: {}", id, e),
            None => debug!("Item {} vanished before it started", id),
        }
    }

    fn apply_completion(&mut self, completion: Completion) -> CompletionOutcome {
        let Completion { id, result } = completion;

        let applied = self.queue.update(id, |item| {
            let transition = item.status.settle(result);
            (
                transition,
                item.status.stage(),
                item.stats(),
                item.status.error().map(ToString::to_string),
            )
        });

        let Some((transition, stage, stats, error)) = applied else {
            debug!("Discarding completion for removed item {}", id);
            self.emit(PipelineEvent::CompletionDiscarded { id });
            return CompletionOutcome::Discarded { id };
        };

        if let Err(e) = transition {
            warn!("Completion for item {} not applied: {}", id, e);
            return CompletionOutcome::Applied { id, stage };
        }

        match (stats, error) {
            (Some(stats), _) => {
                debug!(
                    "Item {} done ({} bytes saved / {:.0}% compression)",
                    id, stats.saved_bytes, stats.compression_ratio
                );
                self.emit(PipelineEvent::ItemCompleted { id, stats });
            }
            (None, Some(error)) => {
                warn!("Item {} failed: {}", id, error);
                self.emit(PipelineEvent::ItemFailed { id, error });
            }
            (None, None) => {}
        }

        CompletionOutcome::Applied { id, stage }
    }

    fn ensure_queued(&self, id: ItemId) -> PipelineResult<()> {
        if self.queue.contains(id) {
            Ok(())
        } else {
            Err(PipelineError::NotFound(id))
        }
    }

    fn release_preview(&self, item: &mut QueueItem) {
        if let Some(handle) = item.take_preview() {
            if let Err(e) = self.previews.release(handle) {
                warn!("Preview release for '{}' failed: {}", item.name(), e);
            }
        }
    }

    fn release_all(&mut self) -> usize {
        let mut drained = self.queue.clear();
        for item in &mut drained {
            self.release_preview(item);
        }
        drained.len()
    }

    fn emit_order(&self) {
        self.emit(PipelineEvent::QueueReordered {
            order: self.queue.ids(),
        });
    }

    fn emit(&self, event: PipelineEvent) {
        // No subscriber is not an error
        let _ = self.events.send(event);
    }
}

impl Drop for ToolSession {
    fn drop(&mut self) {
        let released = self.release_all();
        if released > 0 {
            debug!("Teardown released {} items", released);
        }
    }
}

impl std::fmt::Debug for ToolSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSession")
            .field("tool", &self.tool)
            .field("items", &self.queue.len())
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}
