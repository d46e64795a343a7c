//! Session controller
//!
//! Owns the selection for one open-to-close cycle of the upload surface.
//! The handle is cheap to clone so a cancel can be issued while an ingestion
//! or upload is still pending. Every reset bumps an epoch; work that started
//! under an older epoch is discarded when it finishes.

use super::progress::PROGRESS_DONE;
use super::{IngestReport, ProgressReporter, SessionError, SessionState, SessionStatus, Settings};
use crate::domain::{FileDescriptor, UploadMode};
use crate::ingest::picker::PickedFile;
use crate::ingest::reconcile::DropPayload;
use crate::ingest::selection::{merge, SelectionSet};
use crate::upload::Uploader;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

pub(crate) struct SessionInner {
    pub(crate) state: SessionState,
    pub(crate) mode: UploadMode,
    pub(crate) selection: SelectionSet,
    pub(crate) progress: u8,
    pub(crate) epoch: u64,
}

impl SessionInner {
    fn new(mode: UploadMode) -> Self {
        Self { state: SessionState::Idle, mode, selection: SelectionSet::new(), progress: 0, epoch: 0 }
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            progress: self.progress,
            selected: self.selection.len(),
            total_bytes: self.selection.total_bytes(),
        }
    }

    /// Drop the selection and everything transient; stale work is invalidated.
    fn reset(&mut self, state: SessionState) {
        self.epoch += 1;
        self.selection.clear();
        self.progress = 0;
        self.state = state;
    }
}

/// Session state plus the channel observers watch it through.
#[derive(Clone)]
pub(crate) struct Shared {
    inner: Arc<Mutex<SessionInner>>,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl Shared {
    fn new(mode: UploadMode) -> Self {
        let inner = SessionInner::new(mode);
        let (tx, _rx) = watch::channel(inner.status());
        Self { inner: Arc::new(Mutex::new(inner)), status: Arc::new(tx) }
    }

    pub(crate) fn detached() -> Self {
        Self::new(UploadMode::default())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the lock and publish a new status if it reports a change.
    pub(crate) fn update(&self, f: impl FnOnce(&mut SessionInner) -> bool) {
        let mut inner = self.lock();
        if f(&mut inner) {
            self.publish(&inner);
        }
    }

    fn publish(&self, inner: &SessionInner) {
        self.status.send_replace(inner.status());
    }
}

#[derive(Clone)]
pub struct IngestionController {
    shared: Shared,
    settings: Arc<Settings>,
}

impl IngestionController {
    pub fn new(settings: Settings) -> Self {
        Self { shared: Shared::new(settings.mode), settings: Arc::new(settings) }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.lock().status()
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    pub fn mode(&self) -> UploadMode {
        self.shared.lock().mode
    }

    /// Snapshot of the current selection.
    pub fn selection(&self) -> SelectionSet {
        self.shared.lock().selection.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.shared.status.subscribe()
    }

    /// Switch picker mode. A real change clears the selection.
    pub fn set_mode(&self, mode: UploadMode) -> Result<(), SessionError> {
        let mut inner = self.shared.lock();
        if inner.mode == mode {
            return Ok(());
        }
        if !inner.state.accepts_ingest() {
            return Err(SessionError::Busy { state: inner.state });
        }
        inner.mode = mode;
        inner.reset(SessionState::Idle);
        tracing::debug!("Upload mode switched to {}", mode);
        self.shared.publish(&inner);
        Ok(())
    }

    /// Ingest a native picker selection. No traversal is involved.
    pub fn ingest_picker(&self, files: &[PickedFile]) -> Result<IngestReport, SessionError> {
        let epoch = self.begin_ingest()?;
        let batch = files.iter().map(PickedFile::to_descriptor).collect();
        self.accept_batch(epoch, batch, IngestReport::default())
    }

    /// Ingest a drop: reconcile entries with the flat list, then filter,
    /// validate and merge. Results are discarded if the session was reset
    /// while the traversal was running.
    pub async fn ingest_drop(&self, payload: &DropPayload) -> Result<IngestReport, SessionError> {
        let epoch = self.begin_ingest()?;
        let reconciled = payload.reconcile(&self.settings.traversal).await;
        let report = IngestReport {
            fallbacks: reconciled.fallbacks,
            degraded: reconciled.degraded,
            traversal: reconciled.report,
            ..IngestReport::default()
        };
        self.accept_batch(epoch, reconciled.descriptors, report)
    }

    /// Remove one entry by identity key.
    pub fn remove(&self, key: &str) -> Option<FileDescriptor> {
        let mut inner = self.shared.lock();
        if !inner.state.accepts_ingest() {
            return None;
        }
        let removed = inner.selection.remove(key)?;
        if inner.selection.is_empty() {
            inner.state = SessionState::Idle;
        }
        self.shared.publish(&inner);
        Some(removed)
    }

    /// Hand the selection to `uploader`. On success the session shows
    /// `Completed` for the configured linger time and then resets to `Idle`;
    /// on failure it returns to `Selecting` with the selection intact.
    pub async fn confirm_upload<U>(&self, uploader: &U) -> Result<(), SessionError>
    where
        U: Uploader + ?Sized,
    {
        let (snapshot, epoch) = {
            let mut inner = self.shared.lock();
            match inner.state {
                SessionState::Uploading | SessionState::Completed | SessionState::Failed => {
                    return Err(SessionError::Busy { state: inner.state });
                }
                SessionState::Idle | SessionState::Selecting | SessionState::Cancelled => {}
            }
            if inner.selection.is_empty() {
                return Err(SessionError::EmptySelection);
            }
            inner.state = SessionState::Uploading;
            inner.progress = 0;
            self.shared.publish(&inner);
            (inner.selection.clone(), inner.epoch)
        };

        tracing::debug!("Uploading {} file(s)", snapshot.len());
        let reporter = ProgressReporter::new(self.shared.clone(), epoch);
        let result = uploader.upload(&snapshot, reporter).await;

        let mut inner = self.shared.lock();
        if inner.epoch != epoch {
            tracing::debug!("Discarding upload result for a reset session");
            return Err(SessionError::Cancelled);
        }
        match result {
            Ok(()) => {
                inner.state = SessionState::Completed;
                inner.progress = PROGRESS_DONE;
                self.shared.publish(&inner);
                drop(inner);
                self.schedule_reset(epoch);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Upload failed: {:#}", err);
                inner.state = SessionState::Failed;
                self.shared.publish(&inner);
                inner.state = SessionState::Selecting;
                inner.progress = 0;
                self.shared.publish(&inner);
                Err(SessionError::UploadFailed)
            }
        }
    }

    /// Close the surface: discard the selection and invalidate in-flight work.
    pub fn cancel(&self) {
        let mut inner = self.shared.lock();
        let next = if inner.state == SessionState::Completed {
            SessionState::Idle
        } else {
            SessionState::Cancelled
        };
        inner.reset(next);
        self.shared.publish(&inner);
    }

    fn begin_ingest(&self) -> Result<u64, SessionError> {
        let inner = self.shared.lock();
        if !inner.state.accepts_ingest() {
            return Err(SessionError::Busy { state: inner.state });
        }
        Ok(inner.epoch)
    }

    fn accept_batch(
        &self,
        epoch: u64,
        batch: Vec<FileDescriptor>,
        mut report: IngestReport,
    ) -> Result<IngestReport, SessionError> {
        let before = batch.len();
        let batch = self.settings.artifacts.filter_artifacts(batch);
        report.artifacts = before - batch.len();

        let mut inner = self.shared.lock();
        if inner.epoch != epoch {
            tracing::debug!("Discarding ingestion result for a reset session");
            return Err(SessionError::Cancelled);
        }
        if !inner.state.accepts_ingest() {
            return Err(SessionError::Busy { state: inner.state });
        }

        if inner.mode == UploadMode::File {
            if let Some(offending) = batch.iter().find(|d| d.is_nested()) {
                return Err(SessionError::PolicyViolation {
                    mode: inner.mode,
                    offending: offending.identity_key().to_string(),
                });
            }
        }

        let existing = std::mem::take(&mut inner.selection);
        let outcome = merge(existing, batch);
        inner.selection = outcome.selection;
        report.accepted = outcome.added;
        report.duplicates = outcome.duplicates;

        if !inner.selection.is_empty() && inner.state != SessionState::Selecting {
            inner.state = SessionState::Selecting;
            inner.progress = 0;
        }
        self.shared.publish(&inner);

        tracing::debug!(
            "Ingested batch: {} added, {} duplicate(s), {} artifact(s), {} fallback(s)",
            report.accepted,
            report.duplicates,
            report.artifacts,
            report.fallbacks
        );
        Ok(report)
    }

    fn schedule_reset(&self, epoch: u64) {
        let shared = self.shared.clone();
        let linger = self.settings.completion_linger;
        let reset = move || {
            let mut inner = shared.lock();
            if inner.epoch == epoch && inner.state == SessionState::Completed {
                inner.reset(SessionState::Idle);
                shared.publish(&inner);
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(linger).await;
                    reset();
                });
            }
            Err(_) => reset(),
        }
    }
}
