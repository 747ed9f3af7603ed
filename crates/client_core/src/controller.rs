//! Summary lifecycle controller.
//!
//! Owns the [`SummaryCache`] and mutates it only after the store confirms an
//! operation. Every operation takes a sequence number when it starts; a reload
//! response never overrides an edit or delete that started after the reload did.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use shared::domain::{Summary, SummaryId};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    cache::{SummaryCache, SummaryPatch},
    error::{ClientError, StoreError},
    sort::{sort_summaries, SortField, SortOrder},
    store::{FileUpload, SummaryStore},
    ClientEvent, Operation,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Token returned by [`SummaryController::request_delete`]. Nothing is sent to
/// the store until it is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    token: u64,
    id: SummaryId,
}

impl PendingDelete {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn id(&self) -> &SummaryId {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Already gone locally or at the store.
    AlreadyAbsent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Applied(Summary),
    /// The id is not (or no longer) in the cache.
    Stale,
}

#[derive(Debug, Clone)]
enum ConfirmedChange {
    Edited { text: String },
    Deleted,
}

#[derive(Debug, Clone)]
struct ConfirmedMutation {
    started_at: u64,
    change: ConfirmedChange,
}

struct ControllerState {
    cache: SummaryCache,
    order: SortOrder,
    selected: Option<Summary>,
    pending_deletes: HashMap<u64, SummaryId>,
    next_token: u64,
    next_seq: u64,
    last_applied_reload: Option<u64>,
    confirmed: HashMap<SummaryId, ConfirmedMutation>,
}

impl ControllerState {
    fn new(order: SortOrder) -> Self {
        Self {
            cache: SummaryCache::new(),
            order,
            selected: None,
            pending_deletes: HashMap::new(),
            next_token: 1,
            next_seq: 1,
            last_applied_reload: None,
            confirmed: HashMap::new(),
        }
    }

    fn next_sequence(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Returns `false` when a reload that started later was already applied.
    fn apply_reload(&mut self, started_at: u64, records: Vec<Summary>) -> bool {
        if self
            .last_applied_reload
            .is_some_and(|applied| applied > started_at)
        {
            return false;
        }

        let mut returned = HashSet::with_capacity(records.len());
        let mut merged = Vec::with_capacity(records.len());
        for mut record in records {
            returned.insert(record.id.clone());
            if let Some(mutation) = self.confirmed.get(&record.id) {
                if mutation.started_at > started_at {
                    match &mutation.change {
                        ConfirmedChange::Deleted => continue,
                        ConfirmedChange::Edited { text } => {
                            record.summary_text = Some(text.clone());
                        }
                    }
                }
            }
            merged.push(record);
        }

        for (id, mutation) in &self.confirmed {
            let newer_edit = mutation.started_at > started_at
                && matches!(mutation.change, ConfirmedChange::Edited { .. });
            if newer_edit && !returned.contains(id) {
                if let Some(existing) = self.cache.get(id) {
                    merged.push(existing.clone());
                }
            }
        }

        self.cache.load(merged);
        self.confirmed
            .retain(|_, mutation| mutation.started_at > started_at);
        self.last_applied_reload = Some(started_at);
        true
    }

    /// Re-reads the selected record from the cache. Returns whether it changed.
    fn refresh_selection(&mut self) -> bool {
        let Some(current) = self.selected.as_ref() else {
            return false;
        };
        let refreshed = self.cache.get(&current.id).cloned();
        if refreshed.as_ref() == Some(current) {
            return false;
        }
        self.selected = refreshed;
        true
    }
}

/// Counts one in-flight reload. The count drops with the guard, so a reload
/// future cancelled mid-request still clears the loading flag.
struct LoadingGuard<'a> {
    controller: &'a SummaryController,
}

impl<'a> LoadingGuard<'a> {
    fn enter(controller: &'a SummaryController) -> Self {
        if controller.inflight_reloads.fetch_add(1, Ordering::SeqCst) == 0 {
            controller.emit(ClientEvent::LoadingChanged(true));
        }
        Self { controller }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.controller.inflight_reloads.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.controller.emit(ClientEvent::LoadingChanged(false));
        }
    }
}

pub struct SummaryController {
    store: Arc<dyn SummaryStore>,
    inner: Mutex<ControllerState>,
    inflight_reloads: AtomicUsize,
    events: broadcast::Sender<ClientEvent>,
}

impl SummaryController {
    pub fn new(store: Arc<dyn SummaryStore>) -> Arc<Self> {
        Self::with_sort_order(store, SortOrder::default())
    }

    pub fn with_sort_order(store: Arc<dyn SummaryStore>, order: SortOrder) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            store,
            inner: Mutex::new(ControllerState::new(order)),
            inflight_reloads: AtomicUsize::new(0),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    fn report_failure(&self, err: &ClientError) {
        if let Some(operation) = err.operation() {
            self.emit(ClientEvent::OperationFailed {
                operation,
                notice: err.notice(),
            });
        }
    }

    /// Replaces the cache with the store's collection. On failure the cache is left as is.
    pub async fn reload(&self) -> Result<(), ClientError> {
        let _loading = LoadingGuard::enter(self);
        let started_at = self.inner.lock().await.next_sequence();

        let result = self.store.list_summaries().await;

        let mut guard = self.inner.lock().await;
        match result {
            Ok(records) => {
                if guard.apply_reload(started_at, records) {
                    info!(reload = started_at, count = guard.cache.len(), "summaries: reloaded");
                    self.emit(ClientEvent::SummariesChanged {
                        count: guard.cache.len(),
                    });
                    if guard.refresh_selection() {
                        self.emit(ClientEvent::SelectionChanged(guard.selected.clone()));
                    }
                } else {
                    debug!(reload = started_at, "summaries: discarded stale reload response");
                }
                self.emit(ClientEvent::OperationSucceeded(Operation::Reload));
                Ok(())
            }
            Err(source) => {
                warn!(reload = started_at, error = %source, "summaries: reload failed; keeping cached list");
                let err = ClientError::store(Operation::Reload, source);
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn create_from_file(&self, upload: FileUpload) -> Result<(), ClientError> {
        if upload.filename.trim().is_empty() {
            return Err(ClientError::Validation(
                "Please choose a file to upload.".to_string(),
            ));
        }
        if upload.bytes.is_empty() {
            return Err(ClientError::Validation(format!(
                "The file {} is empty.",
                upload.filename
            )));
        }

        let filename = upload.filename.clone();
        let result = self.store.create_from_file(upload).await;
        self.finish_create(Operation::CreateFromFile, result, &filename)
            .await
    }

    pub async fn create_from_text(&self, text: &str) -> Result<(), ClientError> {
        if text.trim().is_empty() {
            return Err(ClientError::Validation(
                "Please enter some text to summarize.".to_string(),
            ));
        }

        let result = self.store.create_from_text(text).await;
        self.finish_create(Operation::CreateFromText, result, "pasted text")
            .await
    }

    /// The store owns generated fields, so a created record only reaches the
    /// cache through the follow-up reload. A failed follow-up reload does not
    /// turn the creation into a failure.
    async fn finish_create(
        &self,
        operation: Operation,
        result: Result<(), StoreError>,
        source_label: &str,
    ) -> Result<(), ClientError> {
        if let Err(source) = result {
            warn!(%operation, source = source_label, error = %source, "summaries: create failed");
            let err = ClientError::store(operation, source);
            self.report_failure(&err);
            return Err(err);
        }

        info!(%operation, source = source_label, "summaries: created");
        self.emit(ClientEvent::OperationSucceeded(operation));
        if let Err(err) = self.reload().await {
            warn!(%operation, error = %err, "summaries: reload after create failed");
        }
        Ok(())
    }

    /// Local selection only. Unknown ids select nothing.
    pub async fn view(&self, id: &SummaryId) -> Option<Summary> {
        let mut guard = self.inner.lock().await;
        let summary = guard.cache.get(id).cloned()?;
        guard.selected = Some(summary.clone());
        self.emit(ClientEvent::SelectionChanged(Some(summary.clone())));
        Some(summary)
    }

    pub async fn close_view(&self) {
        let mut guard = self.inner.lock().await;
        if guard.selected.take().is_some() {
            self.emit(ClientEvent::SelectionChanged(None));
        }
    }

    pub async fn selected(&self) -> Option<Summary> {
        self.inner.lock().await.selected.clone()
    }

    pub async fn edit(&self, id: &SummaryId, new_text: &str) -> Result<EditOutcome, ClientError> {
        let started_at = {
            let mut guard = self.inner.lock().await;
            if !guard.cache.contains(id) {
                debug!(%id, "summaries: edit targets an id that is not cached");
                return Ok(EditOutcome::Stale);
            }
            guard.next_sequence()
        };

        if let Err(source) = self.store.update_summary(id, new_text).await {
            warn!(%id, error = %source, "summaries: edit failed");
            let err = ClientError::store(Operation::Edit, source);
            self.report_failure(&err);
            return Err(err);
        }

        let mut guard = self.inner.lock().await;
        let Some(updated) = guard.cache.update(id, SummaryPatch::text(new_text)) else {
            debug!(%id, "summaries: edited summary left the cache before the store answered");
            return Ok(EditOutcome::Stale);
        };
        guard.confirmed.insert(
            id.clone(),
            ConfirmedMutation {
                started_at,
                change: ConfirmedChange::Edited {
                    text: new_text.to_string(),
                },
            },
        );
        if guard.refresh_selection() {
            self.emit(ClientEvent::SelectionChanged(guard.selected.clone()));
        }
        info!(%id, "summaries: edited");
        self.emit(ClientEvent::SummariesChanged {
            count: guard.cache.len(),
        });
        self.emit(ClientEvent::OperationSucceeded(Operation::Edit));
        Ok(EditOutcome::Applied(updated))
    }

    /// First step of a delete; issues no store call.
    pub async fn request_delete(&self, id: &SummaryId) -> PendingDelete {
        let mut guard = self.inner.lock().await;
        let token = guard.next_token;
        guard.next_token += 1;
        guard.pending_deletes.insert(token, id.clone());
        PendingDelete {
            token,
            id: id.clone(),
        }
    }

    /// Returns `true` when the token was still pending.
    pub async fn cancel_delete(&self, pending: PendingDelete) -> bool {
        let mut guard = self.inner.lock().await;
        guard.pending_deletes.remove(&pending.token).is_some()
    }

    pub async fn confirm_delete(&self, pending: PendingDelete) -> Result<DeleteOutcome, ClientError> {
        let (id, started_at) = {
            let mut guard = self.inner.lock().await;
            let id = guard
                .pending_deletes
                .remove(&pending.token)
                .ok_or(ClientError::UnknownConfirmation(pending.token))?;
            if !guard.cache.contains(&id) {
                debug!(%id, "summaries: delete of an id that is not cached");
                return Ok(DeleteOutcome::AlreadyAbsent);
            }
            let started_at = guard.next_sequence();
            (id, started_at)
        };

        let store_had_it = match self.store.delete_summary(&id).await {
            Ok(()) => true,
            Err(StoreError::NotFound(_)) => {
                debug!(%id, "summaries: store no longer has the summary; removing locally");
                false
            }
            Err(source) => {
                warn!(%id, error = %source, "summaries: delete failed; cache unchanged");
                let err = ClientError::store(Operation::Delete, source);
                self.report_failure(&err);
                return Err(err);
            }
        };

        let mut guard = self.inner.lock().await;
        guard.confirmed.insert(
            id.clone(),
            ConfirmedMutation {
                started_at,
                change: ConfirmedChange::Deleted,
            },
        );
        let removed = guard.cache.remove(&id);
        if guard.refresh_selection() {
            self.emit(ClientEvent::SelectionChanged(guard.selected.clone()));
        }
        self.emit(ClientEvent::OperationSucceeded(Operation::Delete));
        if removed.is_some() {
            info!(%id, "summaries: deleted");
            self.emit(ClientEvent::SummariesChanged {
                count: guard.cache.len(),
            });
        }
        if store_had_it && removed.is_some() {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::AlreadyAbsent)
        }
    }

    pub async fn sorted_summaries(&self) -> Vec<Summary> {
        let guard = self.inner.lock().await;
        sort_summaries(&guard.cache.snapshot(), guard.order)
    }

    pub async fn snapshot(&self) -> Vec<Summary> {
        self.inner.lock().await.cache.snapshot()
    }

    pub async fn get(&self, id: &SummaryId) -> Option<Summary> {
        self.inner.lock().await.cache.get(id).cloned()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.cache.is_empty()
    }

    pub async fn is_loading(&self) -> bool {
        self.inflight_reloads.load(Ordering::SeqCst) > 0
    }

    pub async fn sort_order(&self) -> SortOrder {
        self.inner.lock().await.order
    }

    pub async fn set_sort_order(&self, order: SortOrder) {
        self.inner.lock().await.order = order;
    }

    /// Column-header click: toggles direction on the active field, otherwise
    /// switches field and starts ascending.
    pub async fn select_sort_field(&self, field: SortField) -> SortOrder {
        let mut guard = self.inner.lock().await;
        guard.order = guard.order.select(field);
        guard.order
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
