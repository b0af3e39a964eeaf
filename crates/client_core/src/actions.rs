use std::{collections::HashMap, sync::Arc, time::Duration};

use shared::{
    domain::{DraftId, StyleId},
    protocol::SaveDraftRequest,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{api::StudioApi, error::ClientError, events::StudioEvent, Clipboard};

pub const COPY_FEEDBACK_WINDOW: Duration = Duration::from_secs(2);
pub const SAVE_STATUS_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CopyStatus {
    #[default]
    Idle,
    Copied,
}

/// Style and topic a generation ran with; attached to every saved draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftContext {
    pub style_id: StyleId,
    pub topic: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateActions {
    pub save: SaveStatus,
    pub copy: CopyStatus,
    /// Set once a save succeeds and never cleared within the session.
    pub saved_draft: Option<DraftId>,
}

impl CandidateActions {
    pub fn can_save(&self) -> bool {
        self.saved_draft.is_none() && self.save != SaveStatus::Saving
    }
}

#[derive(Default)]
struct Slot {
    actions: CandidateActions,
    save_version: u64,
    copy_version: u64,
    save_reset: Option<JoinHandle<()>>,
    copy_reset: Option<JoinHandle<()>>,
}

impl Slot {
    fn write_save(&mut self, status: SaveStatus) -> u64 {
        self.save_version += 1;
        if let Some(handle) = self.save_reset.take() {
            handle.abort();
        }
        self.actions.save = status;
        self.save_version
    }

    fn write_copy(&mut self, status: CopyStatus) -> u64 {
        self.copy_version += 1;
        if let Some(handle) = self.copy_reset.take() {
            handle.abort();
        }
        self.actions.copy = status;
        self.copy_version
    }

    fn abort_timers(&mut self) {
        for handle in [self.save_reset.take(), self.copy_reset.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

#[derive(Default)]
struct TrackerState {
    epoch: u64,
    candidates: Vec<String>,
    context: Option<DraftContext>,
    slots: HashMap<usize, Slot>,
}

/// Per-candidate save and copy status for the current generation result.
pub struct PerItemActionTracker {
    api: Arc<dyn StudioApi>,
    clipboard: Arc<dyn Clipboard>,
    events: broadcast::Sender<StudioEvent>,
    inner: Arc<Mutex<TrackerState>>,
}

impl PerItemActionTracker {
    pub fn new(
        api: Arc<dyn StudioApi>,
        clipboard: Arc<dyn Clipboard>,
        events: broadcast::Sender<StudioEvent>,
    ) -> Self {
        Self {
            api,
            clipboard,
            events,
            inner: Arc::new(Mutex::new(TrackerState::default())),
        }
    }

    /// Drops every candidate and status. Saves still in flight from before the
    /// reset finish without touching the new state.
    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        state.epoch += 1;
        for slot in state.slots.values_mut() {
            slot.abort_timers();
        }
        state.slots.clear();
        state.candidates.clear();
        state.context = None;
    }

    pub async fn attach(&self, candidates: Vec<String>, context: DraftContext) {
        let mut state = self.inner.lock().await;
        state.candidates = candidates;
        state.context = Some(context);
    }

    pub async fn actions(&self, index: usize) -> CandidateActions {
        let state = self.inner.lock().await;
        state
            .slots
            .get(&index)
            .map(|slot| slot.actions.clone())
            .unwrap_or_default()
    }

    /// Status of every current candidate, in candidate order.
    pub async fn snapshot(&self) -> Vec<CandidateActions> {
        let state = self.inner.lock().await;
        (0..state.candidates.len())
            .map(|index| {
                state
                    .slots
                    .get(&index)
                    .map(|slot| slot.actions.clone())
                    .unwrap_or_default()
            })
            .collect()
    }

    fn notify(&self, index: usize) {
        let _ = self.events.send(StudioEvent::CandidateChanged { index });
    }

    /// Copies a candidate to the clipboard. Failures are logged and leave the
    /// status untouched.
    pub async fn copy(&self, index: usize) -> bool {
        let (epoch, text) = {
            let state = self.inner.lock().await;
            let Some(text) = state.candidates.get(index).cloned() else {
                return false;
            };
            (state.epoch, text)
        };

        if let Err(err) = self.clipboard.write_text(&text) {
            warn!(index, error = %err, "copy to clipboard failed");
            return false;
        }

        {
            let mut guard = self.inner.lock().await;
            let state = &mut *guard;
            if state.epoch != epoch {
                debug!(index, "copy finished after the session was reset; status dropped");
                return true;
            }
            let slot = state.slots.entry(index).or_default();
            let version = slot.write_copy(CopyStatus::Copied);
            slot.copy_reset = Some(self.schedule_copy_reset(index, epoch, version));
        }
        self.notify(index);
        true
    }

    pub async fn save(&self, index: usize) -> Result<DraftId, ClientError> {
        let (epoch, request) = {
            let mut guard = self.inner.lock().await;
            let state = &mut *guard;
            let Some(text) = state.candidates.get(index).cloned() else {
                return Err(ClientError::rejected(format!(
                    "no generated draft at position {index}"
                )));
            };
            let context = state.context.clone();
            let slot = state.slots.entry(index).or_default();
            if slot.actions.saved_draft.is_some() {
                return Err(ClientError::rejected(format!(
                    "draft {index} is already saved"
                )));
            }
            if slot.actions.save == SaveStatus::Saving {
                return Err(ClientError::rejected(format!(
                    "draft {index} is already being saved"
                )));
            }
            slot.write_save(SaveStatus::Saving);
            let request = SaveDraftRequest {
                draft_text: text,
                style_id: context.as_ref().map(|ctx| ctx.style_id.clone()),
                topic: context.map(|ctx| ctx.topic),
            };
            (state.epoch, request)
        };
        self.notify(index);

        let result = self.api.save_draft(request).await;

        {
            let mut state = self.inner.lock().await;
            if state.epoch != epoch {
                debug!(index, "save finished after the session was reset; status dropped");
                return result.map(|saved| saved.draft_id);
            }
            let slot = state.slots.entry(index).or_default();
            let result = match result {
                Ok(saved) => {
                    let version = slot.write_save(SaveStatus::Saved);
                    slot.actions.saved_draft = Some(saved.draft_id.clone());
                    slot.save_reset = Some(self.schedule_save_reset(index, epoch, version));
                    info!(index, draft_id = %saved.draft_id, "draft saved");
                    Ok(saved.draft_id)
                }
                Err(err) => {
                    let version = slot.write_save(SaveStatus::Failed(err.to_string()));
                    slot.save_reset = Some(self.schedule_save_reset(index, epoch, version));
                    warn!(index, error = %err, "draft save failed");
                    Err(err)
                }
            };
            drop(state);
            self.notify(index);
            result
        }
    }

    fn schedule_save_reset(&self, index: usize, epoch: u64, version: u64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SAVE_STATUS_WINDOW).await;
            let mut state = inner.lock().await;
            if state.epoch != epoch {
                return;
            }
            let Some(slot) = state.slots.get_mut(&index) else {
                return;
            };
            let settled = matches!(slot.actions.save, SaveStatus::Saved | SaveStatus::Failed(_));
            if slot.save_version == version && settled {
                slot.actions.save = SaveStatus::Idle;
                slot.save_reset = None;
                drop(state);
                let _ = events.send(StudioEvent::CandidateChanged { index });
            }
        })
    }

    fn schedule_copy_reset(&self, index: usize, epoch: u64, version: u64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(COPY_FEEDBACK_WINDOW).await;
            let mut state = inner.lock().await;
            if state.epoch != epoch {
                return;
            }
            let Some(slot) = state.slots.get_mut(&index) else {
                return;
            };
            if slot.copy_version == version && slot.actions.copy == CopyStatus::Copied {
                slot.actions.copy = CopyStatus::Idle;
                slot.copy_reset = None;
                drop(state);
                let _ = events.send(StudioEvent::CandidateChanged { index });
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/actions_tests.rs"]
mod tests;
