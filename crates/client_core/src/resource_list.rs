use std::{collections::HashSet, fmt, hash::Hash, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{DraftId, StyleId},
    protocol::{Draft, StyleProfile},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{api::StudioApi, error::ClientError, events::StudioEvent, Confirmation};

/// A remotely-backed collection item that can be listed and deleted by id.
#[async_trait]
pub trait ListedResource: Clone + fmt::Debug + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static;

    const KIND: &'static str;
    const CHANGED_EVENT: StudioEvent;

    fn id(&self) -> &Self::Id;
    fn delete_prompt(&self) -> String;

    async fn fetch_all(api: &dyn StudioApi) -> Result<Vec<Self>, ClientError>;
    async fn delete_remote(api: &dyn StudioApi, id: &Self::Id) -> Result<(), ClientError>;
}

#[async_trait]
impl ListedResource for StyleProfile {
    type Id = StyleId;

    const KIND: &'static str = "style";
    const CHANGED_EVENT: StudioEvent = StudioEvent::StylesChanged;

    fn id(&self) -> &StyleId {
        &self.id
    }

    fn delete_prompt(&self) -> String {
        format!("Are you sure you want to delete the style \"{}\"?", self.name)
    }

    async fn fetch_all(api: &dyn StudioApi) -> Result<Vec<Self>, ClientError> {
        api.list_styles().await
    }

    async fn delete_remote(api: &dyn StudioApi, id: &StyleId) -> Result<(), ClientError> {
        api.delete_style(id).await
    }
}

#[async_trait]
impl ListedResource for Draft {
    type Id = DraftId;

    const KIND: &'static str = "draft";
    const CHANGED_EVENT: StudioEvent = StudioEvent::DraftsChanged;

    fn id(&self) -> &DraftId {
        &self.id
    }

    fn delete_prompt(&self) -> String {
        "Are you sure you want to delete this draft?".to_string()
    }

    async fn fetch_all(api: &dyn StudioApi) -> Result<Vec<Self>, ClientError> {
        api.list_drafts().await
    }

    async fn delete_remote(api: &dyn StudioApi, id: &DraftId) -> Result<(), ClientError> {
        api.delete_draft(id).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user answered "no"; nothing was sent.
    Declined,
}

#[derive(Debug, Clone)]
pub struct ListSnapshot<R: ListedResource> {
    pub items: Vec<R>,
    pub loading: bool,
    pub error: Option<String>,
    pub deleting: Vec<R::Id>,
    pub selected: Option<R::Id>,
}

enum Selection<Id> {
    Untracked,
    Tracked(Option<Id>),
}

struct ListState<R: ListedResource> {
    items: Vec<R>,
    pending_loads: usize,
    error: Option<String>,
    deleting: HashSet<R::Id>,
    selection: Selection<R::Id>,
}

impl<R: ListedResource> ListState<R> {
    fn contains(&self, id: &R::Id) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    /// Keeps a tracked selection pointing at a listed item: the current one if
    /// still present, else the first item, else none.
    fn reconcile_selection(&mut self) {
        let Selection::Tracked(selected) = &self.selection else {
            return;
        };
        let still_listed = selected.as_ref().is_some_and(|id| self.contains(id));
        if !still_listed {
            let fallback = self.items.first().map(|item| item.id().clone());
            self.selection = Selection::Tracked(fallback);
        }
    }

    fn selected(&self) -> Option<R::Id> {
        match &self.selection {
            Selection::Tracked(selected) => selected.clone(),
            Selection::Untracked => None,
        }
    }
}

/// Owns one remote collection: loading, per-item deletes, and (for styles)
/// the current selection.
pub struct ResourceListController<R: ListedResource> {
    api: Arc<dyn StudioApi>,
    confirmation: Arc<dyn Confirmation>,
    events: broadcast::Sender<StudioEvent>,
    inner: Mutex<ListState<R>>,
}

impl<R: ListedResource> ResourceListController<R> {
    pub fn new(
        api: Arc<dyn StudioApi>,
        confirmation: Arc<dyn Confirmation>,
        events: broadcast::Sender<StudioEvent>,
    ) -> Self {
        Self::build(api, confirmation, events, Selection::Untracked)
    }

    /// Controller whose selection follows the list as it changes.
    pub fn with_selection(
        api: Arc<dyn StudioApi>,
        confirmation: Arc<dyn Confirmation>,
        events: broadcast::Sender<StudioEvent>,
    ) -> Self {
        Self::build(api, confirmation, events, Selection::Tracked(None))
    }

    fn build(
        api: Arc<dyn StudioApi>,
        confirmation: Arc<dyn Confirmation>,
        events: broadcast::Sender<StudioEvent>,
        selection: Selection<R::Id>,
    ) -> Self {
        Self {
            api,
            confirmation,
            events,
            inner: Mutex::new(ListState {
                items: Vec::new(),
                pending_loads: 0,
                error: None,
                deleting: HashSet::new(),
                selection,
            }),
        }
    }

    fn notify(&self) {
        let _ = self.events.send(R::CHANGED_EVENT);
    }

    /// Fetches the collection. A failure keeps the previously loaded items.
    pub async fn load(&self) -> Result<usize, ClientError> {
        self.inner.lock().await.pending_loads += 1;
        self.notify();

        let result = R::fetch_all(self.api.as_ref()).await;

        let outcome = {
            let mut state = self.inner.lock().await;
            state.pending_loads = state.pending_loads.saturating_sub(1);
            match result {
                Ok(items) => {
                    let count = items.len();
                    state.items = items;
                    state.error = None;
                    state.reconcile_selection();
                    debug!(kind = R::KIND, count, "collection loaded");
                    Ok(count)
                }
                Err(err) => {
                    warn!(kind = R::KIND, error = %err, "collection load failed");
                    state.error = Some(err.to_string());
                    Err(err)
                }
            }
        };
        self.notify();
        outcome
    }

    pub async fn delete(&self, id: &R::Id) -> Result<DeleteOutcome, ClientError> {
        let prompt = {
            let state = self.inner.lock().await;
            let Some(item) = state.items.iter().find(|item| item.id() == id) else {
                return Err(ClientError::rejected(format!(
                    "{} {id} is not in the current list",
                    R::KIND
                )));
            };
            if state.deleting.contains(id) {
                return Err(ClientError::rejected(format!(
                    "{} {id} is already being deleted",
                    R::KIND
                )));
            }
            item.delete_prompt()
        };

        if !self.confirmation.confirm(&prompt).await {
            debug!(kind = R::KIND, id = %id, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        {
            let mut state = self.inner.lock().await;
            // The list may have been refreshed while the prompt was open.
            if !state.contains(id) {
                return Err(ClientError::rejected(format!(
                    "{} {id} is not in the current list",
                    R::KIND
                )));
            }
            if !state.deleting.insert(id.clone()) {
                return Err(ClientError::rejected(format!(
                    "{} {id} is already being deleted",
                    R::KIND
                )));
            }
            state.error = None;
        }
        self.notify();

        let result = R::delete_remote(self.api.as_ref(), id).await;

        let outcome = {
            let mut state = self.inner.lock().await;
            state.deleting.remove(id);
            match result {
                Ok(()) => {
                    state.items.retain(|item| item.id() != id);
                    state.reconcile_selection();
                    info!(kind = R::KIND, id = %id, "deleted");
                    Ok(DeleteOutcome::Deleted)
                }
                Err(err) => {
                    warn!(kind = R::KIND, id = %id, error = %err, "delete failed");
                    state.error = Some(err.to_string());
                    Err(err)
                }
            }
        };
        self.notify();
        outcome
    }

    pub async fn select(&self, id: &R::Id) -> Result<(), ClientError> {
        {
            let mut state = self.inner.lock().await;
            if matches!(state.selection, Selection::Untracked) {
                return Err(ClientError::rejected(format!(
                    "{} lists do not track a selection",
                    R::KIND
                )));
            }
            if !state.contains(id) {
                return Err(ClientError::rejected(format!(
                    "{} {id} is not in the current list",
                    R::KIND
                )));
            }
            state.selection = Selection::Tracked(Some(id.clone()));
        }
        self.notify();
        Ok(())
    }

    pub async fn selected(&self) -> Option<R::Id> {
        self.inner.lock().await.selected()
    }

    pub async fn contains(&self, id: &R::Id) -> bool {
        self.inner.lock().await.contains(id)
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.items.is_empty()
    }

    pub async fn items(&self) -> Vec<R> {
        self.inner.lock().await.items.clone()
    }

    pub async fn snapshot(&self) -> ListSnapshot<R> {
        let state = self.inner.lock().await;
        ListSnapshot {
            items: state.items.clone(),
            loading: state.pending_loads > 0,
            error: state.error.clone(),
            deleting: state.deleting.iter().cloned().collect(),
            selected: state.selected(),
        }
    }
}

#[cfg(test)]
#[path = "tests/resource_list_tests.rs"]
mod tests;
