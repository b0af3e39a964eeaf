use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::protocol::{Draft, StyleProfile};
use tokio::sync::broadcast;
use tracing::info;

pub mod actions;
pub mod analyzer;
pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod generation;
pub mod resource_list;

pub use actions::{CandidateActions, CopyStatus, DraftContext, PerItemActionTracker, SaveStatus};
pub use analyzer::{AnalyzerSnapshot, StyleAnalyzer};
pub use api::{HttpStudioApi, StudioApi};
pub use config::{load_settings, ClientSettings};
pub use error::ClientError;
pub use events::StudioEvent;
pub use generation::{
    GenerationForm, GenerationSession, SessionPhase, SessionSnapshot, SubmitOutcome,
};
pub use resource_list::{DeleteOutcome, ListSnapshot, ListedResource, ResourceListController};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Yes/no decision point shown before destructive operations.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt with "yes".
pub struct AlwaysConfirm;

#[async_trait]
impl Confirmation for AlwaysConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

pub struct MissingClipboard;

impl Clipboard for MissingClipboard {
    fn write_text(&self, _text: &str) -> Result<()> {
        Err(anyhow!("clipboard is unavailable"))
    }
}

/// Wires one backend into every view: the style and draft lists, the
/// generation session (which reads the style list) and the analyzer.
pub struct Studio {
    styles: Arc<ResourceListController<StyleProfile>>,
    drafts: Arc<ResourceListController<Draft>>,
    session: Arc<GenerationSession>,
    analyzer: Arc<StyleAnalyzer>,
    events: broadcast::Sender<StudioEvent>,
}

impl Studio {
    pub fn new(
        api: Arc<dyn StudioApi>,
        confirmation: Arc<dyn Confirmation>,
        clipboard: Arc<dyn Clipboard>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let styles = Arc::new(ResourceListController::with_selection(
            Arc::clone(&api),
            Arc::clone(&confirmation),
            events.clone(),
        ));
        let drafts = Arc::new(ResourceListController::new(
            Arc::clone(&api),
            confirmation,
            events.clone(),
        ));
        let tracker = Arc::new(PerItemActionTracker::new(
            Arc::clone(&api),
            clipboard,
            events.clone(),
        ));
        let session = Arc::new(GenerationSession::new(
            Arc::clone(&api),
            Arc::clone(&styles),
            tracker,
            events.clone(),
        ));
        let analyzer = Arc::new(StyleAnalyzer::new(api, events.clone()));

        Arc::new(Self {
            styles,
            drafts,
            session,
            analyzer,
            events,
        })
    }

    pub fn from_settings(
        settings: &ClientSettings,
        confirmation: Arc<dyn Confirmation>,
        clipboard: Arc<dyn Clipboard>,
    ) -> Result<Arc<Self>> {
        info!(api_base_url = %settings.api_base_url, "connecting studio client");
        let api = HttpStudioApi::new(settings)?;
        Ok(Self::new(Arc::new(api), confirmation, clipboard))
    }

    /// Initial load of both collections, issued concurrently.
    pub async fn mount(&self) -> (Result<usize, ClientError>, Result<usize, ClientError>) {
        futures::join!(self.styles.load(), self.drafts.load())
    }

    pub fn styles(&self) -> &Arc<ResourceListController<StyleProfile>> {
        &self.styles
    }

    pub fn drafts(&self) -> &Arc<ResourceListController<Draft>> {
        &self.drafts
    }

    pub fn session(&self) -> &Arc<GenerationSession> {
        &self.session
    }

    pub fn analyzer(&self) -> &Arc<StyleAnalyzer> {
        &self.analyzer
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StudioEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
