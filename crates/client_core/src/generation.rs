use std::sync::Arc;

use shared::{
    domain::StyleId,
    protocol::{GeneratePostRequest, StyleProfile},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    actions::{DraftContext, PerItemActionTracker},
    api::StudioApi,
    error::ClientError,
    events::StudioEvent,
    resource_list::ResourceListController,
};

pub const MISSING_FIELDS_MESSAGE: &str =
    "Please select a style, enter a topic, and provide key points.";
pub const EMPTY_RESULT_NOTICE: &str =
    "The AI didn't generate any post drafts. Try adjusting your inputs.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, Default)]
pub struct GenerationForm {
    pub topic: String,
    pub key_points: String,
    pub cta: String,
    /// One subject or angle per line.
    pub subjects: String,
}

/// Splits multi-line input into trimmed, non-blank entries.
pub fn split_subjects(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

impl GenerationForm {
    /// Checks the form against the selected style and hands the style back.
    pub fn validate(&self, style_id: Option<StyleId>) -> Result<StyleId, ClientError> {
        match style_id {
            Some(style_id)
                if !self.topic.trim().is_empty() && !self.key_points.trim().is_empty() =>
            {
                Ok(style_id)
            }
            _ => Err(ClientError::Validation(MISSING_FIELDS_MESSAGE.to_string())),
        }
    }

    pub fn to_request(&self, style_id: StyleId) -> GeneratePostRequest {
        let cta = self.cta.trim();
        let subjects = split_subjects(&self.subjects);
        GeneratePostRequest {
            style_id,
            topic: self.topic.clone(),
            key_points: self.key_points.clone(),
            cta: (!cta.is_empty()).then(|| cta.to_string()),
            subjects_or_angles: (!subjects.is_empty()).then_some(subjects),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Generated(usize),
    /// Well-formed success with no drafts; the session carries a notice.
    Empty,
    Invalid(ClientError),
    Failed(ClientError),
    /// A submission is already in flight.
    Busy,
    /// The session was reset or resubmitted before this response arrived.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub candidates: Vec<String>,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub context: Option<DraftContext>,
}

struct SessionState {
    phase: SessionPhase,
    token: u64,
    candidates: Vec<String>,
    error: Option<String>,
    notice: Option<String>,
    context: Option<DraftContext>,
}

impl SessionState {
    fn clear_result(&mut self) {
        self.candidates.clear();
        self.error = None;
        self.notice = None;
        self.context = None;
    }
}

/// Validates and submits generation requests against the shared style list
/// and holds the latest result.
pub struct GenerationSession {
    api: Arc<dyn StudioApi>,
    styles: Arc<ResourceListController<StyleProfile>>,
    tracker: Arc<PerItemActionTracker>,
    events: broadcast::Sender<StudioEvent>,
    inner: Mutex<SessionState>,
}

impl GenerationSession {
    pub fn new(
        api: Arc<dyn StudioApi>,
        styles: Arc<ResourceListController<StyleProfile>>,
        tracker: Arc<PerItemActionTracker>,
        events: broadcast::Sender<StudioEvent>,
    ) -> Self {
        Self {
            api,
            styles,
            tracker,
            events,
            inner: Mutex::new(SessionState {
                phase: SessionPhase::Idle,
                token: 0,
                candidates: Vec::new(),
                error: None,
                notice: None,
                context: None,
            }),
        }
    }

    pub fn tracker(&self) -> &Arc<PerItemActionTracker> {
        &self.tracker
    }

    fn notify(&self) {
        let _ = self.events.send(StudioEvent::SessionChanged);
    }

    /// False while a submission is in flight or when no styles are loaded.
    pub async fn can_generate(&self) -> bool {
        if self.inner.lock().await.phase == SessionPhase::Submitting {
            return false;
        }
        !self.styles.is_empty().await
    }

    pub async fn submit(&self, form: &GenerationForm) -> SubmitOutcome {
        let selected = match self.styles.selected().await {
            Some(id) if self.styles.contains(&id).await => Some(id),
            _ => None,
        };

        let (token, request) = {
            let mut state = self.inner.lock().await;
            if state.phase == SessionPhase::Submitting {
                return SubmitOutcome::Busy;
            }
            state.token += 1;
            state.phase = SessionPhase::Validating;
            state.clear_result();
            self.tracker.reset().await;

            let style_id = match form.validate(selected) {
                Ok(style_id) => style_id,
                Err(err) => {
                    state.phase = SessionPhase::Failed;
                    state.error = Some(err.to_string());
                    drop(state);
                    self.notify();
                    return SubmitOutcome::Invalid(err);
                }
            };

            state.phase = SessionPhase::Submitting;
            state.context = Some(DraftContext {
                style_id: style_id.clone(),
                topic: form.topic.clone(),
            });
            (state.token, form.to_request(style_id))
        };
        self.notify();
        info!(style_id = %request.style_id, token, "submitting generation request");

        let result = self.api.generate_posts(request).await;

        let mut state = self.inner.lock().await;
        if state.token != token {
            debug!(token, current = state.token, "discarding stale generation response");
            return SubmitOutcome::Superseded;
        }

        let outcome = match result {
            Ok(response) => {
                let posts = response.generated_posts.unwrap_or_default();
                state.phase = SessionPhase::Succeeded;
                if posts.is_empty() {
                    state.notice = Some(EMPTY_RESULT_NOTICE.to_string());
                    info!(token, "generation returned no drafts");
                    SubmitOutcome::Empty
                } else {
                    let count = posts.len();
                    if let Some(context) = state.context.clone() {
                        self.tracker.attach(posts.clone(), context).await;
                    }
                    state.candidates = posts;
                    info!(token, count, "generation succeeded");
                    SubmitOutcome::Generated(count)
                }
            }
            Err(err) => {
                warn!(token, error = %err, "generation failed");
                state.phase = SessionPhase::Failed;
                state.candidates.clear();
                state.context = None;
                state.error = Some(err.to_string());
                SubmitOutcome::Failed(err)
            }
        };
        drop(state);
        self.notify();
        outcome
    }

    /// Returns to Idle and invalidates any submission still in flight.
    pub async fn reset(&self) {
        {
            let mut state = self.inner.lock().await;
            state.token += 1;
            state.phase = SessionPhase::Idle;
            state.clear_result();
            self.tracker.reset().await;
        }
        self.notify();
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.phase
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock().await;
        SessionSnapshot {
            phase: state.phase,
            candidates: state.candidates.clone(),
            error: state.error.clone(),
            notice: state.notice.clone(),
            context: state.context.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/generation_tests.rs"]
mod tests;
