use std::sync::Arc;

use shared::{
    domain::StyleId,
    protocol::{AnalyzeStyleRequest, AnalyzeStyleResponse, StyleAnalysis},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{api::StudioApi, error::ClientError, events::StudioEvent};

pub const MIN_POSTS_TEXT_CHARS: usize = 100;
pub const SHORT_INPUT_MESSAGE: &str =
    "Please paste more content (at least 100 characters) for a better analysis.";
const DEFAULT_SUCCESS_MESSAGE: &str = "Analysis complete.";

#[derive(Debug, Clone, Default)]
pub struct AnalyzerSnapshot {
    pub analyzing: bool,
    pub analysis: Option<StyleAnalysis>,
    pub style_id: Option<StyleId>,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Sends sample posts for style analysis; the backend saves the resulting
/// style, so the style list picks it up on its next load.
pub struct StyleAnalyzer {
    api: Arc<dyn StudioApi>,
    events: broadcast::Sender<StudioEvent>,
    inner: Mutex<AnalyzerSnapshot>,
}

impl StyleAnalyzer {
    pub fn new(api: Arc<dyn StudioApi>, events: broadcast::Sender<StudioEvent>) -> Self {
        Self {
            api,
            events,
            inner: Mutex::new(AnalyzerSnapshot::default()),
        }
    }

    fn notify(&self) {
        let _ = self.events.send(StudioEvent::AnalysisChanged);
    }

    pub async fn analyze(&self, posts_text: &str) -> Result<AnalyzeStyleResponse, ClientError> {
        {
            let mut state = self.inner.lock().await;
            if state.analyzing {
                return Err(ClientError::rejected("an analysis is already running"));
            }
            *state = AnalyzerSnapshot::default();

            if posts_text.trim().chars().count() < MIN_POSTS_TEXT_CHARS {
                let err = ClientError::Validation(SHORT_INPUT_MESSAGE.to_string());
                state.error = Some(err.to_string());
                drop(state);
                self.notify();
                return Err(err);
            }
            state.analyzing = true;
        }
        self.notify();

        let result = self
            .api
            .analyze_style(AnalyzeStyleRequest {
                posts_text: posts_text.to_string(),
            })
            .await;

        {
            let mut state = self.inner.lock().await;
            state.analyzing = false;
            match &result {
                Ok(response) => {
                    info!(style_id = ?response.style_id, "style analyzed");
                    state.analysis = Some(response.analysis.clone());
                    state.style_id = response.style_id.clone();
                    state.message = Some(
                        response
                            .message
                            .clone()
                            .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
                    );
                }
                Err(err) => {
                    warn!(error = %err, "style analysis failed");
                    state.error = Some(err.to_string());
                }
            }
        }
        self.notify();
        result
    }

    pub async fn snapshot(&self) -> AnalyzerSnapshot {
        self.inner.lock().await.clone()
    }
}

#[cfg(test)]
#[path = "tests/analyzer_tests.rs"]
mod tests;
