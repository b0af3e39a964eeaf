//! In-memory backend and UI collaborators shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Barrier, Mutex as StdMutex},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{DraftId, StyleId},
    protocol::{
        AnalyzeStyleRequest, AnalyzeStyleResponse, Draft, GeneratePostRequest,
        GeneratePostResponse, SaveDraftRequest, SaveDraftResponse, StyleAnalysis, StyleProfile,
    },
};
use tokio::sync::{broadcast, Mutex, Semaphore};

use crate::{api::StudioApi, error::ClientError, events::StudioEvent, Clipboard, Confirmation};

#[derive(Default)]
pub(crate) struct FakeStudioApi {
    pub styles: Mutex<Vec<StyleProfile>>,
    pub drafts: Mutex<Vec<Draft>>,
    pub list_error: Mutex<Option<ClientError>>,
    pub delete_error: Mutex<Option<ClientError>>,
    pub generate_results: Mutex<VecDeque<Result<GeneratePostResponse, ClientError>>>,
    pub save_results: Mutex<VecDeque<Result<SaveDraftResponse, ClientError>>>,
    pub analyze_result: Mutex<Option<Result<AnalyzeStyleResponse, ClientError>>>,
    pub calls: Mutex<Vec<String>>,
    pub generate_requests: Mutex<Vec<GeneratePostRequest>>,
    pub save_requests: Mutex<Vec<SaveDraftRequest>>,
    /// When set, the matching call waits for a permit before answering.
    pub list_gate: Option<Arc<Semaphore>>,
    pub delete_gate: Option<Arc<Semaphore>>,
    pub generate_gate: Option<Arc<Semaphore>>,
    pub save_gate: Option<Arc<Semaphore>>,
}

impl FakeStudioApi {
    pub fn with_styles(styles: Vec<StyleProfile>) -> Self {
        Self {
            styles: Mutex::new(styles),
            ..Self::default()
        }
    }

    pub fn with_drafts(drafts: Vec<Draft>) -> Self {
        Self {
            drafts: Mutex::new(drafts),
            ..Self::default()
        }
    }

    pub async fn push_generate(&self, result: Result<GeneratePostResponse, ClientError>) {
        self.generate_results.lock().await.push_back(result);
    }

    pub async fn push_save(&self, result: Result<SaveDraftResponse, ClientError>) {
        self.save_results.lock().await.push_back(result);
    }

    pub async fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.as_str() == name)
            .count()
    }

    async fn record(&self, name: &str) {
        self.calls.lock().await.push(name.to_string());
    }

    async fn list_failure(&self) -> Option<ClientError> {
        self.list_error.lock().await.clone()
    }
}

async fn pass_gate(gate: &Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        gate.acquire().await.expect("gate open").forget();
    }
}

#[async_trait]
impl StudioApi for FakeStudioApi {
    async fn list_styles(&self) -> Result<Vec<StyleProfile>, ClientError> {
        self.record("list_styles").await;
        pass_gate(&self.list_gate).await;
        if let Some(err) = self.list_failure().await {
            return Err(err);
        }
        Ok(self.styles.lock().await.clone())
    }

    async fn delete_style(&self, style_id: &StyleId) -> Result<(), ClientError> {
        self.record("delete_style").await;
        pass_gate(&self.delete_gate).await;
        if let Some(err) = self.delete_error.lock().await.clone() {
            return Err(err);
        }
        self.styles.lock().await.retain(|style| &style.id != style_id);
        Ok(())
    }

    async fn analyze_style(
        &self,
        request: AnalyzeStyleRequest,
    ) -> Result<AnalyzeStyleResponse, ClientError> {
        self.record("analyze_style").await;
        if let Some(result) = self.analyze_result.lock().await.clone() {
            return result;
        }
        Ok(AnalyzeStyleResponse {
            analysis: StyleAnalysis::default(),
            message: None,
            style_id: Some(StyleId::new(format!("s{}", request.posts_text.len()))),
            style_name: None,
        })
    }

    async fn list_drafts(&self) -> Result<Vec<Draft>, ClientError> {
        self.record("list_drafts").await;
        pass_gate(&self.list_gate).await;
        if let Some(err) = self.list_failure().await {
            return Err(err);
        }
        Ok(self.drafts.lock().await.clone())
    }

    async fn save_draft(
        &self,
        request: SaveDraftRequest,
    ) -> Result<SaveDraftResponse, ClientError> {
        self.record("save_draft").await;
        let ordinal = {
            let mut requests = self.save_requests.lock().await;
            requests.push(request);
            requests.len()
        };
        pass_gate(&self.save_gate).await;
        if let Some(result) = self.save_results.lock().await.pop_front() {
            return result;
        }
        Ok(SaveDraftResponse {
            draft_id: DraftId::new(format!("d{ordinal}")),
            message: None,
        })
    }

    async fn delete_draft(&self, draft_id: &DraftId) -> Result<(), ClientError> {
        self.record("delete_draft").await;
        pass_gate(&self.delete_gate).await;
        if let Some(err) = self.delete_error.lock().await.clone() {
            return Err(err);
        }
        self.drafts.lock().await.retain(|draft| &draft.id != draft_id);
        Ok(())
    }

    async fn generate_posts(
        &self,
        request: GeneratePostRequest,
    ) -> Result<GeneratePostResponse, ClientError> {
        self.record("generate_posts").await;
        self.generate_requests.lock().await.push(request);
        pass_gate(&self.generate_gate).await;
        self.generate_results
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(GeneratePostResponse::default()))
    }
}

pub(crate) struct ScriptedConfirmation {
    answer: bool,
    pub prompts: StdMutex<Vec<String>>,
}

impl ScriptedConfirmation {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: StdMutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Confirmation for ScriptedConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());
        self.answer
    }
}

#[derive(Default)]
pub(crate) struct RecordingClipboard {
    pub fail: bool,
    pub writes: StdMutex<Vec<String>>,
}

impl Clipboard for RecordingClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(anyhow!("clipboard denied"));
        }
        self.writes
            .lock()
            .expect("writes lock")
            .push(text.to_string());
        Ok(())
    }
}

/// Blocks inside `write_text` until the test has passed both barriers: the
/// first signals the write has started, the second lets it finish.
pub(crate) struct GatedClipboard {
    pub entered: Arc<Barrier>,
    pub release: Arc<Barrier>,
    pub writes: StdMutex<Vec<String>>,
}

impl GatedClipboard {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Barrier::new(2)),
            release: Arc::new(Barrier::new(2)),
            writes: StdMutex::new(Vec::new()),
        }
    }
}

impl Clipboard for GatedClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        self.entered.wait();
        self.release.wait();
        self.writes
            .lock()
            .expect("writes lock")
            .push(text.to_string());
        Ok(())
    }
}

pub(crate) fn style(id: &str, name: &str) -> StyleProfile {
    StyleProfile {
        id: StyleId::from(id),
        name: name.to_string(),
        analysis: StyleAnalysis::default(),
    }
}

pub(crate) fn draft(id: &str, text: &str) -> Draft {
    Draft {
        id: DraftId::from(id),
        text: text.to_string(),
        topic: Some("Launch".to_string()),
        created_at: "2024-01-01T00:00:00Z".parse().expect("timestamp"),
    }
}

pub(crate) fn posts(items: &[&str]) -> GeneratePostResponse {
    GeneratePostResponse {
        generated_posts: Some(items.iter().map(|item| item.to_string()).collect()),
    }
}

pub(crate) fn event_bus() -> broadcast::Sender<StudioEvent> {
    broadcast::channel(64).0
}

pub(crate) fn server_error(status: u16, message: &str) -> ClientError {
    ClientError::Server {
        status,
        message: message.to_string(),
    }
}
