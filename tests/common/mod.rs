#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swipestyle_cli::api::Backend;
use swipestyle_cli::protocol::{
    parse_categories, CategoryDescriptor, DetectReply, QuestionView, ShoppingProduct,
    ShoppingRequest, StepReply, StepRequest,
};
use swipestyle_cli::{
    ApiError, Failure, FlowController, FlowEvents, FlowSettings, Locale, LoadingKind, Renderer,
    ResolvedRecommendation, SuggestionRecord,
};
use tokio::sync::oneshot;

/// What the fake backend does for one call.
pub enum Reply {
    Json(Value),
    Status(u16),
    /// Held until the test sends the body.
    Gated(oneshot::Receiver<Value>),
}

#[derive(Default)]
pub struct FakeBackend {
    detect: Mutex<VecDeque<Reply>>,
    steps: Mutex<VecDeque<Reply>>,
    categories: Mutex<Option<Value>>,
    asked: Mutex<Vec<StepRequest>>,
    detect_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_detect(&self, reply: Reply) {
        self.detect.lock().unwrap().push_back(reply);
    }

    pub fn on_step(&self, reply: Reply) {
        self.steps.lock().unwrap().push_back(reply);
    }

    pub fn gate_step(&self) -> oneshot::Sender<Value> {
        let (tx, rx) = oneshot::channel();
        self.on_step(Reply::Gated(rx));
        tx
    }

    pub fn with_categories(&self, listing: Value) {
        *self.categories.lock().unwrap() = Some(listing);
    }

    pub fn ask_count(&self) -> usize {
        self.asked.lock().unwrap().len()
    }

    pub fn detect_count(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<StepRequest> {
        self.asked.lock().unwrap().clone()
    }
}

async fn play(reply: Option<Reply>) -> Result<Value, ApiError> {
    match reply {
        Some(Reply::Json(value)) => Ok(value),
        Some(Reply::Status(status)) => Err(ApiError::Status {
            status,
            body: String::new(),
        }),
        Some(Reply::Gated(rx)) => rx.await.map_err(|_| ApiError::Status {
            status: 499,
            body: "gate dropped".to_string(),
        }),
        None => Err(ApiError::Status {
            status: 500,
            body: "unscripted call".to_string(),
        }),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn detect_category(&self, _query: &str, _locale: Locale) -> Result<DetectReply, ApiError> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.detect.lock().unwrap().pop_front();
        let value = play(reply).await?;
        Ok(DetectReply::from_value(&value))
    }

    async fn categories(&self, _locale: Locale) -> Result<Vec<CategoryDescriptor>, ApiError> {
        let listing = self.categories.lock().unwrap().clone();
        match listing {
            Some(value) => Ok(parse_categories(&value)),
            None => Err(ApiError::Status {
                status: 503,
                body: String::new(),
            }),
        }
    }

    async fn ask(&self, request: &StepRequest) -> Result<StepReply, ApiError> {
        self.asked.lock().unwrap().push(request.clone());
        let reply = self.steps.lock().unwrap().pop_front();
        let value = play(reply).await?;
        Ok(StepReply::from_value(&value))
    }

    async fn shopping(&self, _request: &ShoppingRequest) -> Result<Vec<ShoppingProduct>, ApiError> {
        Ok(Vec::new())
    }

    async fn autocomplete(
        &self,
        _query: &str,
        _locale: Locale,
        _limit: usize,
    ) -> Result<Vec<SuggestionRecord>, ApiError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Landing(Vec<String>),
    Loading(LoadingKind),
    Question { text: String, options: Vec<String>, step: u32 },
    Recommendations(Vec<ResolvedRecommendation>),
    Error(Failure),
    Notice(String),
    Reset,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: Vec<Frame>,
}

impl RecordingRenderer {
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn loading_kinds(&self) -> Vec<LoadingKind> {
        self.frames
            .iter()
            .filter_map(|f| match f {
                Frame::Loading(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn landing(&mut self, categories: &[CategoryDescriptor], _locale: Locale) {
        self.frames
            .push(Frame::Landing(categories.iter().map(|c| c.name.clone()).collect()));
    }

    fn loading(&mut self, kind: LoadingKind, _locale: Locale) {
        self.frames.push(Frame::Loading(kind));
    }

    fn question(&mut self, question: &QuestionView, step: u32) {
        self.frames.push(Frame::Question {
            text: question.question.clone(),
            options: question.options.clone(),
            step,
        });
    }

    fn recommendations(&mut self, items: &[ResolvedRecommendation], _locale: Locale) {
        self.frames.push(Frame::Recommendations(items.to_vec()));
    }

    fn error(&mut self, failure: &Failure) {
        self.frames.push(Frame::Error(failure.clone()));
    }

    fn notice(&mut self, message: &str) {
        self.frames.push(Frame::Notice(message.to_string()));
    }

    fn reset(&mut self) {
        self.frames.push(Frame::Reset);
    }
}

pub fn settings() -> FlowSettings {
    FlowSettings {
        step_timeout: Duration::from_secs(45),
        pacing: Duration::from_millis(50),
    }
}

pub fn controller(
    backend: &Arc<FakeBackend>,
    settings: FlowSettings,
) -> (FlowController<RecordingRenderer>, FlowEvents) {
    let backend: Arc<dyn Backend> = backend.clone();
    FlowController::new(backend, RecordingRenderer::default(), settings, Locale::Tr)
}

/// Waits for the next completion and applies it. Returns whether it was
/// accepted.
pub async fn pump(controller: &mut FlowController<RecordingRenderer>, events: &mut FlowEvents) -> bool {
    let event = events.recv().await.expect("controller keeps the sender alive");
    controller.handle_event(event)
}

pub fn question(text: &str, options: &[&str]) -> Value {
    serde_json::json!({ "question": text, "options": options })
}
