//! Conversational flow controller.
//!
//! Owns the session, the single-flight request guard and the step timer.
//! Network calls run on spawned tasks and report back through
//! [`FlowEvent`]s; the owner feeds those into [`FlowController::handle_event`]
//! from the same task that issues user actions, so all state changes happen
//! in one place.

use crate::api::Backend;
use crate::config::UiConfig;
use crate::error::{ApiError, Failure, FailureKind, FlowError};
use crate::i18n::{self, Locale, Message};
use crate::links::ResolvedRecommendation;
use crate::protocol::{CategoryDescriptor, DetectReply, QuestionView, StepReply, StepRequest};
use crate::render::{LoadingKind, Renderer};
use crate::session::{Session, SessionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSettings {
    pub step_timeout: Duration,
    pub pacing: Duration,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self::from(&UiConfig::default())
    }
}

impl From<&UiConfig> for FlowSettings {
    fn from(ui: &UiConfig) -> Self {
        Self {
            step_timeout: ui.step_timeout(),
            pacing: ui.pacing(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Detecting,
    Questioning { step: u32 },
    Recommending,
    Error(Failure),
}

/// Completion of work started by the controller, tagged with the request
/// generation it belongs to.
#[derive(Debug)]
pub enum FlowEvent {
    Detected {
        generation: u64,
        result: Result<DetectReply, ApiError>,
    },
    Stepped {
        generation: u64,
        result: Result<StepReply, ApiError>,
    },
    TimedOut {
        generation: u64,
    },
}

pub type FlowEvents = mpsc::UnboundedReceiver<FlowEvent>;

/// At most one controller request is outstanding. Every acquisition gets a
/// fresh generation; completions carrying any other generation are stale.
#[derive(Debug, Default)]
struct RequestGuard {
    generation: u64,
    in_flight: bool,
    timer: Option<CancellationToken>,
}

impl RequestGuard {
    fn acquire(&mut self) -> Option<u64> {
        if self.in_flight {
            return None;
        }
        self.generation += 1;
        self.in_flight = true;
        Some(self.generation)
    }

    fn arm(&mut self, timer: CancellationToken) {
        if let Some(previous) = self.timer.replace(timer) {
            previous.cancel();
        }
    }

    fn release(&mut self) {
        self.in_flight = false;
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    /// Drops the outstanding request, if any, so its completion is ignored.
    fn invalidate(&mut self) {
        self.release();
        self.generation += 1;
    }

    fn accepts(&self, generation: u64) -> bool {
        self.in_flight && self.generation == generation
    }

    fn is_held(&self) -> bool {
        self.in_flight
    }
}

pub struct FlowController<R: Renderer> {
    backend: Arc<dyn Backend>,
    renderer: R,
    session: SessionState,
    state: FlowState,
    guard: RequestGuard,
    question: Option<QuestionView>,
    categories: Vec<CategoryDescriptor>,
    locale: Locale,
    settings: FlowSettings,
    events: mpsc::UnboundedSender<FlowEvent>,
}

impl<R: Renderer> FlowController<R> {
    pub fn new(
        backend: Arc<dyn Backend>,
        renderer: R,
        settings: FlowSettings,
        locale: Locale,
    ) -> (Self, FlowEvents) {
        let (events, receiver) = mpsc::unbounded_channel();
        let controller = Self {
            backend,
            renderer,
            session: SessionState::new(),
            state: FlowState::Idle,
            guard: RequestGuard::default(),
            question: None,
            categories: Vec::new(),
            locale,
            settings,
            events,
        };
        (controller, receiver)
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn session(&self) -> &Session {
        self.session.current()
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_held()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        info!("locale set to {}", locale);
        self.locale = locale;
    }

    pub fn categories(&self) -> &[CategoryDescriptor] {
        &self.categories
    }

    pub fn current_question(&self) -> Option<&QuestionView> {
        self.question.as_ref()
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Fetches the category listing for the landing screen. Does not touch
    /// the session or the request guard.
    pub async fn load_categories(&mut self) -> Result<(), ApiError> {
        match self.backend.categories(self.locale).await {
            Ok(categories) => {
                info!("loaded {} categories", categories.len());
                self.categories = categories;
                if self.state == FlowState::Idle {
                    self.renderer.landing(&self.categories, self.locale);
                }
                Ok(())
            }
            Err(e) => {
                warn!("failed to load categories: {}", e);
                let message = i18n::text(Message::CategoriesFailed, self.locale);
                self.renderer
                    .error(&Failure::new(FailureKind::Transport, message));
                Err(e)
            }
        }
    }

    /// Starts a new session from free text by asking the backend to classify it.
    pub fn submit_query(&mut self, text: &str) -> Result<(), FlowError> {
        let query = text.trim();
        if query.is_empty() {
            self.renderer
                .notice(i18n::text(Message::EmptyQuery, self.locale));
            return Err(FlowError::EmptyQuery);
        }

        let generation = self.acquire()?;
        self.session.reset();
        self.question = None;
        self.state = FlowState::Detecting;
        self.renderer.loading(LoadingKind::Detecting, self.locale);
        self.arm_timeout(generation);
        info!(generation, "detecting category for {:?}", query);

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let query = query.to_string();
        let locale = self.locale;
        tokio::spawn(async move {
            let result = backend.detect_category(&query, locale).await;
            let _ = events.send(FlowEvent::Detected { generation, result });
        });
        Ok(())
    }

    /// Starts a session for a category picked from the landing screen.
    pub fn start_category(&mut self, category: &str) -> Result<(), FlowError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(FlowError::EmptyQuery);
        }
        if self.guard.is_held() {
            return Err(self.reject_busy());
        }

        let name = self
            .categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(category))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| category.to_string());
        self.session.start(name);
        self.question = None;
        self.ask_step()
    }

    /// Requests the question (or recommendations) for the current step.
    pub fn ask_step(&mut self) -> Result<(), FlowError> {
        self.dispatch_step(Duration::ZERO)
    }

    /// Accepts one of the offered options and moves to the next step.
    pub fn answer_step(&mut self, option: &str) -> Result<(), FlowError> {
        if self.guard.is_held() {
            return Err(self.reject_busy());
        }

        let answer = match &self.question {
            Some(question) if matches!(self.state, FlowState::Questioning { .. }) => {
                question.option_for(option).map(str::to_string)
            }
            _ => return Err(FlowError::NotAwaitingAnswer),
        };
        let Some(answer) = answer else {
            self.renderer
                .notice(i18n::text(Message::UnknownOption, self.locale));
            return Err(FlowError::UnknownOption);
        };

        self.session.record_answer(answer)?;
        self.question = None;
        self.dispatch_step(self.settings.pacing)
    }

    /// Returns to the landing screen from any state. Any outstanding
    /// request is orphaned and its timer cancelled.
    pub fn reset_to_landing(&mut self) {
        debug!(generation = self.guard.generation, "reset to landing");
        self.guard.invalidate();
        self.session.reset();
        self.question = None;
        self.state = FlowState::Idle;
        self.renderer.reset();
        self.renderer.landing(&self.categories, self.locale);
    }

    /// Applies a completion. Returns `false` when the event was stale and
    /// ignored.
    pub fn handle_event(&mut self, event: FlowEvent) -> bool {
        let generation = match &event {
            FlowEvent::Detected { generation, .. }
            | FlowEvent::Stepped { generation, .. }
            | FlowEvent::TimedOut { generation } => *generation,
        };
        if !self.guard.accepts(generation) {
            debug!(generation, current = self.guard.generation, "discarding stale event");
            return false;
        }
        self.guard.release();

        match event {
            FlowEvent::Detected { result, .. } => self.on_detected(result),
            FlowEvent::Stepped { result, .. } => self.on_step_reply(result),
            FlowEvent::TimedOut { .. } => {
                warn!(generation, "request exceeded {:?}", self.settings.step_timeout);
                let message = i18n::text(Message::Timeout, self.locale);
                self.fail(FailureKind::Timeout, message);
            }
        }
        true
    }

    fn on_detected(&mut self, result: Result<DetectReply, ApiError>) {
        match result {
            Ok(DetectReply {
                category: Some(category),
                ..
            }) => {
                info!("detected category {}", category);
                self.session.start(category);
                if let Err(e) = self.ask_step() {
                    warn!("could not request first step: {}", e);
                }
            }
            Ok(reply) => {
                let message = reply
                    .error
                    .unwrap_or_else(|| i18n::text(Message::CategoryNotFound, self.locale).to_string());
                self.fail(FailureKind::Semantic, message);
            }
            Err(e) => self.fail_transport(&e),
        }
    }

    fn on_step_reply(&mut self, result: Result<StepReply, ApiError>) {
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => return self.fail_transport(&e),
        };

        match reply {
            StepReply::Question(question) => {
                let step = self.session.current().step;
                self.state = FlowState::Questioning { step };
                self.renderer.question(&question, step);
                self.question = Some(question);
            }
            StepReply::Recommendations(items) => {
                let category = self.session.current().category.clone().unwrap_or_default();
                let resolved: Vec<ResolvedRecommendation> = items
                    .into_iter()
                    .map(|item| ResolvedRecommendation::resolve(item, &category))
                    .collect();
                info!("received {} recommendations for {}", resolved.len(), category);
                self.state = FlowState::Recommending;
                self.renderer.recommendations(&resolved, self.locale);
            }
            StepReply::CategoryList(categories) => {
                if !categories.is_empty() {
                    self.categories = categories;
                }
                self.session.reset();
                self.question = None;
                self.state = FlowState::Idle;
                self.renderer.landing(&self.categories, self.locale);
            }
            StepReply::Error(message) => self.fail(FailureKind::Semantic, message),
            StepReply::Unrecognized => {
                let message = i18n::text(Message::UnexpectedResponse, self.locale);
                self.fail(FailureKind::Unexpected, message);
            }
        }
    }

    fn dispatch_step(&mut self, delay: Duration) -> Result<(), FlowError> {
        let session = self.session.current();
        let Some(category) = session.category.clone() else {
            return Err(FlowError::NoSession);
        };
        let request = StepRequest {
            step: session.step,
            category,
            answers: session.answers.clone(),
            language: self.locale,
        };

        let generation = self.acquire()?;
        self.state = FlowState::Questioning { step: request.step };
        let kind = self.loading_kind(&request.category, request.step);
        self.renderer.loading(kind, self.locale);
        self.arm_timeout(generation);
        debug!(generation, step = request.step, "asking {}", request.category);

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let result = backend.ask(&request).await;
            let _ = events.send(FlowEvent::Stepped { generation, result });
        });
        Ok(())
    }

    /// Past the last known spec the backend is expected to answer with
    /// recommendations, which takes much longer.
    fn loading_kind(&self, category: &str, step: u32) -> LoadingKind {
        let specs = self
            .categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.specs.len())
            .unwrap_or(0);
        if specs > 0 && step as usize > specs {
            LoadingKind::Analysing
        } else {
            LoadingKind::Question
        }
    }

    fn acquire(&mut self) -> Result<u64, FlowError> {
        match self.guard.acquire() {
            Some(generation) => Ok(generation),
            None => Err(self.reject_busy()),
        }
    }

    fn reject_busy(&mut self) -> FlowError {
        debug!("rejecting action while request {} is in flight", self.guard.generation);
        self.renderer
            .notice(i18n::text(Message::RequestInFlight, self.locale));
        FlowError::RequestInFlight
    }

    fn arm_timeout(&mut self, generation: u64) {
        let timer = CancellationToken::new();
        let cancelled = timer.clone();
        let events = self.events.clone();
        let budget = self.settings.step_timeout;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(budget) => {
                    let _ = events.send(FlowEvent::TimedOut { generation });
                }
            }
        });
        self.guard.arm(timer);
    }

    fn fail_transport(&mut self, error: &ApiError) {
        warn!("backend request failed: {}", error);
        let message = format!("{}{}", i18n::text(Message::ServerUnreachable, self.locale), error);
        self.fail(FailureKind::Transport, message);
    }

    fn fail(&mut self, kind: FailureKind, message: impl Into<String>) {
        let failure = Failure::new(kind, message);
        self.question = None;
        self.renderer.error(&failure);
        self.state = FlowState::Error(failure);
    }
}

impl<R: Renderer> Drop for FlowController<R> {
    fn drop(&mut self) {
        self.guard.invalidate();
    }
}
