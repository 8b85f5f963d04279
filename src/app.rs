use crate::api::{ApiClient, Backend};
use crate::cli_commands::{parse_command, Command};
use crate::config::Config;
use crate::flow::{FlowController, FlowEvent, FlowEvents, FlowSettings, FlowState};
use crate::i18n::{self, Locale, Message};
use crate::input_handler::InputEvent;
use crate::output::OutputHandler;
use crate::render::Renderer;
use crate::suggest::{merge_remote, SuggestionIndex, MAX_SUGGESTIONS};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct App {
    config: Config,
    controller: FlowController<OutputHandler>,
    suggestions: SuggestionIndex,
    interrupted: bool,
}

impl App {
    pub fn new(config: Config, output: OutputHandler) -> Result<(Self, FlowEvents)> {
        let backend: Arc<dyn Backend> = Arc::new(ApiClient::new(&config.api)?);
        Ok(Self::with_backend(config, output, backend))
    }

    pub fn with_backend(
        config: Config,
        output: OutputHandler,
        backend: Arc<dyn Backend>,
    ) -> (Self, FlowEvents) {
        let locale = config.ui.language;
        let (controller, events) =
            FlowController::new(backend, output, FlowSettings::from(&config.ui), locale);
        let app = Self {
            config,
            controller,
            suggestions: SuggestionIndex::builtin(locale),
            interrupted: false,
        };
        (app, events)
    }

    pub fn controller(&self) -> &FlowController<OutputHandler> {
        &self.controller
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    /// Drives the session until the user quits or input closes.
    pub async fn run(
        &mut self,
        mut events: FlowEvents,
        mut input: mpsc::UnboundedReceiver<InputEvent>,
    ) -> Result<()> {
        self.controller.renderer().print_banner();
        self.reload_categories().await;

        loop {
            tokio::select! {
                Some(event) = events.recv() => {
                    self.handle_event(event);
                }
                line = input.recv() => match line {
                    Some(InputEvent::Line(line)) => {
                        self.interrupted = false;
                        if !self.handle_line(&line).await {
                            break;
                        }
                    }
                    Some(InputEvent::Interrupted) => {
                        if !self.handle_interrupt() {
                            break;
                        }
                    }
                    Some(InputEvent::Closed) | None => break,
                },
            }
        }

        info!("session ended");
        Ok(())
    }

    /// Applies a controller completion. Returns `false` when it was stale.
    pub fn handle_event(&mut self, event: FlowEvent) -> bool {
        let applied = self.controller.handle_event(event);
        if !applied {
            debug!("ignored stale completion");
            self.controller.renderer().print_debug("ignored stale completion");
        }
        applied
    }

    /// Returns `false` when the app should exit.
    pub async fn handle_line(&mut self, line: &str) -> bool {
        match parse_command(line) {
            Command::Empty => {}
            Command::Quit => return false,
            Command::Help => self.controller.renderer().print_help(),
            Command::Reset => self.controller.reset_to_landing(),
            Command::Categories => self.reload_categories().await,
            Command::Language(locale) => self.switch_language(locale).await,
            Command::Suggest(prefix) => self.show_suggestions(&prefix).await,
            Command::Category(name) => {
                if let Err(e) = self.controller.start_category(&name) {
                    debug!("category start rejected: {}", e);
                }
            }
            Command::Pick(n) => self.pick(n),
            Command::Text(text) => self.submit_text(&text),
            Command::Unknown(command) => self
                .controller
                .renderer()
                .print_system(&format!("Unknown command: {} (try /help)", command)),
        }
        true
    }

    /// Ctrl+C cancels a running session; twice in a row at the landing
    /// screen exits.
    fn handle_interrupt(&mut self) -> bool {
        if self.controller.is_busy() || self.controller.state() != &FlowState::Idle {
            self.controller.reset_to_landing();
            return true;
        }
        if self.interrupted {
            return false;
        }
        self.interrupted = true;
        self.controller
            .renderer()
            .print_system("Press Ctrl+C again or type /quit to exit.");
        true
    }

    fn pick(&mut self, n: usize) {
        if let Some(question) = self.controller.current_question() {
            match question.options.get(n - 1).cloned() {
                Some(option) => self.submit_text(&option),
                None => {
                    let locale = self.controller.locale();
                    self.controller
                        .renderer_mut()
                        .notice(i18n::text(Message::UnknownOption, locale));
                }
            }
            return;
        }

        // The landing stays pickable under an error message.
        if matches!(self.controller.state(), FlowState::Idle | FlowState::Error(_)) {
            if let Some(name) = self.controller.categories().get(n - 1).map(|c| c.name.clone()) {
                if let Err(e) = self.controller.start_category(&name) {
                    debug!("category start rejected: {}", e);
                }
                return;
            }
        }

        self.submit_text(&n.to_string());
    }

    fn submit_text(&mut self, text: &str) {
        let awaiting_answer = self.controller.current_question().is_some()
            && matches!(self.controller.state(), FlowState::Questioning { .. });
        let result = if awaiting_answer {
            self.controller.answer_step(text)
        } else {
            self.controller.submit_query(text)
        };
        if let Err(e) = result {
            debug!("input rejected: {}", e);
            self.controller
                .renderer()
                .print_debug(&format!("input rejected: {}", e));
        }
    }

    async fn reload_categories(&mut self) {
        if let Err(e) = self.controller.load_categories().await {
            warn!("category listing unavailable: {}", e);
            let locale = self.controller.locale();
            self.controller.renderer_mut().landing(&[], locale);
        }
    }

    async fn switch_language(&mut self, locale: Locale) {
        self.controller.set_locale(locale);
        self.suggestions = SuggestionIndex::builtin(locale);
        self.config.ui.language = locale;
        if let Err(e) = self.config.save() {
            warn!("could not persist language: {}", e);
        }
        if self.controller.state() == &FlowState::Idle && !self.controller.is_busy() {
            self.reload_categories().await;
        }
    }

    async fn show_suggestions(&mut self, prefix: &str) {
        if prefix.trim().is_empty() {
            return;
        }
        let locale = self.controller.locale();
        let mut results = self.suggestions.suggest(prefix);

        if self.config.ui.remote_suggestions {
            match self
                .controller
                .backend()
                .autocomplete(prefix.trim(), locale, MAX_SUGGESTIONS)
                .await
            {
                Ok(remote) => results = merge_remote(results, remote),
                Err(e) => warn!("remote suggestions unavailable: {}", e),
            }
        }

        self.controller.renderer().print_suggestions(&results, locale);
    }
}
