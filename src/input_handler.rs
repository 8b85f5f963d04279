use reedline::{
    DefaultPrompt, DefaultPromptSegment, ExternalPrinter, FileBackedHistory, Reedline, Signal,
};
use std::path::PathBuf;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl+C at the prompt.
    Interrupted,
    /// Ctrl+D or a terminal error; no more input will follow.
    Closed,
}

const HISTORY_CAPACITY: usize = 500;

/// Runs the blocking line editor on its own thread and forwards what the
/// user types. Output printed through `printer` is drawn above the prompt.
pub struct InputHandler {
    prompt: String,
    history_path: Option<PathBuf>,
    printer: ExternalPrinter<String>,
}

impl InputHandler {
    pub fn new(prompt: &str, printer: ExternalPrinter<String>) -> Self {
        Self {
            prompt: prompt.to_string(),
            history_path: None,
            printer,
        }
    }

    pub fn with_history(mut self, path: PathBuf) -> Self {
        self.history_path = Some(path);
        self
    }

    pub fn spawn(self) -> mpsc::UnboundedReceiver<InputEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        thread::spawn(move || {
            let mut editor = Reedline::create().with_external_printer(self.printer);
            if let Some(path) = &self.history_path {
                match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
                    Ok(history) => editor = editor.with_history(Box::new(history)),
                    Err(e) => warn!("history disabled: {}", e),
                }
            }
            let prompt = DefaultPrompt::new(
                DefaultPromptSegment::Basic(self.prompt),
                DefaultPromptSegment::Empty,
            );

            loop {
                let event = match editor.read_line(&prompt) {
                    Ok(Signal::Success(line)) => InputEvent::Line(line),
                    Ok(Signal::CtrlC) => InputEvent::Interrupted,
                    Ok(_) => InputEvent::Closed,
                    Err(e) => {
                        warn!("line editor failed: {}", e);
                        InputEvent::Closed
                    }
                };
                let closed = event == InputEvent::Closed;
                if tx.send(event).is_err() || closed {
                    debug!("input thread exiting");
                    break;
                }
            }
        });

        rx
    }
}
