use crate::error::FlowError;

/// Step index of the first request in a session. Step 0 is the budget
/// question the backend asks before category-specific ones.
pub const INITIAL_STEP: u32 = 0;

/// The in-progress dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub category: Option<String>,
    pub step: u32,
    pub answers: Vec<String>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.category.is_some()
    }
}

#[derive(Debug, Default)]
pub struct SessionState {
    session: Session,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, category: impl Into<String>) {
        self.session = Session {
            category: Some(category.into()),
            step: INITIAL_STEP,
            answers: Vec::new(),
        };
    }

    /// Appends the answer and advances exactly one step.
    pub fn record_answer(&mut self, answer: impl Into<String>) -> Result<(), FlowError> {
        if !self.session.is_active() {
            return Err(FlowError::NoSession);
        }
        self.session.answers.push(answer.into());
        self.session.step += 1;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.session = Session::default();
    }

    pub fn current(&self) -> &Session {
        &self.session
    }
}
