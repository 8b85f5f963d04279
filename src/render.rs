use crate::error::Failure;
use crate::i18n::Locale;
use crate::links::ResolvedRecommendation;
use crate::protocol::{CategoryDescriptor, QuestionView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingKind {
    /// Waiting on category detection.
    Detecting,
    /// Short wait for the next question.
    Question,
    /// Long wait while recommendations are generated.
    Analysing,
}

/// Everything the flow controller shows goes through this trait.
pub trait Renderer {
    fn landing(&mut self, categories: &[CategoryDescriptor], locale: Locale);

    fn loading(&mut self, kind: LoadingKind, locale: Locale);

    fn question(&mut self, question: &QuestionView, step: u32);

    fn recommendations(&mut self, items: &[ResolvedRecommendation], locale: Locale);

    fn error(&mut self, failure: &Failure);

    /// Transient validation feedback that does not change the flow state.
    fn notice(&mut self, message: &str);

    /// Clears whatever the current session put on screen.
    fn reset(&mut self);
}
