// Library exports for SwipeStyle CLI components

pub mod api;
pub mod app;
pub mod cli_commands;
pub mod config;
pub mod error;
pub mod flow;
pub mod i18n;
pub mod input_handler;
pub mod links;
pub mod logger;
pub mod output;
pub mod protocol;
pub mod render;
pub mod session;
pub mod suggest;

pub use api::{ApiClient, Backend};
pub use app::App;
pub use config::Config;
pub use error::{ApiError, Failure, FailureKind, FlowError};
pub use flow::{FlowController, FlowEvent, FlowEvents, FlowSettings, FlowState};
pub use i18n::Locale;
pub use links::{resolve_link, LinkStatus, ResolvedLink, ResolvedRecommendation};
pub use output::OutputHandler;
pub use protocol::{QuestionView, RecommendationItem, StepReply, StepRequest};
pub use render::{LoadingKind, Renderer};
pub use session::{Session, SessionState, INITIAL_STEP};
pub use suggest::{SuggestionIndex, SuggestionRecord};
