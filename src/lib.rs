pub mod agent;
pub mod ai;
pub mod config;
pub mod session;

pub use agent::{AskOptions, LLMAgent};
pub use ai::{AnyProvider, ChatMessage, ChatRequest, ChatResponse, LlmError, LlmProvider, Role};
pub use config::{ConfigDocument, ConfigOverrides, ProviderConfig, ProviderId};
pub use session::ConversationSession;
