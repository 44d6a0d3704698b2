//! Answer generation: prompt rendering and generation service clients

mod anthropic;
mod ollama;
mod prompt;
mod retry;

pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
pub use retry::{AttemptError, RetryPolicy};
