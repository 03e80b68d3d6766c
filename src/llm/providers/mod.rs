

pub mod base;
pub mod ollama;

pub use base::{LlmMetadata, LlmProvider, LlmProviderError};
pub use ollama::OllamaProvider;
