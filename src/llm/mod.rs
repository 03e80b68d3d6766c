

pub mod providers;
pub mod rewrite;

pub use providers::{LlmMetadata, LlmProvider, LlmProviderError, OllamaProvider};

pub use rewrite::{QueryRewriter, RewriteResult};
