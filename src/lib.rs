

pub mod core;
pub mod llm;
pub mod toolkit;
pub mod utils;

pub use utils::{safe_truncate, safe_truncate_ellipsis};


pub use core::config::PreprocessConfig;
pub use core::context::{ConversationContext, ConversationMemory, EntitySlot, EntityType};
pub use core::error::{PreprocessError, Result};
pub use toolkit::extraction::EnhancedQuery;
pub use toolkit::preprocess::{PreprocessedQuery, QueryPreprocessor};


pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";


pub const DEFAULT_LLM_MODEL: &str = "qwen2.5:7b";

/// Scores strictly below this trigger the LLM rewrite.
pub const DEFAULT_REWRITE_THRESHOLD: f64 = 0.6;


pub const DEFAULT_REWRITE_TEMPERATURE: f64 = 0.1;
