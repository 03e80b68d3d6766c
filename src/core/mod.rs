

pub mod config;
pub mod context;
pub mod error;

pub use config::PreprocessConfig;
pub use context::{ConversationContext, ConversationMemory, EntitySlot, EntityType};
pub use error::{PreprocessError, Result};
