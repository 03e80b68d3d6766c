

pub mod engine;
pub mod models;
pub mod prompt;

pub use engine::{extract_json_object, parse_rewrite_response, QueryRewriter};
pub use models::{RewriteResponse, RewriteResult};
