

pub mod extraction;
pub mod preprocess;

pub use extraction::{enhance, EnhancedQuery};
pub use preprocess::{PreprocessedQuery, QueryPreprocessor};
