

pub mod colloquial;
pub mod models;
pub mod normalize;
pub mod processor;
pub mod quality;
pub mod reference;
pub mod time_expr;

pub use colloquial::{ColloquialEntry, ColloquialSubstitution, ColloquialTable, MatchPosition};
pub use models::{PreprocessedQuery, ProcessingStep, StepStatus};
pub use normalize::normalize_whitespace;
pub use processor::QueryPreprocessor;
pub use quality::{QualityAssessment, QualityAssessor, QualityInput};
pub use reference::{ReferenceResolution, ReferenceResolver, ResolvedReference};
pub use time_expr::{has_vague_time, TimeAnchor, TimeNormalization, TimeRange, TimeRule, TimeRuleTable};
