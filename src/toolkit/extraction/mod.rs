

pub mod action;
pub mod core_extractor;
pub mod enhanced;
pub mod modal;
pub mod negation;
pub mod ranking;
pub mod vocab;

pub use action::{disambiguate_action, ActionDisambiguation, MatchKind};
pub use core_extractor::{extract_core, CoreExtraction};
pub use enhanced::{enhance, EnhancedQuery};
pub use modal::filter_modal_particles;
pub use negation::{detect_negations, Negation};
pub use ranking::{detect_ranking, RankingClass, RankingDimension, RankingQuery};
