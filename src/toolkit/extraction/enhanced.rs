

use serde::{Deserialize, Serialize};

use super::action::{disambiguate_action, ActionDisambiguation, MatchKind, FALLBACK_CONFIDENCE};
use super::core_extractor::{extract_core, CoreExtraction};
use super::modal::filter_modal_particles;
use super::negation::{detect_negations, Negation};
use super::ranking::{detect_ranking, RankingQuery};
use crate::toolkit::preprocess::colloquial::ColloquialTable;
use crate::toolkit::preprocess::normalize::normalize_whitespace;
use crate::utils::char_len;


/// Feature-tagged result of the context-free path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnhancedQuery {
    pub original_input: String,
    /// After the modal-particle filter.
    pub filtered_text: String,
    /// After colloquial substitution.
    pub normalized_text: String,
    pub found_colloquials: Vec<String>,
    pub core: CoreExtraction,
    pub ranking: Option<RankingQuery>,
    pub action: ActionDisambiguation,
    pub negations: Vec<Negation>,
    /// Core when it has at least two characters, otherwise `normalized_text`.
    pub processed: String,
    pub features: Vec<String>,
}

impl EnhancedQuery {
    /// Input forwarded untouched with no features.
    pub fn passthrough(input: &str) -> Self {
        Self {
            original_input: input.to_string(),
            filtered_text: input.to_string(),
            normalized_text: input.to_string(),
            found_colloquials: Vec::new(),
            core: CoreExtraction::default(),
            ranking: None,
            action: ActionDisambiguation {
                operation_code: None,
                action: None,
                object: None,
                confidence: FALLBACK_CONFIDENCE,
                match_kind: MatchKind::NotDetected,
            },
            negations: Vec::new(),
            processed: input.to_string(),
            features: Vec::new(),
        }
    }
}


pub fn enhance(input: &str, colloquials: &ColloquialTable) -> EnhancedQuery {
    let filtered = filter_modal_particles(&normalize_whitespace(input));
    let substitution = colloquials.substitute(&filtered);
    let normalized = substitution.text;

    let core = extract_core(&normalized);
    let ranking = detect_ranking(&normalized);
    let action = disambiguate_action(&normalized);
    let negations = detect_negations(&normalized);

    let processed = if char_len(&core.core) >= 2 {
        core.core.clone()
    } else {
        normalized.clone()
    };

    let mut features = Vec::new();
    if core.has_core() {
        features.push("core".to_string());
    }
    if let Some(ranking) = &ranking {
        features.push(format!("ranking:{}", <&str>::from(ranking.class)));
        if let Some(dimension) = ranking.dimension {
            features.push(format!("dimension:{}", <&str>::from(dimension)));
        }
        if let Some(limit) = ranking.limit {
            features.push(format!("limit:{limit}"));
        }
    }
    match (&action.operation_code, action.match_kind) {
        (Some(code), _) => features.push(format!("operation:{code}")),
        (None, MatchKind::Declined) => features.push("query_context".to_string()),
        _ => {}
    }
    if !negations.is_empty() {
        features.push("negation".to_string());
    }

    EnhancedQuery {
        original_input: input.to_string(),
        filtered_text: filtered,
        normalized_text: normalized,
        found_colloquials: substitution.found_colloquials,
        core,
        ranking,
        action,
        negations,
        processed,
        features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::extraction::ranking::{RankingClass, RankingDimension};

    #[test]
    fn test_ranking_query_declines_action() {
        let result = enhance("这个月产量最多的产线是哪个", &ColloquialTable::default_zh());
        let ranking = result.ranking.as_ref().unwrap();
        assert_eq!(ranking.class, RankingClass::Max);
        assert_eq!(ranking.keyword, "最多");
        assert_eq!(ranking.dimension, Some(RankingDimension::Output));
        assert_eq!(result.action.match_kind, MatchKind::Declined);
        assert!(result.features.contains(&"ranking:MAX".to_string()));
        assert!(result.features.contains(&"query_context".to_string()));
    }

    #[test]
    fn test_command_with_colloquial_verb() {
        let result = enhance("帮我弄个订单吧", &ColloquialTable::default_zh());
        assert_eq!(result.filtered_text, "帮我弄个订单");
        assert_eq!(result.normalized_text, "创建订单");
        assert_eq!(result.processed, "创建订单");
        assert_eq!(result.action.operation_code.as_deref(), Some("ORDER_CREATE"));
        assert!(result.features.contains(&"operation:ORDER_CREATE".to_string()));
        assert!(result.found_colloquials.contains(&"帮我".to_string()));
    }

    #[test]
    fn test_negation_feature() {
        let result = enhance("导出报表，不包括停用设备", &ColloquialTable::default_zh());
        assert_eq!(result.negations.len(), 1);
        assert_eq!(result.negations[0].excluded, "停用设备");
        assert!(result.features.contains(&"negation".to_string()));
    }

    #[test]
    fn test_short_core_falls_back_to_normalized() {
        let result = enhance("请看呢", &ColloquialTable::empty());
        assert_eq!(result.core.core, "看");
        assert_eq!(result.normalized_text, "请看");
        assert_eq!(result.processed, "请看");
    }

    #[test]
    fn test_empty_input() {
        let result = enhance("   ", &ColloquialTable::default_zh());
        assert_eq!(result.processed, "");
        assert!(result.ranking.is_none());
        assert!(result.negations.is_empty());
    }
}
