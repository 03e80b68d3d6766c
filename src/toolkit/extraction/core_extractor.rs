

use serde::{Deserialize, Serialize};

use super::modal::filter_modal_particles;
use super::vocab::{find_first, ACTION_WORDS, OBJECT_WORDS, RELATIVE_TIME_PATTERN};

/// Leading politeness phrases, longest first.
const POLITE_PREFIXES: &[&str] = &[
    "可不可以帮我", "麻烦你帮我", "能不能帮我", "麻烦帮我", "可以帮我", "请帮我", "我想要",
    "帮我", "请你", "麻烦", "我想", "我要", "请",
];

/// Trailing softeners, longest first.
const SOFTENER_SUFFIXES: &[&str] = &[
    "可以吗", "好不好", "行不行", "谢谢你", "一下下", "好吗", "行吗", "谢谢", "一下",
];


#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoreExtraction {
    /// Minimal verb+object core, or the reduced text when either is missing.
    pub core: String,
    pub action: Option<String>,
    pub object: Option<String>,
    /// `prefix:<phrase>`, `suffix:<phrase>` and `time:<phrase>` labels.
    pub modifiers: Vec<String>,
}

impl CoreExtraction {
    
    pub fn has_core(&self) -> bool {
        self.action.is_some() && self.object.is_some()
    }
}


pub fn extract_core(text: &str) -> CoreExtraction {
    let mut modifiers = Vec::new();
    let mut reduced = text.trim();

    if let Some(prefix) = POLITE_PREFIXES.iter().find(|p| reduced.starts_with(**p)) {
        reduced = reduced[prefix.len()..].trim_start();
        modifiers.push(format!("prefix:{prefix}"));
    }

    let filtered = filter_modal_particles(reduced);
    let mut reduced = filtered.as_str();
    if let Some(suffix) = SOFTENER_SUFFIXES.iter().find(|s| reduced.ends_with(**s)) {
        reduced = reduced[..reduced.len() - suffix.len()].trim_end();
        modifiers.push(format!("suffix:{suffix}"));
    }
    let reduced = filter_modal_particles(reduced);

    for time in RELATIVE_TIME_PATTERN.find_iter(text) {
        modifiers.push(format!("time:{}", time.as_str()));
    }

    let action = find_first(&reduced, ACTION_WORDS);
    let object = find_first(&reduced, OBJECT_WORDS);

    let core = match (action, object) {
        (Some(a), Some(o)) => format!("{a}{o}"),
        _ => reduced.clone(),
    };

    CoreExtraction {
        core,
        action: action.map(str::to_string),
        object: object.map(str::to_string),
        modifiers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_verb_object_core() {
        let result = extract_core("帮我查询上周的订单吧");
        assert_eq!(result.core, "查询订单");
        assert_eq!(result.action.as_deref(), Some("查询"));
        assert_eq!(result.object.as_deref(), Some("订单"));
        assert!(result.modifiers.contains(&"prefix:帮我".to_string()));
        assert!(result.modifiers.contains(&"time:上周".to_string()));
    }

    #[test]
    fn test_strips_softener_before_particle_check() {
        let result = extract_core("请帮我新建一个工单好吗");
        assert_eq!(result.core, "新建工单");
        assert_eq!(
            result.modifiers,
            vec!["prefix:请帮我".to_string(), "suffix:好吗".to_string()]
        );
    }

    #[test]
    fn test_falls_back_to_reduced_text() {
        let result = extract_core("麻烦帮我看一下");
        assert!(!result.has_core());
        assert_eq!(result.core, "看");
        assert_eq!(result.action.as_deref(), Some("看"));
        assert!(result.object.is_none());
    }

    #[test]
    fn test_membership_is_not_position_aware() {
        let result = extract_core("订单给我删除");
        assert_eq!(result.core, "删除订单");
    }

    #[test]
    fn test_no_vocabulary_hit() {
        let result = extract_core("你好呀");
        assert_eq!(result.core, "你好");
        assert!(result.modifiers.is_empty());
    }
}
