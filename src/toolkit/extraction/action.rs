

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use tracing::debug;

use super::vocab::{
    find_first, synonym_group, ABSOLUTE_TIME_PATTERN, ACTION_WORDS, OBJECT_WORDS, OPERATION_CODES,
    RELATIVE_TIME_PATTERN,
};

pub const EXACT_CONFIDENCE: f64 = 0.85;
pub const FUZZY_CONFIDENCE: f64 = 0.65;
pub const UNMAPPED_CONFIDENCE: f64 = 0.4;
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

lazy_static! {
    static ref QUERY_PHRASING: Regex = Regex::new(
        r"多少|哪些|哪个|哪家|哪台|哪条|什么|是否|有没有|几[个台家条批]|怎么样|如何|情况"
    ).expect("query phrasing pattern");
}


#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, IntoStaticStr, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    Unmapped,
    NotDetected,
    /// Time-qualified or question-shaped utterances are left to query matching.
    Declined,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionDisambiguation {
    pub operation_code: Option<String>,
    pub action: Option<String>,
    pub object: Option<String>,
    pub confidence: f64,
    pub match_kind: MatchKind,
}

impl ActionDisambiguation {
    fn declined() -> Self {
        Self {
            operation_code: None,
            action: None,
            object: None,
            confidence: FALLBACK_CONFIDENCE,
            match_kind: MatchKind::Declined,
        }
    }
}


/// True when the utterance reads as a query: time-qualified or phrased as a question.
pub fn has_query_context(text: &str) -> bool {
    ABSOLUTE_TIME_PATTERN.is_match(text) || RELATIVE_TIME_PATTERN.is_match(text) || QUERY_PHRASING.is_match(text)
}


pub fn disambiguate_action(text: &str) -> ActionDisambiguation {
    if has_query_context(text) {
        debug!("Action disambiguation declined: query context in '{}'", crate::safe_truncate(text, 30));
        return ActionDisambiguation::declined();
    }

    let action = find_first(text, ACTION_WORDS);
    let object = find_first(text, OBJECT_WORDS);

    let (operation_code, match_kind, confidence) = match (action, object) {
        (None, None) => (None, MatchKind::NotDetected, FALLBACK_CONFIDENCE),
        (Some(a), Some(o)) => {
            if let Some(code) = OPERATION_CODES.get(&(a, o)) {
                (Some(*code), MatchKind::Exact, EXACT_CONFIDENCE)
            } else if let Some(code) = fuzzy_lookup(a, o) {
                (Some(code), MatchKind::Fuzzy, FUZZY_CONFIDENCE)
            } else {
                (None, MatchKind::Unmapped, UNMAPPED_CONFIDENCE)
            }
        }
        _ => (None, MatchKind::Unmapped, UNMAPPED_CONFIDENCE),
    };

    ActionDisambiguation {
        operation_code: operation_code.map(str::to_string),
        action: action.map(str::to_string),
        object: object.map(str::to_string),
        confidence,
        match_kind,
    }
}

/// Tries every synonym of `action` against the same object.
fn fuzzy_lookup(action: &'static str, object: &'static str) -> Option<&'static str> {
    synonym_group(action)?
        .iter()
        .filter(|verb| **verb != action)
        .find_map(|verb| OPERATION_CODES.get(&(*verb, object)).copied())
}
