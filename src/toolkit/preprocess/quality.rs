

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::time_expr::{has_vague_time, TimeRange};
use crate::toolkit::extraction::vocab::{contains_any, ACTION_WORDS, OBJECT_WORDS, QUERY_PREDICATES};
use crate::utils::char_len;

pub const LENGTH_WEIGHT: f64 = 0.2;
pub const REFERENCE_WEIGHT: f64 = 0.3;
pub const TIME_WEIGHT: f64 = 0.2;
pub const STRUCTURE_WEIGHT: f64 = 0.3;

/// Ceiling for utterances shorter than three characters.
pub const TOO_SHORT_CAP: f64 = 0.3;


#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QualityAssessment {
    pub total_score: f64,
    pub length_score: f64,
    pub reference_score: f64,
    pub time_score: f64,
    pub structure_score: f64,
    pub deductions: Vec<String>,
    pub suggestions: Vec<String>,
}


/// Everything the assessor looks at, borrowed from the earlier stages.
#[derive(Debug, Clone, Copy)]
pub struct QualityInput<'a> {
    pub text: &'a str,
    pub unresolved_references: &'a [String],
    pub has_context: bool,
    pub time_ranges: &'a [TimeRange],
}


#[derive(Debug, Clone, Copy, Default)]
pub struct QualityAssessor;

impl QualityAssessor {
    pub fn new() -> Self {
        Self
    }

    
    pub fn assess(&self, input: QualityInput<'_>) -> QualityAssessment {
        let mut assessment = QualityAssessment::default();

        let length = char_len(input.text);
        assessment.length_score = length_score(length);
        if assessment.length_score < 1.0 {
            assessment.deductions.push(format!("query is short ({length} chars)"));
            assessment.suggestions.push("describe what to do and on which object".to_string());
        }

        let unresolved = input.unresolved_references.len();
        assessment.reference_score = reference_score(unresolved, input.has_context);
        if assessment.reference_score < 1.0 {
            assessment.deductions.push(format!(
                "{unresolved} unresolved reference(s): {}",
                input.unresolved_references.join(", ")
            ));
            assessment.suggestions.push("name the batch, supplier, customer, product or equipment explicitly".to_string());
        }

        assessment.time_score = if has_vague_time(input.text) && input.time_ranges.is_empty() {
            0.7
        } else {
            1.0
        };
        if assessment.time_score < 1.0 {
            assessment.deductions.push("time expression is vague".to_string());
            assessment.suggestions.push("give a concrete period such as 上周 or 最近7天".to_string());
        }

        let has_verb = contains_any(input.text, ACTION_WORDS) || contains_any(input.text, QUERY_PREDICATES);
        let has_object = contains_any(input.text, OBJECT_WORDS);
        assessment.structure_score = structure_score(has_verb, has_object);
        if assessment.structure_score < 1.0 {
            let missing = match (has_verb, has_object) {
                (false, false) => "action and object",
                (false, true) => "action",
                _ => "object",
            };
            assessment.deductions.push(format!("incomplete structure: missing {missing}"));
            assessment.suggestions.push(format!("add the {missing} of the request"));
        }

        let weighted = assessment.length_score * LENGTH_WEIGHT
            + assessment.reference_score * REFERENCE_WEIGHT
            + assessment.time_score * TIME_WEIGHT
            + assessment.structure_score * STRUCTURE_WEIGHT;
        let mut total = weighted.clamp(0.0, 1.0);
        if length < 3 {
            total = total.min(TOO_SHORT_CAP);
        }
        assessment.total_score = total;

        debug!(
            "Quality: total={:.3} length={} reference={} time={} structure={}",
            total,
            assessment.length_score,
            assessment.reference_score,
            assessment.time_score,
            assessment.structure_score
        );

        assessment
    }
}

fn length_score(length: usize) -> f64 {
    match length {
        0..=2 => 0.2,
        3..=4 => 0.5,
        5..=7 => 0.8,
        _ => 1.0,
    }
}

fn reference_score(unresolved: usize, has_context: bool) -> f64 {
    if unresolved == 0 {
        return 1.0;
    }
    let n = unresolved as f64;
    if has_context {
        (1.0 - 0.15 * n).max(0.5)
    } else {
        (1.0 - 0.3 * n).max(0.3)
    }
}

fn structure_score(has_verb: bool, has_object: bool) -> f64 {
    match (has_verb, has_object) {
        (true, true) => 1.0,
        (false, false) => 0.4,
        (false, true) => 0.6,
        (true, false) => 0.7,
    }
}
