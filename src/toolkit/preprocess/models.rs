use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use super::quality::QualityAssessment;
use super::reference::ResolvedReference;
use super::time_expr::TimeRange;
use crate::llm::rewrite::RewriteResult;


#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, IntoStaticStr, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepStatus {
    /// The stage changed the text or produced findings.
    Applied,
    Unchanged,
    Skipped,
    Failed,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingStep {
    pub name: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub duration_micros: u64,
}

impl ProcessingStep {
    pub fn new(name: &str, status: StepStatus, detail: Option<String>, duration_micros: u64) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail,
            duration_micros,
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessedQuery {
    pub request_id: String,
    pub original_input: String,
    pub normalized_text: String,
    pub rewritten_text: Option<String>,
    /// What the intent matcher should consume. Never empty for non-blank input.
    pub final_query: String,
    pub extracted_time_ranges: Vec<TimeRange>,
    pub primary_time_range: Option<TimeRange>,
    pub found_colloquials: Vec<String>,
    pub standardized_expressions: Vec<String>,
    pub resolved_references: BTreeMap<String, ResolvedReference>,
    pub unresolved_references: Vec<String>,
    pub quality: Option<QualityAssessment>,
    pub quality_score: f64,
    /// True only when the score was below threshold and the rewrite succeeded.
    pub llm_rewrite_triggered: bool,
    pub rewrite: Option<RewriteResult>,
    pub processing_steps: Vec<ProcessingStep>,
    pub processing_time_ms: u64,
    /// Set when the pipeline was bypassed or failed and the input passed through.
    pub degraded: bool,
}

impl PreprocessedQuery {
    /// Input forwarded untouched, trusted as-is.
    pub fn passthrough(request_id: impl Into<String>, input: &str, steps: Vec<ProcessingStep>, processing_time_ms: u64) -> Self {
        Self {
            request_id: request_id.into(),
            original_input: input.to_string(),
            normalized_text: input.to_string(),
            rewritten_text: None,
            final_query: input.to_string(),
            extracted_time_ranges: Vec::new(),
            primary_time_range: None,
            found_colloquials: Vec::new(),
            standardized_expressions: Vec::new(),
            resolved_references: BTreeMap::new(),
            unresolved_references: Vec::new(),
            quality: None,
            quality_score: 1.0,
            llm_rewrite_triggered: false,
            rewrite: None,
            processing_steps: steps,
            processing_time_ms,
            degraded: true,
        }
    }
}
