use serde::{Deserialize, Serialize};


/// Shape the model is asked to answer with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewriteResponse {
    #[serde(default)]
    pub rewritten_query: String,
    #[serde(default)]
    pub changes_made: Vec<String>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub confidence: f64,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewriteResult {
    /// Rewritten query on success, the fallback text otherwise.
    pub rewritten_text: String,
    pub changes: Vec<String>,
    pub assumptions: Vec<String>,
    pub confidence: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RewriteResult {
    
    pub fn failed(fallback_text: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            rewritten_text: fallback_text.into(),
            changes: Vec::new(),
            assumptions: Vec::new(),
            confidence: 0.0,
            success: false,
            error: Some(error.into()),
        }
    }

    
    pub fn from_response(response: RewriteResponse) -> Self {
        Self {
            rewritten_text: response.rewritten_query.trim().to_string(),
            changes: response.changes_made,
            assumptions: response.assumptions,
            confidence: response.confidence,
            success: true,
            error: None,
        }
    }
}
