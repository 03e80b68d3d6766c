

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::NaiveDateTime;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use super::models::{RewriteResponse, RewriteResult};
use super::prompt::build_rewrite_prompt;
use crate::core::config::PreprocessConfig;
use crate::core::context::ConversationContext;
use crate::llm::providers::base::{LlmProvider, LlmProviderError};


pub struct QueryRewriter {
    llm: Arc<dyn LlmProvider>,
    enabled: bool,
    threshold: f64,
    temperature: f64,
}

impl QueryRewriter {
    
    pub fn new(llm: Arc<dyn LlmProvider>, config: &PreprocessConfig) -> Self {
        info!(
            "QueryRewriter initialized: provider={}, model={}, threshold={}",
            llm.provider_name(),
            llm.model_name(),
            config.llm_rewrite_threshold
        );

        Self {
            llm,
            enabled: config.llm_rewrite_enabled,
            threshold: config.llm_rewrite_threshold,
            temperature: config.rewrite_temperature,
        }
    }

    
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The rewrite fires only when enabled and the score is strictly below the threshold.
    pub fn should_rewrite(&self, quality_score: f64) -> bool {
        self.enabled && quality_score < self.threshold
    }

    /// Never fails: every problem yields a failed result carrying `fallback_text`.
    pub async fn rewrite(
        &self,
        raw_input: &str,
        fallback_text: &str,
        context: Option<&ConversationContext>,
        now: NaiveDateTime,
    ) -> RewriteResult {
        let available = match AssertUnwindSafe(self.llm.is_available()).catch_unwind().await {
            Ok(available) => available,
            Err(_) => {
                error!("LLM provider {} panicked during availability check", self.llm.provider_name());
                return RewriteResult::failed(fallback_text, "provider panicked");
            }
        };
        if !available {
            warn!("LLM provider {} unavailable, skipping rewrite", self.llm.provider_name());
            return RewriteResult::failed(fallback_text, "LLM provider unavailable");
        }

        let system_prompt = build_rewrite_prompt(now, context);
        debug!("Calling LLM for rewrite of '{}'", crate::safe_truncate(raw_input, 50));

        let call = self.llm.generate(&system_prompt, raw_input, Some(self.temperature));
        let response = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok((response, _metadata))) => response,
            Ok(Err(e)) => {
                warn!("LLM rewrite call failed: {}", e);
                return RewriteResult::failed(fallback_text, e.to_string());
            }
            Err(_) => {
                error!("LLM provider {} panicked during rewrite", self.llm.provider_name());
                return RewriteResult::failed(fallback_text, "provider panicked");
            }
        };

        match parse_rewrite_response(&response) {
            Ok(parsed) => {
                let result = RewriteResult::from_response(parsed);
                info!(
                    "Query rewritten: confidence={}, changes={}",
                    result.confidence,
                    result.changes.len()
                );
                result
            }
            Err(e) => {
                warn!("Failed to parse rewrite response: {}", e);
                warn!("Response was: {}", crate::safe_truncate(&response, 200));
                RewriteResult::failed(fallback_text, e.to_string())
            }
        }
    }
}


pub fn parse_rewrite_response(response: &str) -> Result<RewriteResponse, LlmProviderError> {
    let json = extract_json_object(response)
        .ok_or_else(|| LlmProviderError::Provider("no JSON object in response".to_string()))?;
    let parsed: RewriteResponse = serde_json::from_str(json)?;
    if parsed.rewritten_query.trim().is_empty() {
        return Err(LlmProviderError::Provider("empty rewritten_query".to_string()));
    }
    Ok(parsed)
}

/// First balanced `{...}` in free text. Braces inside string literals do not count.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
