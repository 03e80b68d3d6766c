

use serde::{Deserialize, Serialize};

use super::error::{PreprocessError, Result};
use crate::{DEFAULT_LLM_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_REWRITE_TEMPERATURE, DEFAULT_REWRITE_THRESHOLD};


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Turns the whole pipeline on or off. When off, input passes through untouched.
    pub enabled: bool,

    /// Gates the conditional LLM rewrite stage.
    pub llm_rewrite_enabled: bool,
    /// Quality scores strictly below this value trigger a rewrite.
    pub llm_rewrite_threshold: f64,
    pub rewrite_temperature: f64,

    pub llm_base_url: String,
    pub llm_model: String,
}

impl PreprocessConfig {
    
    pub fn new(enabled: bool, llm_rewrite_enabled: bool, llm_rewrite_threshold: f64) -> Self {
        Self {
            enabled,
            llm_rewrite_enabled,
            llm_rewrite_threshold,
            rewrite_temperature: DEFAULT_REWRITE_TEMPERATURE,
            llm_base_url: DEFAULT_OLLAMA_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
        }
    }

    
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(enabled) = env_bool("PREQUERY_ENABLED") {
            config.enabled = enabled;
        }
        if let Some(enabled) = env_bool("PREQUERY_LLM_REWRITE_ENABLED") {
            config.llm_rewrite_enabled = enabled;
        }
        if let Some(threshold) = std::env::var("PREQUERY_LLM_REWRITE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.llm_rewrite_threshold = threshold;
        }
        if let Some(temperature) = std::env::var("PREQUERY_REWRITE_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.rewrite_temperature = temperature;
        }
        if let Ok(url) = std::env::var("PREQUERY_LLM_URL") {
            config.llm_base_url = url;
        }
        if let Ok(model) = std::env::var("PREQUERY_LLM_MODEL") {
            config.llm_model = model;
        }

        config
    }

    
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.llm_rewrite_threshold) {
            return Err(PreprocessError::Config(format!(
                "llm_rewrite_threshold must be within [0, 1], got {}",
                self.llm_rewrite_threshold
            )));
        }
        if !(0.0..=2.0).contains(&self.rewrite_temperature) {
            return Err(PreprocessError::Config(format!(
                "rewrite_temperature must be within [0, 2], got {}",
                self.rewrite_temperature
            )));
        }
        if self.llm_model.trim().is_empty() {
            return Err(PreprocessError::Config("llm_model must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self::new(true, true, DEFAULT_REWRITE_THRESHOLD)
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
