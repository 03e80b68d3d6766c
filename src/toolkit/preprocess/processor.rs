

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};
use futures::FutureExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::colloquial::ColloquialTable;
use super::models::{PreprocessedQuery, ProcessingStep, StepStatus};
use super::normalize::normalize_whitespace;
use super::quality::{QualityAssessor, QualityInput};
use super::reference::ReferenceResolver;
use super::time_expr::TimeRuleTable;
use crate::core::config::PreprocessConfig;
use crate::core::context::{ConversationContext, ConversationMemory};
use crate::core::error::Result;
use crate::llm::providers::base::LlmProvider;
use crate::llm::rewrite::QueryRewriter;
use crate::toolkit::extraction::enhanced::{enhance, EnhancedQuery};
use crate::safe_truncate;


/// Entry point of the crate. Shares only read-only tables and collaborators
/// between calls, so one instance can serve concurrent requests.
pub struct QueryPreprocessor {
    config: PreprocessConfig,
    colloquials: Arc<ColloquialTable>,
    time_rules: Arc<TimeRuleTable>,
    resolver: ReferenceResolver,
    assessor: QualityAssessor,
    rewriter: Option<QueryRewriter>,
}

impl QueryPreprocessor {
    
    pub fn new(config: PreprocessConfig, colloquials: Arc<ColloquialTable>, time_rules: Arc<TimeRuleTable>) -> Self {
        info!(
            "QueryPreprocessor initialized: enabled={}, colloquials={}, time_rules={}",
            config.enabled,
            colloquials.len(),
            time_rules.len()
        );
        Self {
            config,
            colloquials,
            time_rules,
            resolver: ReferenceResolver::default(),
            assessor: QualityAssessor::new(),
            rewriter: None,
        }
    }

    /// Built-in Chinese colloquialism and time tables.
    pub fn with_default_tables(config: PreprocessConfig) -> Self {
        Self::new(
            config,
            Arc::new(ColloquialTable::default_zh()),
            Arc::new(TimeRuleTable::default_zh()),
        )
    }

    
    pub fn with_memory(mut self, memory: Arc<dyn ConversationMemory>) -> Self {
        self.resolver = ReferenceResolver::new(Some(memory));
        self
    }

    
    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.rewriter = Some(QueryRewriter::new(llm, &self.config));
        self
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    
    pub async fn preprocess(&self, input: &str, context: Option<&ConversationContext>) -> PreprocessedQuery {
        self.preprocess_at(input, context, Local::now().naive_local()).await
    }

    /// Same as [`preprocess`](Self::preprocess) with an explicit clock.
    pub async fn preprocess_at(
        &self,
        input: &str,
        context: Option<&ConversationContext>,
        now: NaiveDateTime,
    ) -> PreprocessedQuery {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();

        if !self.config.enabled {
            debug!("Preprocessing disabled, passing input through");
            let step = ProcessingStep::new("pipeline", StepStatus::Skipped, Some("preprocessing disabled".to_string()), 0);
            return PreprocessedQuery::passthrough(request_id, input, vec![step], 0);
        }

        if input.trim().is_empty() {
            return self.blank(request_id, input, context);
        }

        let outcome = AssertUnwindSafe(self.run_stages(&request_id, input, context, now, started))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(query)) => {
                info!(
                    "Preprocessed [{}]: score={:.3}, rewrite={}, {}ms",
                    request_id, query.quality_score, query.llm_rewrite_triggered, query.processing_time_ms
                );
                query
            }
            Ok(Err(e)) => {
                warn!("Preprocessing failed for '{}': {}", safe_truncate(input, 50), e);
                Self::degraded(request_id, input, e.to_string(), started)
            }
            Err(_) => {
                error!("Preprocessing panicked for '{}'", safe_truncate(input, 50));
                Self::degraded(request_id, input, "stage panicked".to_string(), started)
            }
        }
    }

    /// Context-free path: modal filter, colloquialisms, core, ranking, action, negation.
    pub fn enhanced_preprocess(&self, input: &str) -> EnhancedQuery {
        if !self.config.enabled {
            return EnhancedQuery::passthrough(input);
        }
        let table = &*self.colloquials;
        std::panic::catch_unwind(AssertUnwindSafe(|| enhance(input, table))).unwrap_or_else(|_| {
            error!("Enhanced preprocessing panicked for '{}'", safe_truncate(input, 50));
            EnhancedQuery::passthrough(input)
        })
    }

    async fn run_stages(
        &self,
        request_id: &str,
        input: &str,
        context: Option<&ConversationContext>,
        now: NaiveDateTime,
        started: Instant,
    ) -> Result<PreprocessedQuery> {
        let mut steps = Vec::with_capacity(6);

        let t = Instant::now();
        let normalized = normalize_whitespace(input);
        steps.push(step("normalize", changed(input, &normalized), None, t));

        let t = Instant::now();
        let substitution = self.colloquials.substitute(&normalized);
        let detail = (!substitution.found_colloquials.is_empty())
            .then(|| substitution.found_colloquials.join(","));
        steps.push(step("colloquial", changed(&normalized, &substitution.text), detail, t));

        let t = Instant::now();
        let time = self.time_rules.normalize(&substitution.text, now);
        let detail = (!time.ranges.is_empty()).then(|| format!("{} range(s)", time.ranges.len()));
        steps.push(step("time", changed(&substitution.text, &time.text), detail, t));

        let t = Instant::now();
        let resolution = self.resolver.resolve(&time.text, context)?;
        let status = if !self.resolver.has_memory() || context.is_none() {
            StepStatus::Skipped
        } else if resolution.resolved.is_empty() {
            StepStatus::Unchanged
        } else {
            StepStatus::Applied
        };
        let detail = format!(
            "{} resolved, {} unresolved",
            resolution.resolved.len(),
            resolution.unresolved.len()
        );
        steps.push(step("reference", status, Some(detail), t));

        let t = Instant::now();
        let quality = self.assessor.assess(QualityInput {
            text: &resolution.text,
            unresolved_references: &resolution.unresolved,
            has_context: context.is_some(),
            time_ranges: &time.ranges,
        });
        let score = quality.total_score;
        steps.push(step("quality", StepStatus::Applied, Some(format!("{score:.3}")), t));

        let mut final_query = if resolution.text.trim().is_empty() {
            normalized.clone()
        } else {
            resolution.text.clone()
        };

        let t = Instant::now();
        let mut rewrite = None;
        match &self.rewriter {
            Some(rewriter) if rewriter.should_rewrite(score) => {
                let result = rewriter.rewrite(input, &final_query, context, now).await;
                if result.success {
                    final_query = result.rewritten_text.clone();
                    steps.push(step("llm_rewrite", StepStatus::Applied, None, t));
                } else {
                    steps.push(step("llm_rewrite", StepStatus::Failed, result.error.clone(), t));
                }
                rewrite = Some(result);
            }
            Some(_) => {
                steps.push(step("llm_rewrite", StepStatus::Skipped, Some(skip_reason(&self.config, score)), t));
            }
            None => {
                let reason = if self.config.llm_rewrite_enabled && score < self.config.llm_rewrite_threshold {
                    "no LLM provider configured".to_string()
                } else {
                    skip_reason(&self.config, score)
                };
                steps.push(step("llm_rewrite", StepStatus::Skipped, Some(reason), t));
            }
        }

        let llm_rewrite_triggered = rewrite.as_ref().is_some_and(|r| r.success);

        Ok(PreprocessedQuery {
            request_id: request_id.to_string(),
            original_input: input.to_string(),
            normalized_text: time.text,
            rewritten_text: rewrite.as_ref().filter(|r| r.success).map(|r| r.rewritten_text.clone()),
            final_query,
            extracted_time_ranges: time.ranges,
            primary_time_range: time.primary,
            found_colloquials: substitution.found_colloquials,
            standardized_expressions: substitution.standardized_expressions,
            resolved_references: resolution.resolved,
            unresolved_references: resolution.unresolved,
            quality_score: score,
            quality: Some(quality),
            llm_rewrite_triggered,
            rewrite,
            processing_steps: steps,
            processing_time_ms: elapsed_ms(started),
            degraded: false,
        })
    }

    /// Nothing to execute: empty query, scored as too short to act on.
    fn blank(&self, request_id: String, input: &str, context: Option<&ConversationContext>) -> PreprocessedQuery {
        let normalized = normalize_whitespace(input);
        let quality = self.assessor.assess(QualityInput {
            text: &normalized,
            unresolved_references: &[],
            has_context: context.is_some(),
            time_ranges: &[],
        });
        let step = ProcessingStep::new("pipeline", StepStatus::Skipped, Some("blank input".to_string()), 0);
        let mut query = PreprocessedQuery::passthrough(request_id, input, vec![step], 0);
        query.normalized_text = normalized.clone();
        query.final_query = normalized;
        query.quality_score = quality.total_score;
        query.quality = Some(quality);
        query.degraded = false;
        query
    }

    fn degraded(request_id: String, input: &str, reason: String, started: Instant) -> PreprocessedQuery {
        let step = ProcessingStep::new("pipeline", StepStatus::Failed, Some(reason), 0);
        PreprocessedQuery::passthrough(request_id, input, vec![step], elapsed_ms(started))
    }
}

fn step(name: &str, status: StepStatus, detail: Option<String>, started: Instant) -> ProcessingStep {
    let micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    ProcessingStep::new(name, status, detail, micros)
}

fn changed(before: &str, after: &str) -> StepStatus {
    if before == after {
        StepStatus::Unchanged
    } else {
        StepStatus::Applied
    }
}

fn skip_reason(config: &PreprocessConfig, score: f64) -> String {
    if config.llm_rewrite_enabled {
        format!("score {score:.3} >= threshold {}", config.llm_rewrite_threshold)
    } else {
        "rewrite disabled".to_string()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{EntitySlot, EntityType};
    use crate::core::error::PreprocessError;
    use crate::llm::providers::base::{LlmMetadata, LlmProviderError};
    use crate::toolkit::extraction::{MatchKind, RankingClass};
    use crate::toolkit::preprocess::quality::TOO_SHORT_CAP;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct SlotMemory {
        slots: Vec<EntitySlot>,
    }

    impl ConversationMemory for SlotMemory {
        fn resolve_reference(&self, _session_id: &str, text: &str) -> Result<String> {
            let mut out = text.to_string();
            for slot in &self.slots {
                for expr in slot.entity_type.referring_expressions() {
                    out = out.replace(expr, &slot.entity_name);
                }
            }
            Ok(out)
        }
    }

    struct BrokenMemory {
        panic: bool,
    }

    impl ConversationMemory for BrokenMemory {
        fn resolve_reference(&self, _session_id: &str, _text: &str) -> Result<String> {
            if self.panic {
                panic!("memory store corrupted");
            }
            Err(PreprocessError::Memory("connection refused".to_string()))
        }
    }

    struct FakeLlm {
        available: bool,
        reply: String,
    }

    #[async_trait]
    impl LlmProvider for FakeLlm {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _temperature: Option<f64>,
        ) -> std::result::Result<(String, LlmMetadata), LlmProviderError> {
            Ok((self.reply.clone(), LlmMetadata::default()))
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        fn provider_name(&self) -> &str {
            "fake"
        }

        fn model_name(&self) -> &str {
            "fake-1"
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap().and_hms_opt(14, 30, 0).unwrap()
    }

    fn preprocessor() -> QueryPreprocessor {
        QueryPreprocessor::with_default_tables(PreprocessConfig::default())
    }

    fn with_llm(available: bool, reply: &str) -> QueryPreprocessor {
        preprocessor().with_llm(Arc::new(FakeLlm {
            available,
            reply: reply.to_string(),
        }))
    }

    fn batch_context() -> ConversationContext {
        ConversationContext::for_session("s-1").with_slot(EntitySlot::new(EntityType::Batch, "batch-42", "B-2024-01"))
    }

    #[tokio::test]
    async fn test_polite_request_with_relative_week() {
        let query = preprocessor().preprocess_at("帮我查一下上周的订单吧", None, now()).await;

        assert!(!query.normalized_text.ends_with('吧'));
        assert_eq!(query.normalized_text, "查询2026-10-05至2026-10-11的订单");
        assert!(query.found_colloquials.contains(&"帮我".to_string()));
        let primary = query.primary_time_range.as_ref().unwrap();
        assert_eq!(primary.phrase, "上周");
        assert_eq!(query.extracted_time_ranges.len(), 1);
        assert_eq!(query.final_query, query.normalized_text);
        assert!(!query.degraded);

        let names: Vec<&str> = query.processing_steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["normalize", "colloquial", "time", "reference", "quality", "llm_rewrite"]);
    }

    #[tokio::test]
    async fn test_two_char_noise_scores_low() {
        let query = preprocessor().preprocess_at("嗯嗯", None, now()).await;
        assert!(query.quality_score <= 0.3);
        assert!(query.quality.as_ref().unwrap().deductions.len() >= 2);
        assert!(!query.llm_rewrite_triggered);
        assert_eq!(query.processing_steps.last().unwrap().detail.as_deref(), Some("no LLM provider configured"));
    }

    #[tokio::test]
    async fn test_batch_reference_resolved_from_context() {
        let ctx = batch_context();
        let preprocessor = preprocessor().with_memory(Arc::new(SlotMemory {
            slots: ctx.entity_slots.clone(),
        }));
        let query = preprocessor.preprocess_at("那批还有多少", Some(&ctx), now()).await;

        assert_eq!(query.resolved_references["那批"].entity_id, "batch-42");
        assert!(query.unresolved_references.is_empty());
        assert_eq!(query.final_query, "B-2024-01还有多少");
    }

    #[test]
    fn test_ranking_query_on_enhanced_path() {
        let enhanced = preprocessor().enhanced_preprocess("这个月产量最多的产线是哪个");
        let ranking = enhanced.ranking.unwrap();
        assert_eq!(ranking.class, RankingClass::Max);
        assert_eq!(ranking.keyword, "最多");
        assert_eq!(enhanced.action.match_kind, MatchKind::Declined);
    }

    #[tokio::test]
    async fn test_unavailable_llm_keeps_rule_text() {
        let query = with_llm(false, r#"{"rewritten_query": "不该使用"}"#)
            .preprocess_at("嗯嗯", None, now())
            .await;

        let rewrite = query.rewrite.as_ref().unwrap();
        assert!(!rewrite.success);
        assert!(!query.llm_rewrite_triggered);
        assert_eq!(query.final_query, query.normalized_text);
        assert!(query.rewritten_text.is_none());
    }

    #[tokio::test]
    async fn test_llm_reply_without_json_keeps_prior_text() {
        let query = with_llm(true, "抱歉，我无法理解这个请求。")
            .preprocess_at("嗯嗯", None, now())
            .await;

        let rewrite = query.rewrite.as_ref().unwrap();
        assert!(!rewrite.success);
        assert_eq!(rewrite.rewritten_text, "嗯嗯");
        assert_eq!(query.final_query, "嗯嗯");
        assert!(!query.llm_rewrite_triggered);
        assert!(!query.degraded);
        let last = query.processing_steps.last().unwrap();
        assert_eq!(last.status, StepStatus::Failed);
    }

    #[tokio::test]
    async fn test_successful_rewrite_replaces_final_query() {
        let reply = r#"{"rewritten_query": "查询今天的订单", "changes_made": ["补全对象"], "assumptions": ["指订单"], "confidence": 0.8}"#;
        let query = with_llm(true, reply).preprocess_at("嗯嗯", None, now()).await;

        assert!(query.llm_rewrite_triggered);
        assert!(query.quality_score < query_threshold());
        assert_eq!(query.final_query, "查询今天的订单");
        assert_eq!(query.rewritten_text.as_deref(), Some("查询今天的订单"));
    }

    struct PanickingLlm;

    #[async_trait]
    impl LlmProvider for PanickingLlm {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _temperature: Option<f64>,
        ) -> std::result::Result<(String, LlmMetadata), LlmProviderError> {
            panic!("connection pool poisoned");
        }

        fn provider_name(&self) -> &str {
            "panicking"
        }

        fn model_name(&self) -> &str {
            "panicking-1"
        }
    }

    #[tokio::test]
    async fn test_panicking_llm_keeps_rule_normalized_text() {
        let query = preprocessor()
            .with_llm(Arc::new(PanickingLlm))
            .preprocess_at("帮我看一下吧", None, now())
            .await;

        assert!(!query.degraded);
        assert_eq!(query.normalized_text, "查看");
        assert_eq!(query.final_query, query.normalized_text);
        assert!(!query.llm_rewrite_triggered);
        assert!(query.quality_score < 1.0);
        let last = query.processing_steps.last().unwrap();
        assert_eq!(last.name, "llm_rewrite");
        assert_eq!(last.status, StepStatus::Failed);
        assert_eq!(query.processing_steps.len(), 6);
    }

    #[test]
    fn test_preprocessor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QueryPreprocessor>();
    }

    #[tokio::test]
    async fn test_rewrite_only_below_threshold() {
        let reply = r#"{"rewritten_query": "改写结果", "confidence": 0.9}"#;
        let preprocessor = with_llm(true, reply);
        for input in ["帮我查一下上周的订单吧", "嗯嗯", "那个呢", "创建订单", "最近那批货咋样"] {
            let query = preprocessor.preprocess_at(input, None, now()).await;
            assert!((0.0..=1.0).contains(&query.quality_score));
            assert!(!query.final_query.is_empty());
            if query.llm_rewrite_triggered {
                assert!(query.quality_score < query_threshold());
            } else {
                assert!(query.quality_score >= query_threshold());
            }
        }
    }

    #[tokio::test]
    async fn test_empty_tables_round_trip_to_whitespace_normalization() {
        let preprocessor = QueryPreprocessor::new(
            PreprocessConfig::default(),
            Arc::new(ColloquialTable::empty()),
            Arc::new(TimeRuleTable::empty()),
        );
        for input in ["  帮我  查一下 上周的订单吧 ", "那批还有多少", "查询， 订单", "a", "   ", ""] {
            let query = preprocessor.preprocess_at(input, None, now()).await;
            assert_eq!(query.final_query, normalize_whitespace(input));
        }
    }

    #[tokio::test]
    async fn test_memory_error_degrades_whole_call() {
        let preprocessor = preprocessor().with_memory(Arc::new(BrokenMemory { panic: false }));
        let query = preprocessor.preprocess_at("帮我查一下那批吧", Some(&batch_context()), now()).await;

        assert!(query.degraded);
        assert_eq!(query.final_query, "帮我查一下那批吧");
        assert!(query.found_colloquials.is_empty());
        assert_eq!(query.processing_steps.len(), 1);
        assert_eq!(query.processing_steps[0].status, StepStatus::Failed);
    }

    #[tokio::test]
    async fn test_panicking_stage_degrades_whole_call() {
        let preprocessor = preprocessor().with_memory(Arc::new(BrokenMemory { panic: true }));
        let query = preprocessor.preprocess_at("那批还有多少", Some(&batch_context()), now()).await;

        assert!(query.degraded);
        assert_eq!(query.final_query, "那批还有多少");
        assert!((0.0..=1.0).contains(&query.quality_score));
    }

    #[tokio::test]
    async fn test_disabled_pipeline_passes_through() {
        let preprocessor = QueryPreprocessor::with_default_tables(PreprocessConfig::new(false, true, 0.6));
        let query = preprocessor.preprocess_at("帮我查一下上周的订单吧", None, now()).await;
        assert_eq!(query.final_query, "帮我查一下上周的订单吧");
        assert_eq!(query.processing_steps[0].status, StepStatus::Skipped);

        let enhanced = preprocessor.enhanced_preprocess("创建订单吧");
        assert_eq!(enhanced.processed, "创建订单吧");
        assert!(enhanced.features.is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_is_normalized_and_scored_low() {
        let query = preprocessor().preprocess_at("   ", None, now()).await;
        assert_eq!(query.final_query, "");
        assert_eq!(query.original_input, "   ");
        assert!(query.quality_score <= TOO_SHORT_CAP);
        assert!(!query.llm_rewrite_triggered);
        assert!(!query.degraded);
    }

    #[tokio::test]
    async fn test_input_stripped_to_nothing_keeps_normalized_text() {
        let query = preprocessor().preprocess_at("吧", None, now()).await;
        assert_eq!(query.final_query, "吧");
        assert!(!query.final_query.is_empty());
    }

    #[test]
    fn test_preprocess_blocks_on_plain_executor() {
        let query = tokio_test::block_on(preprocessor().preprocess("创建订单", None));
        assert_eq!(query.final_query, "创建订单");
        assert!((query.quality_score - 0.9).abs() < 1e-9);
    }

    fn query_threshold() -> f64 {
        PreprocessConfig::default().llm_rewrite_threshold
    }
}
