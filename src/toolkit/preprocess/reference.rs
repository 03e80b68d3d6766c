

use std::collections::BTreeMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::context::{ConversationContext, ConversationMemory, EntityType};
use crate::core::error::Result;

lazy_static! {
    static ref REFERRING_EXPRESSION: Regex = Regex::new(
        r"(?:这|那|该)(?:个|些|家|台|款|位|条|笔)?(?:批次|供应商|客户|产品|设备|订单|物料|产线|工单|仓库)|(?:这|那)(?:批货|批|台)|它们|它"
    ).expect("referring expression pattern");
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedReference {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub entity_name: String,
    /// Referring expression that was replaced.
    pub matched_span: String,
}


#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReferenceResolution {
    pub text: String,
    /// Keyed by the referring expression.
    pub resolved: BTreeMap<String, ResolvedReference>,
    pub unresolved: Vec<String>,
}


/// Stateless per call. Which slot was substituted is inferred by diffing the
/// text before and after the memory collaborator ran, so two slots whose
/// names or expressions overlap can be mis-attributed.
#[derive(Clone, Default)]
pub struct ReferenceResolver {
    memory: Option<Arc<dyn ConversationMemory>>,
}

impl ReferenceResolver {
    
    pub fn new(memory: Option<Arc<dyn ConversationMemory>>) -> Self {
        Self { memory }
    }

    
    pub fn has_memory(&self) -> bool {
        self.memory.is_some()
    }

    
    pub fn resolve(&self, text: &str, context: Option<&ConversationContext>) -> Result<ReferenceResolution> {
        let mut resolution = ReferenceResolution {
            text: text.to_string(),
            ..Default::default()
        };

        let session = context.and_then(|ctx| ctx.session_id.as_deref().map(|id| (ctx, id)));
        if let (Some(memory), Some((ctx, session_id))) = (&self.memory, session) {
            let resolved_text = memory.resolve_reference(session_id, text)?;
            if resolved_text.trim().is_empty() {
                warn!("Conversation memory returned empty text for session {}, keeping input", session_id);
            } else {
                resolution.resolved = reconcile(text, &resolved_text, ctx);
                resolution.text = resolved_text;
            }
        }

        resolution.unresolved = find_unresolved(&resolution.text, &resolution.resolved);

        debug!(
            "Reference resolution: {} resolved, {} unresolved",
            resolution.resolved.len(),
            resolution.unresolved.len()
        );
        Ok(resolution)
    }
}

/// For every slot whose name shows up in the resolved text, records the first
/// of its type's expressions that was present before and is gone after.
fn reconcile(original: &str, resolved: &str, context: &ConversationContext) -> BTreeMap<String, ResolvedReference> {
    let mut references = BTreeMap::new();

    for slot in &context.entity_slots {
        if slot.entity_name.is_empty() || !resolved.contains(&slot.entity_name) {
            continue;
        }
        let expression = slot
            .entity_type
            .referring_expressions()
            .iter()
            .find(|expr| original.contains(**expr) && !resolved.contains(**expr) && !references.contains_key(**expr));

        if let Some(expr) = expression {
            references.insert(
                expr.to_string(),
                ResolvedReference {
                    entity_type: slot.entity_type,
                    entity_id: slot.entity_id.clone(),
                    entity_name: slot.entity_name.clone(),
                    matched_span: expr.to_string(),
                },
            );
        }
    }

    references
}

fn find_unresolved(text: &str, resolved: &BTreeMap<String, ResolvedReference>) -> Vec<String> {
    let mut unresolved: Vec<String> = Vec::new();
    for m in REFERRING_EXPRESSION.find_iter(text) {
        let expr = m.as_str();
        // "其它" means "other", not a pronoun.
        if expr.starts_with('它') && text[..m.start()].ends_with('其') {
            continue;
        }
        if !resolved.contains_key(expr) && !unresolved.iter().any(|u| u == expr) {
            unresolved.push(expr.to_string());
        }
    }
    unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::EntitySlot;
    use crate::core::error::PreprocessError;

    /// Replaces each slot type's expressions with the slot name.
    struct SlotMemory {
        context: ConversationContext,
    }

    impl ConversationMemory for SlotMemory {
        fn resolve_reference(&self, _session_id: &str, text: &str) -> Result<String> {
            let mut out = text.to_string();
            for slot in &self.context.entity_slots {
                for expr in slot.entity_type.referring_expressions() {
                    out = out.replace(expr, &slot.entity_name);
                }
            }
            Ok(out)
        }
    }

    struct FailingMemory;

    impl ConversationMemory for FailingMemory {
        fn resolve_reference(&self, _session_id: &str, _text: &str) -> Result<String> {
            Err(PreprocessError::Memory("session store offline".to_string()))
        }
    }

    fn batch_context() -> ConversationContext {
        ConversationContext::for_session("s-1").with_slot(EntitySlot::new(EntityType::Batch, "batch-42", "B-2024-01"))
    }

    #[test]
    fn test_resolves_batch_reference() {
        let ctx = batch_context();
        let resolver = ReferenceResolver::new(Some(Arc::new(SlotMemory { context: ctx.clone() })));
        let resolution = resolver.resolve("那批还有多少", Some(&ctx)).unwrap();

        assert_eq!(resolution.text, "B-2024-01还有多少");
        assert!(resolution.unresolved.is_empty());
        let reference = &resolution.resolved["那批"];
        assert_eq!(reference.entity_id, "batch-42");
        assert_eq!(reference.entity_type, EntityType::Batch);
    }

    #[test]
    fn test_unmatched_expression_reported_unresolved() {
        let ctx = batch_context();
        let resolver = ReferenceResolver::new(Some(Arc::new(SlotMemory { context: ctx.clone() })));
        let resolution = resolver.resolve("那批给这个供应商发了吗", Some(&ctx)).unwrap();

        assert!(resolution.resolved.contains_key("那批"));
        assert_eq!(resolution.unresolved, vec!["这个供应商".to_string()]);
    }

    #[test]
    fn test_no_session_is_pass_through() {
        let ctx = ConversationContext::default()
            .with_slot(EntitySlot::new(EntityType::Batch, "batch-42", "B-2024-01"));
        let resolver = ReferenceResolver::new(Some(Arc::new(FailingMemory)));
        let resolution = resolver.resolve("那批还有多少", Some(&ctx)).unwrap();

        assert_eq!(resolution.text, "那批还有多少");
        assert!(resolution.resolved.is_empty());
        assert_eq!(resolution.unresolved, vec!["那批".to_string()]);
    }

    #[test]
    fn test_no_memory_no_context() {
        let resolution = ReferenceResolver::default().resolve("查询这个订单和它的批次", None).unwrap();
        assert!(resolution.resolved.is_empty());
        assert_eq!(resolution.unresolved, vec!["这个订单".to_string(), "它".to_string()]);
    }

    #[test]
    fn test_memory_error_propagates() {
        let resolver = ReferenceResolver::new(Some(Arc::new(FailingMemory)));
        let result = resolver.resolve("那批还有多少", Some(&batch_context()));
        assert!(matches!(result, Err(PreprocessError::Memory(_))));
    }

    #[test]
    fn test_other_is_not_a_pronoun() {
        let resolution = ReferenceResolver::default().resolve("查询其它产品", None).unwrap();
        assert!(resolution.unresolved.is_empty());

        let resolution = ReferenceResolver::default().resolve("其它批次和它的供应商", None).unwrap();
        assert_eq!(resolution.unresolved, vec!["它".to_string()]);
    }

    #[test]
    fn test_time_words_are_not_references() {
        let resolution = ReferenceResolver::default().resolve("这个月的产量", None).unwrap();
        assert!(resolution.unresolved.is_empty());
    }
}
