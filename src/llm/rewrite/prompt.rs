use chrono::NaiveDateTime;

use crate::core::context::ConversationContext;


pub const SYSTEM_PROMPT_HEADER: &str = r#"You rewrite user requests for a manufacturing and supply-chain assistant so that an intent matcher can execute them without asking back.

Rules:
1. Keep the user's language (Chinese stays Chinese).
2. Replace pronouns and demonstratives with the entities listed below when the match is unambiguous.
3. Turn vague time words into concrete dates relative to the current time.
4. Do not invent entities, numbers or filters the user did not imply.
5. If nothing needs to change, return the request unchanged with confidence below 0.5."#;


pub fn build_rewrite_prompt(now: NaiveDateTime, context: Option<&ConversationContext>) -> String {
    let mut prompt = String::from(SYSTEM_PROMPT_HEADER);

    prompt.push_str(&format!("\n\n**Current time:** {}", now.format("%Y-%m-%d %H:%M (%A)")));

    let slots = context.map(|c| c.entity_slots.as_slice()).unwrap_or_default();
    if slots.is_empty() {
        prompt.push_str("\n\n**Known entities:** none");
    } else {
        prompt.push_str("\n\n**Known entities:**");
        for slot in slots {
            prompt.push_str(&format!(
                "\n- {}: {} (id: {})",
                slot.entity_type.as_str(),
                slot.entity_name,
                slot.entity_id
            ));
        }
    }

    if let Some(summary) = context.and_then(|c| c.summary.as_deref()).filter(|s| !s.is_empty()) {
        prompt.push_str(&format!("\n\n**Conversation so far:** {summary}"));
    }
    if let Some(intent) = context.and_then(|c| c.last_intent.as_deref()).filter(|s| !s.is_empty()) {
        prompt.push_str(&format!("\n\n**Previous intent:** {intent}"));
    }

    prompt.push_str(
        r#"

**Response Format (JSON):**
{
  "rewritten_query": "the rewritten request",
  "changes_made": ["what you changed"],
  "assumptions": ["what you assumed"],
  "confidence": 0.0-1.0
}

Always respond with valid JSON."#,
    );

    prompt
}
