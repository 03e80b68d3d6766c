

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use super::error::Result;


#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, EnumString, IntoStaticStr, EnumIter, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Batch,
    Supplier,
    Customer,
    Product,
    Equipment,
}

impl EntityType {
    /// Canonical referring expressions for this entity type, longest first.
    #[must_use]
    pub fn referring_expressions(&self) -> &'static [&'static str] {
        match self {
            Self::Batch => &["这个批次", "那个批次", "这批货", "那批货", "该批次", "这批", "那批"],
            Self::Supplier => &[
                "这个供应商", "那个供应商", "这家供应商", "那家供应商", "该供应商",
            ],
            Self::Customer => &["这个客户", "那个客户", "这家客户", "那家客户", "该客户"],
            Self::Product => &["这个产品", "那个产品", "这款产品", "那款产品", "该产品"],
            Self::Equipment => &[
                "这台设备", "那台设备", "这个设备", "那个设备", "该设备", "这台", "那台",
            ],
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitySlot {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub entity_name: String,
}

impl EntitySlot {
    pub fn new(entity_type: EntityType, entity_id: impl Into<String>, entity_name: impl Into<String>) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.into(),
            entity_name: entity_name.into(),
        }
    }
}


/// Read-only view of a conversation, supplied by the caller for one call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    pub session_id: Option<String>,
    #[serde(default)]
    pub entity_slots: Vec<EntitySlot>,
    pub summary: Option<String>,
    pub last_intent: Option<String>,
}

impl ConversationContext {
    
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Default::default()
        }
    }

    
    pub fn with_slot(mut self, slot: EntitySlot) -> Self {
        self.entity_slots.push(slot);
        self
    }

    
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    
    pub fn with_last_intent(mut self, intent: impl Into<String>) -> Self {
        self.last_intent = Some(intent.into());
        self
    }
}


/// Session store capability that rewrites referring expressions in `text`
/// using what the session remembers.
pub trait ConversationMemory: Send + Sync {
    fn resolve_reference(&self, session_id: &str, text: &str) -> Result<String>;
}
