use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::llm::{AiResponse, Message};
use crate::domain::usage::UsageStats;

/// One completed exchange, in the order it finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub id: Uuid,
    pub message: Message,
    pub response: AiResponse,
    pub recorded_at: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn new(message: Message, response: AiResponse) -> Self {
        Self {
            id: Uuid::new_v4(),
            message,
            response,
            recorded_at: Utc::now(),
        }
    }
}

/// History and stats read under the same lock
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub history: Vec<ConversationEntry>,
    pub stats: UsageStats,
}
