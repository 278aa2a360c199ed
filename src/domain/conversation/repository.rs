//! Conversation store trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::{ConversationEntry, ConversationSnapshot};
use crate::domain::llm::{AiResponse, Message};
use crate::domain::usage::UsageStats;
use crate::domain::DomainError;

/// Append-only record of completed exchanges plus the usage totals they imply.
///
/// `record` must append the entry and fold its usage into the stats as one
/// step: no reader may observe one without the other.
#[async_trait]
pub trait ConversationStore: Send + Sync + Debug {
    /// Append an exchange and update the running stats
    async fn record(
        &self,
        message: Message,
        response: AiResponse,
    ) -> Result<ConversationEntry, DomainError>;

    /// Entries in completion order
    async fn history(&self) -> Result<Vec<ConversationEntry>, DomainError>;

    /// Current usage totals
    async fn stats(&self) -> Result<UsageStats, DomainError>;

    /// History and stats taken together
    async fn snapshot(&self) -> Result<ConversationSnapshot, DomainError>;
}
