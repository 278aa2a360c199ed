//! In-memory conversation store

use std::collections::VecDeque;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{
    AiResponse, ConversationEntry, ConversationSnapshot, ConversationStore, DomainError, Message,
    UsageStats,
};

#[derive(Debug, Default)]
struct State {
    entries: VecDeque<ConversationEntry>,
    stats: UsageStats,
}

/// Process-local conversation log.
///
/// Entries and stats live behind one lock so a record is applied as a whole.
/// With a cap, the oldest entries are dropped from history; the stats keep
/// counting them.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    state: RwLock<State>,
    max_entries: Option<usize>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `max_entries` history entries.
    ///
    /// Stats never decrease, so once entries are dropped the aggregates cover
    /// more exchanges than the history holds and no longer equal the sum over
    /// the retained entries.
    pub fn with_capacity_limit(max_entries: usize) -> Self {
        Self {
            state: RwLock::default(),
            max_entries: Some(max_entries),
        }
    }

    fn read_state<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T, DomainError> {
        let state = self
            .state
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(f(&state))
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn record(
        &self,
        message: Message,
        response: AiResponse,
    ) -> Result<ConversationEntry, DomainError> {
        let entry = ConversationEntry::new(message, response);

        let mut state = self
            .state
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?;

        state.stats.add_response(&entry.response);
        state.entries.push_back(entry.clone());

        if let Some(max) = self.max_entries {
            while state.entries.len() > max {
                state.entries.pop_front();
            }
        }

        debug!(
            entry_id = %entry.id,
            status = ?entry.response.status,
            model = %entry.response.model,
            tokens = entry.response.usage.total_tokens,
            total_requests = state.stats.total_requests,
            "Recorded exchange"
        );

        Ok(entry)
    }

    async fn history(&self) -> Result<Vec<ConversationEntry>, DomainError> {
        self.read_state(|state| state.entries.iter().cloned().collect())
    }

    async fn stats(&self) -> Result<UsageStats, DomainError> {
        self.read_state(|state| state.stats.clone())
    }

    async fn snapshot(&self) -> Result<ConversationSnapshot, DomainError> {
        self.read_state(|state| ConversationSnapshot {
            history: state.entries.iter().cloned().collect(),
            stats: state.stats.clone(),
        })
    }
}
