//! Conversation history domain

mod entry;
mod repository;

pub use entry::{ConversationEntry, ConversationSnapshot};
pub use repository::ConversationStore;
