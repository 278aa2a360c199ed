//! Running usage statistics over successful exchanges

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::llm::AiResponse;

/// Per-model usage breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub count: u64,
    pub tokens: u64,
    pub cost: f64,
}

/// Aggregated usage across all successful exchanges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub total_requests: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub model_breakdown: BTreeMap<String, ModelUsage>,
    /// Running average of processing time, in seconds
    pub average_processing_time: f64,
}

impl UsageStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one response into the totals. Error responses are ignored.
    pub fn add_response(&mut self, response: &AiResponse) {
        if !response.is_success() {
            return;
        }

        self.total_requests += 1;
        self.total_tokens += response.usage.total_tokens as u64;
        self.total_cost += response.usage.estimated_cost;

        // Update running average processing time
        let prev_total = self.average_processing_time * (self.total_requests - 1) as f64;
        self.average_processing_time =
            (prev_total + response.processing_time) / self.total_requests as f64;

        let entry = self
            .model_breakdown
            .entry(response.model.clone())
            .or_default();
        entry.count += 1;
        entry.tokens += response.usage.total_tokens as u64;
        entry.cost += response.usage.estimated_cost;
    }
}
