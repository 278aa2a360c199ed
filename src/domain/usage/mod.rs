//! Usage tracking and cost estimation domain
//!
//! Provides the static pricing table, running usage statistics and the
//! token approximation used when a backend reports no counts.

mod pricing;
mod stats;

pub use pricing::{
    default_model_pricing, estimate_cost, pricing_for, resolve_model_alias, CostEstimate,
    ModelPricing,
};
pub use stats::{ModelUsage, UsageStats};

/// Tokens assumed per whitespace-separated word
pub const TOKENS_PER_WORD: u32 = 2;

/// Rough token count: two tokens per word. Not a real tokenizer.
pub fn approximate_tokens(text: &str) -> u32 {
    let words = text.split_whitespace().count() as u32;
    words.saturating_mul(TOKENS_PER_WORD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approximate_tokens() {
        assert_eq!(approximate_tokens(""), 0);
        assert_eq!(approximate_tokens("What is Python?"), 6);
        assert_eq!(approximate_tokens("  spaced   out\nwords "), 6);
    }
}
