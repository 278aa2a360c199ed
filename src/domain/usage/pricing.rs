//! Model pricing table and cost estimation

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Pricing configuration for a model, in USD per 1K tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Model ID this pricing applies to
    pub model_id: String,
    /// Provider name
    pub provider: String,
    pub prompt_price_per_1k: f64,
    pub completion_price_per_1k: f64,
}

impl ModelPricing {
    /// Create new model pricing
    pub fn new(
        model_id: impl Into<String>,
        provider: impl Into<String>,
        prompt_per_1k: f64,
        completion_per_1k: f64,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            provider: provider.into(),
            prompt_price_per_1k: prompt_per_1k,
            completion_price_per_1k: completion_per_1k,
        }
    }

    /// Calculate cost in USD, rounded to six decimal places
    pub fn calculate_cost_usd(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        let prompt_cost = prompt_tokens as f64 / 1000.0 * self.prompt_price_per_1k;
        let completion_cost = completion_tokens as f64 / 1000.0 * self.completion_price_per_1k;

        round_usd(prompt_cost + completion_cost)
    }
}

fn round_usd(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Default pricing for the models the responder can reach
pub fn default_model_pricing() -> HashMap<String, ModelPricing> {
    let table: [(&str, &str, f64, f64); 11] = [
        ("gpt-4", "openai", 0.03, 0.06),
        ("gpt-4-turbo", "openai", 0.01, 0.03),
        ("gpt-4o", "openai", 0.005, 0.015),
        ("gpt-4o-mini", "openai", 0.00015, 0.0006),
        ("gpt-3.5-turbo", "openai", 0.0015, 0.002),
        ("anthropic.claude-3-5-sonnet-20241022-v2:0", "bedrock", 0.003, 0.015),
        ("anthropic.claude-3-5-sonnet-20240620-v1:0", "bedrock", 0.003, 0.015),
        ("anthropic.claude-3-5-haiku-20241022-v1:0", "bedrock", 0.0008, 0.004),
        ("anthropic.claude-3-sonnet-20240229-v1:0", "bedrock", 0.003, 0.015),
        ("anthropic.claude-3-haiku-20240307-v1:0", "bedrock", 0.00025, 0.00125),
        ("anthropic.claude-3-opus-20240229-v1:0", "bedrock", 0.015, 0.075),
    ];

    table
        .into_iter()
        .map(|(model, provider, prompt, completion)| {
            (
                model.to_string(),
                ModelPricing::new(model, provider, prompt, completion),
            )
        })
        .collect()
}

static PRICING: Lazy<HashMap<String, ModelPricing>> = Lazy::new(default_model_pricing);

/// Short names accepted in place of full Bedrock model IDs
static MODEL_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("claude-3-sonnet", "anthropic.claude-3-sonnet-20240229-v1:0"),
        ("claude-3-haiku", "anthropic.claude-3-haiku-20240307-v1:0"),
        ("claude-3-opus", "anthropic.claude-3-opus-20240229-v1:0"),
        ("claude-3.5-sonnet", "anthropic.claude-3-5-sonnet-20240620-v1:0"),
        ("claude-3.5-sonnet-v2", "anthropic.claude-3-5-sonnet-20241022-v2:0"),
        ("claude-3.5-haiku", "anthropic.claude-3-5-haiku-20241022-v1:0"),
    ])
});

/// Map an alias to its full model ID; other names pass through unchanged
pub fn resolve_model_alias(model: &str) -> &str {
    MODEL_ALIASES.get(model).copied().unwrap_or(model)
}

/// Look up pricing for a model or one of its aliases
pub fn pricing_for(model: &str) -> Option<&'static ModelPricing> {
    PRICING.get(resolve_model_alias(model))
}

/// Estimated cost of one exchange
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub cost: f64,
    /// False when the model has no pricing entry and `cost` is a placeholder 0
    pub known: bool,
}

/// Estimate the cost of an exchange. Unknown models cost 0 and are flagged.
pub fn estimate_cost(model: &str, prompt_tokens: u32, completion_tokens: u32) -> CostEstimate {
    match pricing_for(model) {
        Some(pricing) => CostEstimate {
            cost: pricing.calculate_cost_usd(prompt_tokens, completion_tokens),
            known: true,
        },
        None => CostEstimate {
            cost: 0.0,
            known: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_known_model_cost() {
        let estimate = estimate_cost("gpt-4", 1000, 1000);
        assert!(estimate.known);
        assert_close(estimate.cost, 0.09);

        let estimate = estimate_cost("anthropic.claude-3-haiku-20240307-v1:0", 2000, 400);
        assert_close(estimate.cost, 0.001);
    }

    #[test]
    fn test_alias_resolves_to_full_id() {
        assert_eq!(
            resolve_model_alias("claude-3.5-sonnet"),
            "anthropic.claude-3-5-sonnet-20240620-v1:0"
        );
        assert_eq!(resolve_model_alias("gpt-4o"), "gpt-4o");

        let via_alias = estimate_cost("claude-3-opus", 1000, 1000);
        let via_id = estimate_cost("anthropic.claude-3-opus-20240229-v1:0", 1000, 1000);
        assert_eq!(via_alias, via_id);
        assert_close(via_alias.cost, 0.09);
    }

    #[test]
    fn test_unknown_model_costs_nothing() {
        let estimate = estimate_cost("no-such-model", 5000, 5000);
        assert_eq!(estimate.cost, 0.0);
        assert!(!estimate.known);
    }

    #[test]
    fn test_cost_is_rounded_to_six_decimals() {
        // 7 tokens of gpt-4o-mini prompt = 0.00000105 USD
        let cost = pricing_for("gpt-4o-mini")
            .unwrap()
            .calculate_cost_usd(7, 0);
        assert_close(cost, 0.000001);
    }

    #[test]
    fn test_every_table_entry_has_positive_rates() {
        for pricing in default_model_pricing().values() {
            assert!(pricing.prompt_price_per_1k > 0.0, "{}", pricing.model_id);
            assert!(pricing.completion_price_per_1k > 0.0, "{}", pricing.model_id);
        }
    }
}
