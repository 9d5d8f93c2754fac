use std::sync::{Mutex, MutexGuard, PoisonError};

/// Model whose prices apply to unknown models.
pub(crate) const DEFAULT_PRICED_MODEL: &str = "gpt-4o-mini";

/// USD per 1K tokens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
}

const PRICES: &[(&str, ModelPricing)] = &[
    (
        "gpt-4",
        ModelPricing {
            input: 0.03,
            output: 0.06,
        },
    ),
    (
        "gpt-4o-mini",
        ModelPricing {
            input: 0.00015,
            output: 0.0006,
        },
    ),
    (
        "gpt-3.5-turbo",
        ModelPricing {
            input: 0.001,
            output: 0.002,
        },
    ),
];

#[derive(Clone, Debug, PartialEq)]
pub struct CallCost {
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost: f64,
    pub label: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CostSummary {
    pub total_calls: usize,
    pub total_cost: f64,
    pub avg_cost_per_call: f64,
}

/// Running tally of estimated API spend.
#[derive(Debug, Default)]
pub struct CostTracker {
    calls: Mutex<Vec<CallCost>>,
}

impl CostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pricing(model: &str) -> Option<ModelPricing> {
        PRICES
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, pricing)| *pricing)
    }

    /// Records one call and returns its cost.
    pub fn track_call(
        &self,
        model: &str,
        input_tokens: u32,
        output_tokens: u32,
        label: &str,
    ) -> f64 {
        let pricing = Self::pricing(model).unwrap_or_else(|| {
            tracing::warn!(model, "unknown model, using {DEFAULT_PRICED_MODEL} prices");
            Self::pricing(DEFAULT_PRICED_MODEL).unwrap_or(ModelPricing {
                input: 0.0,
                output: 0.0,
            })
        });
        let cost = f64::from(input_tokens) / 1000.0 * pricing.input
            + f64::from(output_tokens) / 1000.0 * pricing.output;

        let mut calls = self.lock();
        calls.push(CallCost {
            model: model.to_string(),
            input_tokens,
            output_tokens,
            cost,
            label: label.to_string(),
        });
        let total: f64 = calls.iter().map(|call| call.cost).sum();
        tracing::info!(
            model,
            label,
            cost = %format!("${cost:.6}"),
            total = %format!("${total:.6}"),
            "llm call cost"
        );
        cost
    }

    pub fn calls(&self) -> Vec<CallCost> {
        self.lock().clone()
    }

    pub fn summary(&self) -> CostSummary {
        let calls = self.lock();
        let total_cost: f64 = calls.iter().map(|call| call.cost).sum();
        let avg_cost_per_call = if calls.is_empty() {
            0.0
        } else {
            total_cost / calls.len() as f64
        };
        CostSummary {
            total_calls: calls.len(),
            total_cost,
            avg_cost_per_call,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CallCost>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
