//! In-memory usage ledger.
//!
//! This adapter provides an in-memory implementation of the `UsageRecorder`
//! port. Every call is logged through `tracing` and folded into running
//! totals; individual events are not retained, so memory use stays constant.
//!
//! Totals reset on restart. Long-term usage analytics belong in log
//! aggregation, fed by the per-call log lines this ledger emits.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::ports::{CallOutcome, LlmCallEvent, ModelUsage, UsageRecorder, UsageSummary};

#[derive(Debug, Default)]
struct Totals {
    calls: u64,
    successful_calls: u64,
    attempts: u64,
    input_tokens: u64,
    output_tokens: u64,
    total_tokens: u64,
    total_latency: Duration,
    by_model: BTreeMap<(String, String), ModelUsage>,
}

/// In-memory implementation of the UsageRecorder port.
///
/// Thread-safe via an internal `Mutex` held only while updating counters.
///
/// # Example
///
/// ```ignore
/// let ledger = Arc::new(UsageLedger::new());
/// let client = RetryingLlmClient::new(inner, ledger.clone());
///
/// // ... after some calls
/// let summary = ledger.summary();
/// ```
#[derive(Debug, Default)]
pub struct UsageLedger {
    totals: Mutex<Totals>,
}

impl UsageLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn totals(&self) -> MutexGuard<'_, Totals> {
        self.totals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl UsageRecorder for UsageLedger {
    fn record(&self, event: LlmCallEvent) {
        let latency_ms = event.latency.as_millis() as u64;
        match event.outcome {
            CallOutcome::Success => tracing::info!(
                provider = %event.provider,
                model = %event.model,
                attempts = event.attempts,
                latency_ms,
                input_tokens = event.usage.map(|u| u.input_tokens).unwrap_or_default(),
                output_tokens = event.usage.map(|u| u.output_tokens).unwrap_or_default(),
                "LLM call completed"
            ),
            outcome => tracing::warn!(
                provider = %event.provider,
                model = %event.model,
                attempts = event.attempts,
                latency_ms,
                outcome = ?outcome,
                "LLM call failed"
            ),
        }

        let mut totals = self.totals();
        totals.calls += 1;
        totals.attempts += u64::from(event.attempts);
        totals.total_latency += event.latency;

        let tokens = event.usage.map(|u| u.total_tokens).unwrap_or_default();
        if event.outcome == CallOutcome::Success {
            totals.successful_calls += 1;
        }
        if let Some(usage) = event.usage {
            totals.input_tokens += u64::from(usage.input_tokens);
            totals.output_tokens += u64::from(usage.output_tokens);
            totals.total_tokens += u64::from(usage.total_tokens);
        }

        let entry = totals
            .by_model
            .entry((event.provider.clone(), event.model.clone()))
            .or_insert_with(|| ModelUsage {
                provider: event.provider,
                model: event.model,
                calls: 0,
                total_tokens: 0,
            });
        entry.calls += 1;
        entry.total_tokens += u64::from(tokens);
    }

    fn summary(&self) -> UsageSummary {
        let totals = self.totals();
        let average_latency_ms = if totals.calls == 0 {
            0
        } else {
            (totals.total_latency.as_millis() / u128::from(totals.calls)) as u64
        };

        UsageSummary {
            calls: totals.calls,
            successful_calls: totals.successful_calls,
            failed_calls: totals.calls - totals.successful_calls,
            attempts: totals.attempts,
            input_tokens: totals.input_tokens,
            output_tokens: totals.output_tokens,
            total_tokens: totals.total_tokens,
            average_latency_ms,
            by_model: totals.by_model.values().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::writing::TokenUsage;
    use std::sync::Arc;

    fn success(model: &str, latency_ms: u64, input: u32, output: u32) -> LlmCallEvent {
        LlmCallEvent::new(
            "anthropic",
            model,
            CallOutcome::Success,
            1,
            Duration::from_millis(latency_ms),
        )
        .with_usage(TokenUsage::new(input, output))
    }

    #[test]
    fn empty_ledger_has_zero_summary() {
        assert_eq!(UsageLedger::new().summary(), UsageSummary::default());
    }

    #[test]
    fn aggregates_calls_tokens_and_latency() {
        let ledger = UsageLedger::new();
        ledger.record(success("sonnet", 100, 10, 5));
        ledger.record(success("sonnet", 300, 20, 5));
        ledger.record(LlmCallEvent::new(
            "anthropic",
            "sonnet",
            CallOutcome::Unavailable,
            3,
            Duration::from_millis(200),
        ));

        let summary = ledger.summary();
        assert_eq!(summary.calls, 3);
        assert_eq!(summary.successful_calls, 2);
        assert_eq!(summary.failed_calls, 1);
        assert_eq!(summary.attempts, 5);
        assert_eq!(summary.input_tokens, 30);
        assert_eq!(summary.output_tokens, 10);
        assert_eq!(summary.total_tokens, 40);
        assert_eq!(summary.average_latency_ms, 200);
    }

    #[test]
    fn breaks_down_by_model() {
        let ledger = UsageLedger::new();
        ledger.record(success("haiku", 10, 1, 1));
        ledger.record(success("sonnet", 10, 5, 5));
        ledger.record(success("sonnet", 10, 5, 5));

        let by_model = ledger.summary().by_model;
        assert_eq!(by_model.len(), 2);
        assert_eq!(by_model[0].model, "haiku");
        assert_eq!(by_model[0].total_tokens, 2);
        assert_eq!(by_model[1].model, "sonnet");
        assert_eq!(by_model[1].calls, 2);
        assert_eq!(by_model[1].total_tokens, 20);
    }

    #[test]
    fn concurrent_recording_is_consistent() {
        let ledger = Arc::new(UsageLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        ledger.record(success("sonnet", 1, 1, 1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let summary = ledger.summary();
        assert_eq!(summary.calls, 800);
        assert_eq!(summary.total_tokens, 1600);
    }
}
