//! Termination policy: decides when an interview has gone on long enough.
//!
//! Rules, first match wins:
//! 1. `time_reserve_secs` or less of budget left -> TimeExceeded
//! 2. `turn_cap` respondent turns -> TurnCapReached
//! 3. `quality_min_turns` turns with technology and metric signals -> QualitySufficient
//! 4. otherwise Continue

use std::time::Duration;

use parley_core::config::PolicyConfig;
use parley_core::types::{SignalSet, TerminationDecision, TerminationReason};

use crate::clock::SessionClock;

#[derive(Debug, Clone, Default)]
pub struct TerminationPolicy {
    config: PolicyConfig,
}

impl TerminationPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn decide(&self, signals: &SignalSet, clock: &SessionClock) -> TerminationDecision {
        self.decide_with_remaining(signals, clock.remaining())
    }

    /// Same rules as [`decide`](Self::decide), with remaining time supplied directly.
    pub fn decide_with_remaining(
        &self,
        signals: &SignalSet,
        remaining: Duration,
    ) -> TerminationDecision {
        if remaining <= Duration::from_secs(self.config.time_reserve_secs) {
            return TerminationDecision::Finalize(TerminationReason::TimeExceeded);
        }

        if signals.respondent_turn_count >= self.config.turn_cap {
            return TerminationDecision::Finalize(TerminationReason::TurnCapReached);
        }

        if signals.respondent_turn_count >= self.config.quality_min_turns
            && signals.mentions_technology
            && signals.mentions_metric
        {
            return TerminationDecision::Finalize(TerminationReason::QualitySufficient);
        }

        TerminationDecision::Continue
    }
}
