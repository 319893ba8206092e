//! Signal extraction over respondent text.
//!
//! Signals are recomputed from the whole transcript on every turn. Only
//! respondent-authored turns are scanned; interviewer questions mention the
//! same vocabulary and would otherwise reinforce themselves.

use regex::Regex;
use std::sync::LazyLock;

use parley_core::types::{SignalSet, Transcript};

// =============================================================================
// Vocabularies (compiled once, reused across calls)
// =============================================================================

static TECHNOLOGY_TERMS: &[&str] = &[
    "react", "vue", "angular", "svelte", "next.js", "typescript", "javascript", "python",
    "java", "rust", "golang", "kotlin", "ruby", "rails", "django", "flask",
    "fastapi", "node.js", "nodejs", "docker", "kubernetes", "k8s", "aws", "azure",
    "gcp", "terraform", "sql", "postgres", "postgresql", "mysql", "mongodb", "redis",
    "graphql", "api", "apis", "microservice", "microservices", "kafka", "spark",
    "tensorflow", "pytorch", "html", "css", "linux", "ci/cd", "jenkins", "firebase",
];

static TECHNOLOGY_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alts: Vec<String> = TECHNOLOGY_TERMS.iter().map(|t| regex::escape(t)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alts.join("|"))).unwrap()
});

struct MetricPatterns {
    percentage: Regex,
    multiplier: Regex,
    currency: Regex,
    magnitude: Regex,
    outcome_verb: Regex,
}

static METRIC_PATTERNS: LazyLock<MetricPatterns> = LazyLock::new(|| MetricPatterns {
    percentage: Regex::new(r"(?i)\d+(?:\.\d+)?\s?(?:%|percent\b)").unwrap(),
    multiplier: Regex::new(r"(?i)\b\d+(?:\.\d+)?x\b").unwrap(),
    currency: Regex::new(r"[$€£]\s?\d").unwrap(),
    magnitude: Regex::new(
        r"(?i)\b\d{1,3}(?:,\d{3})+\b|\b\d+(?:\.\d+)?\s?(?:k|m|million|thousand|billion)\b|\b(?:million|thousand|billion)\b",
    )
    .unwrap(),
    outcome_verb: Regex::new(
        r"(?i)\b(?:improved|increased|reduced|saved|decreased|cut|grew|boosted)\b",
    )
    .unwrap(),
});

static TEAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:teams?|engineers?|colleagues?|solo|pair(?:ed|ing)?)\b").unwrap()
});

static TIMEFRAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:weeks?|months?|sprints?|quarters?|deadlines?)\b").unwrap()
});

static BUSINESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:revenue|customers?|costs?|profits?|efficiency)\b").unwrap()
});

// =============================================================================
// ContextSignalExtractor
// =============================================================================

/// Maps a transcript to a [`SignalSet`]. Deterministic and total.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextSignalExtractor;

impl ContextSignalExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Compute signals over every respondent turn in `transcript`.
    pub fn extract(&self, transcript: &Transcript) -> SignalSet {
        transcript
            .respondent_turns()
            .fold(SignalSet::default(), |acc, turn| {
                let found = self.scan(&turn.text);
                SignalSet {
                    mentions_technology: acc.mentions_technology || found.mentions_technology,
                    mentions_metric: acc.mentions_metric || found.mentions_metric,
                    mentions_team: acc.mentions_team || found.mentions_team,
                    mentions_timeframe: acc.mentions_timeframe || found.mentions_timeframe,
                    mentions_business_impact: acc.mentions_business_impact
                        || found.mentions_business_impact,
                    respondent_turn_count: acc.respondent_turn_count + 1,
                }
            })
    }

    /// Signals present in a single piece of text. The turn count is zero.
    pub fn scan(&self, text: &str) -> SignalSet {
        SignalSet {
            mentions_technology: TECHNOLOGY_RE.is_match(text),
            mentions_metric: mentions_metric(text),
            mentions_team: TEAM_RE.is_match(text),
            mentions_timeframe: TIMEFRAME_RE.is_match(text),
            mentions_business_impact: BUSINESS_RE.is_match(text),
            respondent_turn_count: 0,
        }
    }

    /// One-line summary of `signals`, used inside generation prompts.
    pub fn summarize(signals: &SignalSet) -> String {
        let flag = |b: bool| if b { "yes" } else { "no" };
        format!(
            "technology: {}, metrics: {}, team: {}, timeframe: {}, business impact: {}, answers so far: {}",
            flag(signals.mentions_technology),
            flag(signals.mentions_metric),
            flag(signals.mentions_team),
            flag(signals.mentions_timeframe),
            flag(signals.mentions_business_impact),
            signals.respondent_turn_count,
        )
    }
}

/// A figure is a metric on its own when it is a percentage, multiplier, or
/// currency amount. Plain magnitudes only count next to an outcome verb.
fn mentions_metric(text: &str) -> bool {
    let p = &*METRIC_PATTERNS;
    p.percentage.is_match(text)
        || p.multiplier.is_match(text)
        || p.currency.is_match(text)
        || (p.magnitude.is_match(text) && p.outcome_verb.is_match(text))
}

// =============================================================================
// Tests
// =============================================================================
