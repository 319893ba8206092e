//! Follow-up question composition.
//!
//! Two tiers: one time-bounded call to the generation service, then a
//! deterministic keyword-routed template if that call fails or returns
//! something unusable. The fallback tier cannot fail.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;

use parley_core::config::GenerationConfig;
use parley_core::types::{SignalFocus, SignalSet, Speaker, Transcript};
use parley_generation::{
    DynGenerationService, GenerationConstraints, GenerationError, GenerationRequest,
};

use crate::signals::ContextSignalExtractor;
use crate::types::{FollowUp, FollowUpSource};

// =============================================================================
// Fallback templates
// =============================================================================

const FRONTEND_FOLLOW_UP: &str = "That React work sounds great! How many users relied on that interface, and did you measure any improvement in load time or engagement?";
const BACKEND_FOLLOW_UP: &str = "Interesting backend work! What kind of scale did it handle, for example requests per second or daily users, and how did you keep performance up?";
const DATA_FOLLOW_UP: &str = "Nice! How did you design the schema, and what did you do to keep queries fast as the data grew?";
const TEAM_FOLLOW_UP: &str = "Sounds like a real team effort! How many people were on the team, and what was your specific role?";
const IMPACT_FOLLOW_UP: &str = "That's a solid improvement! Can you put a number on the impact, like a percentage, time saved, or cost reduced?";
const GENERIC_FOLLOW_UP: &str = "Thanks for sharing! Could you elaborate a bit more on what you did and what the outcome was?";

struct FallbackRoutes {
    frontend: Regex,
    backend: Regex,
    data: Regex,
    collaboration: Regex,
    improvement: Regex,
}

static FALLBACK_ROUTES: LazyLock<FallbackRoutes> = LazyLock::new(|| FallbackRoutes {
    frontend: Regex::new(
        r"(?i)\b(?:react|frontend|front-end|ui|ux|components?|jsx|css|interface)\b",
    )
    .unwrap(),
    backend: Regex::new(
        r"(?i)\b(?:backend|back-end|apis?|servers?|endpoints?|microservices?|node\.js|services?)\b",
    )
    .unwrap(),
    data: Regex::new(
        r"(?i)\b(?:database|databases|db|sql|postgres(?:ql)?|mysql|mongodb|schema|quer(?:y|ies)|redis)\b",
    )
    .unwrap(),
    collaboration: Regex::new(
        r"(?i)\b(?:teams?|collaborat\w*|colleagues?|engineers?|pair(?:ed|ing)?|worked\s+with)\b",
    )
    .unwrap(),
    improvement: Regex::new(
        r"(?i)\b(?:improved?|improving|optimi[sz]ed|increased|reduced|faster|better|sped\s+up)\b",
    )
    .unwrap(),
});

// =============================================================================
// FollowUpComposer
// =============================================================================

const SYSTEM_PROMPT: &str = "You are a warm, encouraging career coach interviewing someone about their work so you can later write resume bullets for them. Ask exactly one follow-up question. Reply with the question only, no preamble.";

/// Builds the next interviewer question.
pub struct FollowUpComposer {
    service: Option<Arc<dyn DynGenerationService>>,
    timeout: Duration,
    constraints: GenerationConstraints,
    word_limit: usize,
    min_response_chars: usize,
    max_prompt_chars: usize,
}

impl FollowUpComposer {
    /// Composer that tries `service` first.
    pub fn new(service: Arc<dyn DynGenerationService>, config: &GenerationConfig) -> Self {
        Self {
            service: Some(service),
            ..Self::offline(config)
        }
    }

    /// Composer that only uses the rule-based templates.
    pub fn offline(config: &GenerationConfig) -> Self {
        Self {
            service: None,
            timeout: Duration::from_millis(config.timeout_ms),
            constraints: GenerationConstraints {
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            },
            word_limit: config.follow_up_word_limit,
            min_response_chars: config.min_response_chars,
            max_prompt_chars: config.max_prompt_chars,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.service.is_none()
    }

    /// Compose the next question. Never fails.
    pub async fn compose(&self, transcript: &Transcript, signals: &SignalSet) -> FollowUp {
        match self.compose_generated(transcript, signals).await {
            Ok(text) => FollowUp {
                text,
                source: FollowUpSource::Generated,
            },
            Err(e) => {
                if self.service.is_some() {
                    tracing::warn!(
                        error = %e,
                        retryable = e.is_retryable(),
                        "Follow-up generation failed, using fallback"
                    );
                }
                let latest = transcript
                    .last_respondent()
                    .map(|t| t.text.as_str())
                    .unwrap_or("");
                FollowUp {
                    text: Self::compose_fallback(latest).to_string(),
                    source: FollowUpSource::Fallback,
                }
            }
        }
    }

    /// Primary tier: one bounded generation call, normalized and checked.
    pub async fn compose_generated(
        &self,
        transcript: &Transcript,
        signals: &SignalSet,
    ) -> Result<String, GenerationError> {
        let Some(service) = &self.service else {
            return Err(GenerationError::Unavailable("offline".to_string()));
        };

        let request = self.build_request(transcript, signals);
        let raw = tokio::time::timeout(self.timeout, service.generate_boxed(&request))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))??;

        let text = normalize_question(&raw, self.word_limit);
        if text.is_empty() {
            return Err(GenerationError::Empty);
        }
        let len = text.chars().count();
        if len < self.min_response_chars {
            return Err(GenerationError::LowConfidence { len });
        }
        Ok(text)
    }

    /// Fallback tier: route on keywords in the latest respondent message.
    ///
    /// Priority: front-end, backend, data store, collaboration, improvement,
    /// then a generic prompt.
    pub fn compose_fallback(latest_response: &str) -> &'static str {
        let r = &*FALLBACK_ROUTES;
        if r.frontend.is_match(latest_response) {
            FRONTEND_FOLLOW_UP
        } else if r.backend.is_match(latest_response) {
            BACKEND_FOLLOW_UP
        } else if r.data.is_match(latest_response) {
            DATA_FOLLOW_UP
        } else if r.collaboration.is_match(latest_response) {
            TEAM_FOLLOW_UP
        } else if r.improvement.is_match(latest_response) {
            IMPACT_FOLLOW_UP
        } else {
            GENERIC_FOLLOW_UP
        }
    }

    pub(crate) fn build_request(
        &self,
        transcript: &Transcript,
        signals: &SignalSet,
    ) -> GenerationRequest {
        let focus = match signals.missing_focus() {
            Some(SignalFocus::Metric) => {
                "Ask for a concrete number: a percentage, time saved, users served, or money saved."
            }
            Some(SignalFocus::Team) => "Ask how big the team was and what their own role was.",
            Some(SignalFocus::Technology) => {
                "Ask which technologies, languages, or tools they used."
            }
            Some(SignalFocus::BusinessImpact) => {
                "Ask how the work affected customers, revenue, or costs."
            }
            None => "Ask about the hardest challenge they overcame and how they solved it.",
        };

        let prompt = format!(
            "Conversation so far:\n{}\n\nSignals gathered: {}\n\n{} Keep it under {} words and keep the tone encouraging.",
            clip_tail(&render_transcript(transcript), self.max_prompt_chars),
            ContextSignalExtractor::summarize(signals),
            focus,
            self.word_limit,
        );

        GenerationRequest::new(prompt)
            .with_system(SYSTEM_PROMPT)
            .with_constraints(self.constraints.clone())
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub(crate) fn render_transcript(transcript: &Transcript) -> String {
    transcript
        .iter()
        .map(|turn| {
            let who = match turn.speaker {
                Speaker::Interviewer => "Interviewer",
                Speaker::Respondent => "Candidate",
            };
            format!("{}: {}", who, turn.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep the last `max_chars` characters of `text`, marking the cut.
pub(crate) fn clip_tail(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let tail: String = text.chars().skip(total - max_chars).collect();
    format!("...{}", tail)
}

/// Trim whitespace and wrapping quotes, then cap at `word_limit` words.
fn normalize_question(raw: &str, word_limit: usize) -> String {
    let trimmed = raw
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\u{201c}' || c == '\u{201d}')
        .trim();
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.len() <= word_limit {
        words.join(" ")
    } else {
        words[..word_limit].join(" ")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::ConversationTurn;
    use parley_generation::{FailingGenerationService, MockGenerationService};

    fn config() -> GenerationConfig {
        GenerationConfig::default()
    }

    fn transcript_with(answer: &str) -> Transcript {
        let mut t = Transcript::new();
        t.push(ConversationTurn::interviewer("Tell me about a project."));
        t.push(ConversationTurn::respondent(answer));
        t
    }

    fn failing_composer() -> FollowUpComposer {
        FollowUpComposer::new(Arc::new(FailingGenerationService::new()), &config())
    }

    // ---- Fallback routing ----

    #[test]
    fn test_fallback_react() {
        assert_eq!(
            FollowUpComposer::compose_fallback("I built a react dashboard"),
            FRONTEND_FOLLOW_UP
        );
    }

    #[test]
    fn test_fallback_backend() {
        assert_eq!(
            FollowUpComposer::compose_fallback("I wrote the billing API"),
            BACKEND_FOLLOW_UP
        );
    }

    #[test]
    fn test_fallback_data_store() {
        assert_eq!(
            FollowUpComposer::compose_fallback("I migrated our Postgres database"),
            DATA_FOLLOW_UP
        );
    }

    #[test]
    fn test_fallback_team() {
        assert_eq!(
            FollowUpComposer::compose_fallback("I was on a team of 5"),
            TEAM_FOLLOW_UP
        );
    }

    #[test]
    fn test_fallback_improvement() {
        assert_eq!(
            FollowUpComposer::compose_fallback("I made the build much faster"),
            IMPACT_FOLLOW_UP
        );
    }

    #[test]
    fn test_fallback_generic() {
        assert_eq!(
            FollowUpComposer::compose_fallback("I organized the offsite"),
            GENERIC_FOLLOW_UP
        );
        assert_eq!(FollowUpComposer::compose_fallback(""), GENERIC_FOLLOW_UP);
    }

    #[test]
    fn test_fallback_priority_frontend_over_team() {
        assert_eq!(
            FollowUpComposer::compose_fallback("my team shipped a React app"),
            FRONTEND_FOLLOW_UP
        );
    }

    // ---- Compose with failing service ----

    #[tokio::test]
    async fn test_compose_falls_back_deterministically() {
        let composer = failing_composer();
        let t = transcript_with("I built a react dashboard for 3 users");
        let s = ContextSignalExtractor::new().extract(&t);

        let first = composer.compose(&t, &s).await;
        let second = composer.compose(&t, &s).await;
        assert_eq!(first.source, FollowUpSource::Fallback);
        assert_eq!(first.text, FRONTEND_FOLLOW_UP);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_compose_team_of_five_fallback() {
        let composer = failing_composer();
        let t = transcript_with("team of 5");
        let s = ContextSignalExtractor::new().extract(&t);
        assert_eq!(composer.compose(&t, &s).await.text, TEAM_FOLLOW_UP);
    }

    #[tokio::test]
    async fn test_offline_composer_uses_fallback() {
        let composer = FollowUpComposer::offline(&config());
        assert!(composer.is_offline());
        let t = transcript_with("I tuned SQL queries");
        let s = ContextSignalExtractor::new().extract(&t);
        let out = composer.compose(&t, &s).await;
        assert_eq!(out.source, FollowUpSource::Fallback);
        assert_eq!(out.text, DATA_FOLLOW_UP);
    }

    // ---- Primary tier ----

    #[tokio::test]
    async fn test_compose_uses_generated_text() {
        let svc = Arc::new(MockGenerationService::always(
            "  \"How many users used the dashboard each week?\"  ",
        ));
        let composer = FollowUpComposer::new(svc.clone(), &config());
        let t = transcript_with("I built a react dashboard");
        let s = ContextSignalExtractor::new().extract(&t);

        let out = composer.compose(&t, &s).await;
        assert_eq!(out.source, FollowUpSource::Generated);
        assert_eq!(out.text, "How many users used the dashboard each week?");
        assert_eq!(svc.call_count(), 1);
    }

    #[tokio::test]
    async fn test_short_generated_text_is_rejected() {
        let svc = Arc::new(MockGenerationService::always("Why?"));
        let composer = FollowUpComposer::new(svc, &config());
        let t = transcript_with("I built a react dashboard");
        let s = ContextSignalExtractor::new().extract(&t);

        let err = composer.compose_generated(&t, &s).await.unwrap_err();
        assert_eq!(err, GenerationError::LowConfidence { len: 4 });
        let out = composer.compose(&t, &s).await;
        assert_eq!(out.source, FollowUpSource::Fallback);
    }

    #[tokio::test]
    async fn test_blank_generated_text_is_rejected() {
        let svc = Arc::new(MockGenerationService::always("   \n  "));
        let composer = FollowUpComposer::new(svc, &config());
        let t = transcript_with("anything");
        let s = ContextSignalExtractor::new().extract(&t);
        assert_eq!(
            composer.compose_generated(&t, &s).await.unwrap_err(),
            GenerationError::Empty
        );
    }

    #[tokio::test]
    async fn test_slow_generation_times_out() {
        let svc = Arc::new(
            MockGenerationService::always("How big was the team on this project?")
                .with_delay(Duration::from_millis(300)),
        );
        let cfg = GenerationConfig {
            timeout_ms: 20,
            ..config()
        };
        let composer = FollowUpComposer::new(svc, &cfg);
        let t = transcript_with("I wrote the API");
        let s = ContextSignalExtractor::new().extract(&t);

        let err = composer.compose_generated(&t, &s).await.unwrap_err();
        assert_eq!(err, GenerationError::Timeout(Duration::from_millis(20)));
        let out = composer.compose(&t, &s).await;
        assert_eq!(out.source, FollowUpSource::Fallback);
        assert_eq!(out.text, BACKEND_FOLLOW_UP);
    }

    #[tokio::test]
    async fn test_generated_text_clipped_to_word_limit() {
        let long = vec!["word"; 80].join(" ");
        let svc = Arc::new(MockGenerationService::always(long));
        let composer = FollowUpComposer::new(svc, &config());
        let t = transcript_with("anything");
        let s = ContextSignalExtractor::new().extract(&t);
        let text = composer.compose_generated(&t, &s).await.unwrap();
        assert_eq!(text.split_whitespace().count(), 50);
    }

    // ---- Prompt construction ----

    #[test]
    fn test_prompt_targets_metrics_first() {
        let composer = failing_composer();
        let t = transcript_with("I built a react dashboard");
        let s = ContextSignalExtractor::new().extract(&t);
        let req = composer.build_request(&t, &s);
        assert!(req.prompt.contains("concrete number"));
        assert!(req.prompt.contains("Candidate: I built a react dashboard"));
        assert!(req.prompt.contains("metrics: no"));
        assert!(req.system.is_some());
    }

    #[test]
    fn test_prompt_targets_team_once_metric_known() {
        let composer = failing_composer();
        let t = transcript_with("react, improved load time 40%");
        let s = ContextSignalExtractor::new().extract(&t);
        let req = composer.build_request(&t, &s);
        assert!(req.prompt.contains("how big the team was"));
    }

    #[test]
    fn test_prompt_clips_oversized_transcript() {
        let composer = failing_composer();
        let t = transcript_with(&"x".repeat(10_000));
        let s = ContextSignalExtractor::new().extract(&t);
        let req = composer.build_request(&t, &s);
        assert!(req.prompt.chars().count() < 7_000);
        assert!(req.prompt.contains("..."));
    }

    // ---- Helpers ----

    #[test]
    fn test_clip_tail_keeps_end() {
        assert_eq!(clip_tail("abcdef", 10), "abcdef");
        assert_eq!(clip_tail("abcdef", 3), "...def");
        assert_eq!(clip_tail("h\u{e9}llo w\u{f6}rld", 5), "...w\u{f6}rld");
    }

    #[test]
    fn test_normalize_question() {
        assert_eq!(normalize_question("  \"Hi there?\" ", 50), "Hi there?");
        assert_eq!(normalize_question("a  b\n c", 50), "a b c");
        assert_eq!(normalize_question("one two three", 2), "one two");
    }
}
