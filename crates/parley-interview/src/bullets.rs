//! Resume bullet drafting from a finished interview.
//!
//! The generation service is asked for bullets first. If it is unavailable,
//! slow, or returns nothing parseable, bullets are extracted from the
//! respondent's own sentences instead.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parley_core::config::{BulletConfig, GenerationConfig};
use parley_generation::{
    DynGenerationService, GenerationConstraints, GenerationError, GenerationRequest,
};

use crate::composer::clip_tail;
use crate::signals::ContextSignalExtractor;
use crate::types::FinalizeResult;

const BULLET_SYSTEM_PROMPT: &str = "You write concise, achievement-focused resume bullets. Start each bullet with a strong action verb and keep any numbers the candidate gave. Output one bullet per line, nothing else.";

/// Sentences this short carry too little to stand as a bullet.
const MIN_SENTENCE_CHARS: usize = 10;

pub struct BulletDrafter {
    service: Option<Arc<dyn DynGenerationService>>,
    timeout: Duration,
    constraints: GenerationConstraints,
    max_bullets: usize,
    max_prompt_chars: usize,
}

impl BulletDrafter {
    pub fn new(
        service: Arc<dyn DynGenerationService>,
        generation: &GenerationConfig,
        bullets: &BulletConfig,
    ) -> Self {
        Self {
            service: Some(service),
            ..Self::offline(generation, bullets)
        }
    }

    pub fn offline(generation: &GenerationConfig, bullets: &BulletConfig) -> Self {
        Self {
            service: None,
            timeout: Duration::from_millis(generation.timeout_ms),
            constraints: GenerationConstraints {
                // Several bullets need more room than a single question
                max_tokens: generation.max_tokens.saturating_mul(2),
                temperature: generation.temperature,
            },
            max_bullets: bullets.max_bullets,
            max_prompt_chars: generation.max_prompt_chars,
        }
    }

    /// Draft up to `max_bullets` bullets from the respondent's answers.
    ///
    /// Returns an empty list only when the respondent never said anything.
    pub async fn draft(&self, result: &FinalizeResult) -> Vec<String> {
        let answers: Vec<&str> = result
            .transcript
            .respondent_turns()
            .map(|t| t.text.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if answers.is_empty() {
            return Vec::new();
        }

        match self.draft_generated(&answers).await {
            Ok(bullets) => bullets,
            Err(e) => {
                if self.service.is_some() {
                    tracing::warn!(
                        session_id = %result.session_id,
                        error = %e,
                        retryable = e.is_retryable(),
                        "Bullet generation failed, extracting from answers"
                    );
                }
                extract_bullets(&answers, self.max_bullets)
            }
        }
    }

    async fn draft_generated(&self, answers: &[&str]) -> Result<Vec<String>, GenerationError> {
        let Some(service) = &self.service else {
            return Err(GenerationError::Unavailable("offline".to_string()));
        };

        let prompt = format!(
            "Here is what the candidate said about their work:\n{}\n\nWrite at most {} resume bullets.",
            clip_tail(&answers.join("\n"), self.max_prompt_chars),
            self.max_bullets,
        );
        let request = GenerationRequest::new(prompt)
            .with_system(BULLET_SYSTEM_PROMPT)
            .with_constraints(self.constraints.clone());

        let raw = tokio::time::timeout(self.timeout, service.generate_boxed(&request))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))??;

        let bullets = parse_bullets(&raw, self.max_bullets);
        if bullets.is_empty() {
            return Err(GenerationError::Malformed("no bullets in reply".to_string()));
        }
        Ok(bullets)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// One bullet per non-empty line, list markers stripped. Lines ending in a
/// colon are treated as headings and skipped.
fn parse_bullets(raw: &str, max: usize) -> Vec<String> {
    raw.lines()
        .map(strip_marker)
        .filter(|l| !l.is_empty() && !l.ends_with(':'))
        .take(max)
        .map(str::to_string)
        .collect()
}

fn strip_marker(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line
        .strip_prefix('-')
        .or_else(|| line.strip_prefix('*'))
        .or_else(|| line.strip_prefix('\u{2022}'))
    {
        return rest.trim();
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim();
        }
    }
    line
}

// =============================================================================
// Extractive fallback
// =============================================================================

fn extract_bullets(answers: &[&str], max: usize) -> Vec<String> {
    let extractor = ContextSignalExtractor::new();
    let mut seen = HashSet::new();

    let mut scored: Vec<(bool, f64, &str)> = answers
        .iter()
        .flat_map(|a| split_sentences(a))
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(|s| {
            let signals = extractor.scan(s);
            let bearing = signals.mentions_technology
                || signals.mentions_metric
                || signals.mentions_business_impact;
            (bearing, sentence_score(s), s)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then(b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut bullets: Vec<String> = scored
        .into_iter()
        .take(max)
        .map(|(_, _, s)| capitalize(s))
        .collect();

    if bullets.is_empty() {
        // Only short answers; keep the longest one rather than nothing
        if let Some(longest) = answers.iter().max_by_key(|a| a.chars().count()) {
            bullets.push(capitalize(longest));
        }
    }
    bullets
}

/// Unique words times the square root of total words.
fn sentence_score(sentence: &str) -> f64 {
    let words: Vec<String> = sentence
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    let unique: HashSet<&str> = words.iter().map(String::as_str).collect();
    unique.len() as f64 * (words.len() as f64).sqrt()
}

/// Split on `.` `!` `?` followed by whitespace or end of text.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_break = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_break {
                let sentence = text[start..=i].trim();
                if !sentence.is_empty() {
                    result.push(sentence);
                }
                start = i + c.len_utf8();
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        result.push(tail);
    }
    result
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}
