use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Turns
// =============================================================================

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The system asking questions.
    Interviewer,
    /// The user answering them.
    Respondent,
}

/// One message in the dialogue. Immutable once appended to a [`Transcript`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub produced_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn interviewer(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Interviewer,
            text: text.into(),
            produced_at: Utc::now(),
        }
    }

    pub fn respondent(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Respondent,
            text: text.into(),
            produced_at: Utc::now(),
        }
    }

    pub fn is_respondent(&self) -> bool {
        self.speaker == Speaker::Respondent
    }
}

/// Append-only, ordered sequence of turns.
///
/// There is no way to edit or remove a turn once pushed; insertion order is
/// conversational order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConversationTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// Respondent-authored turns, in order.
    pub fn respondent_turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter().filter(|t| t.is_respondent())
    }

    /// The most recent respondent turn, if any.
    pub fn last_respondent(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.is_respondent())
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ConversationTurn;
    type IntoIter = std::slice::Iter<'a, ConversationTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

// =============================================================================
// Signals
// =============================================================================

/// Features derived from respondent text, used to gauge whether enough
/// information has been gathered.
///
/// Always recomputed from a whole transcript; never patched in place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSet {
    pub mentions_technology: bool,
    pub mentions_metric: bool,
    pub mentions_team: bool,
    pub mentions_timeframe: bool,
    pub mentions_business_impact: bool,
    pub respondent_turn_count: usize,
}

/// The signal a follow-up question should try to draw out next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalFocus {
    Metric,
    Team,
    Technology,
    BusinessImpact,
}

impl SignalSet {
    /// First unset signal in priority order: metric, team, technology,
    /// business impact.
    pub fn missing_focus(&self) -> Option<SignalFocus> {
        if !self.mentions_metric {
            Some(SignalFocus::Metric)
        } else if !self.mentions_team {
            Some(SignalFocus::Team)
        } else if !self.mentions_technology {
            Some(SignalFocus::Technology)
        } else if !self.mentions_business_impact {
            Some(SignalFocus::BusinessImpact)
        } else {
            None
        }
    }
}

// =============================================================================
// Termination
// =============================================================================

/// Why an interview ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Too little of the time budget remains.
    TimeExceeded,
    /// The respondent turn cap was reached.
    TurnCapReached,
    /// The respondent already gave enough detail.
    QualitySufficient,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TerminationReason::TimeExceeded => "time_exceeded",
            TerminationReason::TurnCapReached => "turn_cap_reached",
            TerminationReason::QualitySufficient => "quality_sufficient",
        };
        f.write_str(s)
    }
}

/// Outcome of one termination check. Produced fresh on every evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum TerminationDecision {
    Continue,
    Finalize(TerminationReason),
}

// =============================================================================
// Tests
// =============================================================================
