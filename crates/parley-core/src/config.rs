use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParleyError, Result};

/// Top-level configuration for Parley.
///
/// Loaded from `~/.parley/config.toml` by default. Every section is optional;
/// missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub bullets: BulletConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ParleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Per-session limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Total wall-clock budget for one interview, in seconds.
    pub budget_secs: u64,
    /// Responses longer than this are still accepted but logged.
    pub max_response_chars: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            budget_secs: 900,
            max_response_chars: 10_000,
        }
    }
}

/// Thresholds for deciding when an interview ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Finalize once less than this many seconds of budget remain.
    pub time_reserve_secs: u64,
    /// Hard cap on respondent turns.
    pub turn_cap: usize,
    /// Respondent turns required before a rich answer may end the interview.
    pub quality_min_turns: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            time_reserve_secs: 180,
            turn_cap: 10,
            quality_min_turns: 6,
        }
    }
}

/// Generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// When false, follow-ups always use the rule-based composer.
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Ceiling for a single generation call, in milliseconds.
    pub timeout_ms: u64,
    /// Maximum tokens requested per completion.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Word limit for a generated follow-up question.
    pub follow_up_word_limit: usize,
    /// Generated text shorter than this is treated as a failure.
    pub min_response_chars: usize,
    /// Transcript text included in a prompt is clipped to this many characters.
    pub max_prompt_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_ms: 4_000,
            max_tokens: 150,
            temperature: 0.7,
            follow_up_word_limit: 50,
            min_response_chars: 10,
            max_prompt_chars: 6_000,
        }
    }
}

/// Bullet drafting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletConfig {
    /// Maximum number of bullets drafted from a finished interview.
    pub max_bullets: usize,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self { max_bullets: 5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = ParleyConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.session.budget_secs, 900);
        assert_eq!(config.session.max_response_chars, 10_000);
        assert_eq!(config.policy.time_reserve_secs, 180);
        assert_eq!(config.policy.turn_cap, 10);
        assert_eq!(config.policy.quality_min_turns, 6);
        assert!(config.generation.enabled);
        assert_eq!(config.generation.timeout_ms, 4_000);
        assert_eq!(config.generation.follow_up_word_limit, 50);
        assert_eq!(config.generation.min_response_chars, 10);
        assert_eq!(config.bullets.max_bullets, 5);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[session]
budget_secs = 600

[policy]
time_reserve_secs = 120
turn_cap = 8
quality_min_turns = 4

[generation]
enabled = false
base_url = "http://localhost:11434/v1"
model = "llama3"
timeout_ms = 2500
"#;
        let file = create_temp_config(content);
        let config = ParleyConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.session.budget_secs, 600);
        assert_eq!(config.policy.time_reserve_secs, 120);
        assert_eq!(config.policy.turn_cap, 8);
        assert_eq!(config.policy.quality_min_turns, 4);
        assert!(!config.generation.enabled);
        assert_eq!(config.generation.base_url, "http://localhost:11434/v1");
        assert_eq!(config.generation.model, "llama3");
        assert_eq!(config.generation.timeout_ms, 2500);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[policy]
turn_cap = 12
"#;
        let file = create_temp_config(content);
        let config = ParleyConfig::load(file.path()).unwrap();
        assert_eq!(config.policy.turn_cap, 12);
        // Remaining fields use defaults
        assert_eq!(config.policy.time_reserve_secs, 180);
        assert_eq!(config.policy.quality_min_turns, 6);
        assert_eq!(config.session.budget_secs, 900);
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let file = create_temp_config("[policy\nturn_cap = ");
        let err = ParleyConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ParleyError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = ParleyConfig::load(Path::new("/nonexistent/parley.toml")).unwrap_err();
        assert!(matches!(err, ParleyError::Io(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ParleyConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.session.budget_secs, 900);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ParleyConfig::default();
        config.policy.turn_cap = 7;
        config.generation.model = "custom-model".to_string();
        config.save(&path).unwrap();

        let reloaded = ParleyConfig::load(&path).unwrap();
        assert_eq!(reloaded.policy, config.policy);
        assert_eq!(reloaded.generation.model, "custom-model");
    }
}
