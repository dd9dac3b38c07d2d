use std::path::PathBuf;

use adept_core::{Difficulty, InterviewConfig};
use adept_models::GeneratorConfig;
use serde::{Deserialize, Serialize};

/// Default provider name, also the credential store key.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAdeptConfig {
    #[serde(default)]
    pub interview: RawInterviewSection,

    #[serde(default)]
    pub generator: RawGeneratorSection,

    #[serde(default)]
    pub storage: RawStorageSection,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawInterviewSection {
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub total_questions: Option<u32>,
    pub adaptive_feedback: Option<bool>,
    pub bank: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawGeneratorSection {
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStorageSection {
    pub sessions_dir: Option<PathBuf>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdeptConfig {
    #[serde(default)]
    pub interview: InterviewSection,

    #[serde(default)]
    pub generator: GeneratorSection,

    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSection {
    /// Topic used when `--topic` is not given
    pub topic: String,

    pub difficulty: Difficulty,

    pub total_questions: u32,

    /// Ask the model for feedback after every answer
    pub adaptive_feedback: bool,

    /// Question bank used when `--bank` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<PathBuf>,
}

impl Default for InterviewSection {
    fn default() -> Self {
        let defaults = InterviewConfig::default();
        Self {
            topic: defaults.default_topic,
            difficulty: defaults.default_difficulty,
            total_questions: defaults.default_total_questions,
            adaptive_feedback: defaults.adaptive_feedback,
            bank: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSection {
    /// Credential store key for the API key
    pub provider: String,

    /// OpenAI-compatible endpoint; the public API when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    pub model: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Per-request budget in seconds
    pub timeout_secs: u64,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        let defaults = GeneratorConfig::default();
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            base_url: None,
            model: defaults.model,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            timeout_secs: InterviewConfig::default().generation_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Where sessions, evaluations and profiles are saved
    pub sessions_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            sessions_dir: adept_paths::sessions_dir(),
        }
    }
}

impl AdeptConfig {
    /// Engine settings derived from this file.
    pub fn interview_config(&self) -> InterviewConfig {
        InterviewConfig {
            default_topic: self.interview.topic.clone(),
            default_difficulty: self.interview.difficulty,
            default_total_questions: self.interview.total_questions,
            generation_timeout_secs: self.generator.timeout_secs,
            adaptive_feedback: self.interview.adaptive_feedback,
            ..Default::default()
        }
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            model: self.generator.model.clone(),
            temperature: self.generator.temperature,
            max_tokens: self.generator.max_tokens,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = AdeptConfig::default();
        assert_eq!(config.interview.topic, "Excel");
        assert_eq!(config.interview.total_questions, 5);
        assert_eq!(config.generator.provider, "openai");
        assert_eq!(config.generator.model, "gpt-3.5-turbo");
        assert_eq!(config.generator.timeout_secs, 30);
        assert!(config.storage.sessions_dir.ends_with("adept/sessions"));
    }

    #[test]
    fn test_interview_config_carries_file_values() {
        let mut config = AdeptConfig::default();
        config.interview.total_questions = 8;
        config.interview.adaptive_feedback = false;
        config.generator.timeout_secs = 10;

        let engine = config.interview_config();
        assert_eq!(engine.default_total_questions, 8);
        assert!(!engine.adaptive_feedback);
        assert_eq!(engine.generation_timeout_secs, 10);
        assert!(engine.require_generator);
    }

    #[test]
    fn test_generator_config_carries_file_values() {
        let mut config = AdeptConfig::default();
        config.generator.model = "llama3".to_string();
        config.generator.temperature = 0.2;

        let generator = config.generator_config();
        assert_eq!(generator.model, "llama3");
        assert_eq!(generator.temperature, 0.2);
        assert_eq!(generator.max_tokens, 1000);
    }

    #[test]
    fn test_raw_config_parses_partial_toml() {
        let raw: RawAdeptConfig = toml::from_str(
            r#"
            [interview]
            topic = "Pivot Tables"
            difficulty = "advanced"
            "#,
        )
        .unwrap();
        assert_eq!(raw.interview.topic.as_deref(), Some("Pivot Tables"));
        assert_eq!(raw.interview.difficulty, Some(Difficulty::Advanced));
        assert!(raw.generator.model.is_none());
    }
}
