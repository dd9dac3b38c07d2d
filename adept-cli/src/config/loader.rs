use std::path::{Path, PathBuf};

use anyhow::Result;

use super::types::{
    AdeptConfig, GeneratorSection, InterviewSection, RawAdeptConfig, RawGeneratorSection,
    RawInterviewSection, RawStorageSection, StorageSection,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<AdeptConfig> {
        let mut raw = RawAdeptConfig::default();

        // Layer 1: User config
        let user_path = Self::user_config_path();
        if user_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    pub fn user_config_path() -> PathBuf {
        adept_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with ADEPT_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("ADEPT_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".adept/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<RawAdeptConfig> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawAdeptConfig, overlay: RawAdeptConfig) -> RawAdeptConfig {
        RawAdeptConfig {
            interview: RawInterviewSection {
                topic: overlay.interview.topic.or(base.interview.topic),
                difficulty: overlay.interview.difficulty.or(base.interview.difficulty),
                total_questions: overlay
                    .interview
                    .total_questions
                    .or(base.interview.total_questions),
                adaptive_feedback: overlay
                    .interview
                    .adaptive_feedback
                    .or(base.interview.adaptive_feedback),
                bank: overlay.interview.bank.or(base.interview.bank),
            },
            generator: RawGeneratorSection {
                provider: overlay.generator.provider.or(base.generator.provider),
                base_url: overlay.generator.base_url.or(base.generator.base_url),
                model: overlay.generator.model.or(base.generator.model),
                temperature: overlay.generator.temperature.or(base.generator.temperature),
                max_tokens: overlay.generator.max_tokens.or(base.generator.max_tokens),
                timeout_secs: overlay.generator.timeout_secs.or(base.generator.timeout_secs),
            },
            storage: RawStorageSection {
                sessions_dir: overlay.storage.sessions_dir.or(base.storage.sessions_dir),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawAdeptConfig) -> AdeptConfig {
        let interview = InterviewSection::default();
        let generator = GeneratorSection::default();
        let storage = StorageSection::default();

        AdeptConfig {
            interview: InterviewSection {
                topic: raw.interview.topic.unwrap_or(interview.topic),
                difficulty: raw.interview.difficulty.unwrap_or(interview.difficulty),
                total_questions: raw
                    .interview
                    .total_questions
                    .unwrap_or(interview.total_questions),
                adaptive_feedback: raw
                    .interview
                    .adaptive_feedback
                    .unwrap_or(interview.adaptive_feedback),
                bank: raw.interview.bank,
            },
            generator: GeneratorSection {
                provider: raw.generator.provider.unwrap_or(generator.provider),
                base_url: raw.generator.base_url,
                model: raw.generator.model.unwrap_or(generator.model),
                temperature: raw.generator.temperature.unwrap_or(generator.temperature),
                max_tokens: raw.generator.max_tokens.unwrap_or(generator.max_tokens),
                timeout_secs: raw.generator.timeout_secs.unwrap_or(generator.timeout_secs),
            },
            storage: StorageSection {
                sessions_dir: raw.storage.sessions_dir.unwrap_or(storage.sessions_dir),
            },
        }
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<AdeptConfig> {
        if path.exists() {
            Ok(Self::finalize(Self::read_raw(path)?))
        } else {
            Ok(AdeptConfig::default())
        }
    }
}
