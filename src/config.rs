//! Configuration management for the skill matcher

use crate::error::{Result, SkillMatchError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub matching: MatchingConfig,
    pub data: DataConfig,
    pub output: OutputConfig,
}

/// Parameters of the offline preparation pass (catalog, mentions, profiles).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub min_frequency: usize,
    pub max_skills: usize,
    pub top_k: usize,
    pub min_similarity: f32,
    /// Jobs scored per chunk. Affects memory only, never the output.
    pub batch_size: usize,
    pub ngram_range: NgramRange,
    pub catalog_source: CatalogSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct NgramRange {
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    /// Unigrams and bigrams mined from the job corpus
    JobText,
    /// Labels from the taxonomy skill table
    Taxonomy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub skill_gap_limit: usize,
    pub default_top_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub jobs_path: PathBuf,
    pub taxonomy_path: Option<PathBuf>,
    pub artifacts_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
}

impl NgramRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl Default for NgramRange {
    fn default() -> Self {
        Self::new(1, 2)
    }
}

impl From<[usize; 2]> for NgramRange {
    fn from(value: [usize; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<NgramRange> for [usize; 2] {
    fn from(value: NgramRange) -> Self {
        [value.min, value.max]
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_frequency: 3,
            max_skills: 3000,
            top_k: 15,
            min_similarity: 0.08,
            batch_size: 256,
            ngram_range: NgramRange::default(),
            catalog_source: CatalogSource::JobText,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            skill_gap_limit: 12,
            default_top_n: 10,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            jobs_path: PathBuf::from("data/raw/jobs.csv"),
            taxonomy_path: Some(PathBuf::from("data/raw/taxonomy_skills.csv")),
            artifacts_dir: PathBuf::from("data/processed"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
        }
    }
}

impl Config {
    /// Load from an explicit path, else the user config file, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(SkillMatchError::Configuration(format!(
                        "Config file does not exist: {}",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => Self::config_path(),
        };

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SkillMatchError::Configuration(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            SkillMatchError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("skill-matcher")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.pipeline;
        if p.top_k == 0 {
            return Err(SkillMatchError::Configuration(
                "pipeline.top_k must be at least 1".to_string(),
            ));
        }
        if p.batch_size == 0 {
            return Err(SkillMatchError::Configuration(
                "pipeline.batch_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&p.min_similarity) {
            return Err(SkillMatchError::Configuration(format!(
                "pipeline.min_similarity must be within [0, 1], got {}",
                p.min_similarity
            )));
        }
        if p.ngram_range.min == 0 || p.ngram_range.min > p.ngram_range.max {
            return Err(SkillMatchError::Configuration(format!(
                "pipeline.ngram_range is invalid: [{}, {}]",
                p.ngram_range.min, p.ngram_range.max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.pipeline.min_frequency, 3);
        assert_eq!(config.pipeline.max_skills, 3000);
        assert_eq!(config.pipeline.top_k, 15);
        assert!((config.pipeline.min_similarity - 0.08).abs() < f32::EPSILON);
        assert_eq!(config.pipeline.batch_size, 256);
        assert_eq!(config.pipeline.ngram_range, NgramRange::new(1, 2));
        assert_eq!(config.matching.skill_gap_limit, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [pipeline]
            top_k = 5
            ngram_range = [1, 1]
            catalog_source = "taxonomy"
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.top_k, 5);
        assert_eq!(config.pipeline.ngram_range, NgramRange::new(1, 1));
        assert_eq!(config.pipeline.catalog_source, CatalogSource::Taxonomy);
        assert_eq!(config.pipeline.max_skills, 3000);
        assert_eq!(config.matching.default_top_n, 10);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.pipeline.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipeline.min_similarity = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipeline.ngram_range = NgramRange::new(2, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.matching.default_top_n = 7;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.matching.default_top_n, 7);
    }
}
