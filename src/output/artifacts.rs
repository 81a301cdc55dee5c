//! Tabular artifacts persisted by the preparation pass
//!
//! Column sets are fixed; readers and writers below are the only place
//! they are spelled out.

use crate::config::{CatalogSource, NgramRange, PipelineConfig};
use crate::error::Result;
use crate::processing::catalog::{CatalogEntry, SkillCatalog};
use crate::processing::mentions::{Provenance, SkillMention};
use crate::processing::profiles::{SkillProfile, SkillProfiles};
use crate::processing::requirements::RequirementsProfile;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MENTIONS_FILE: &str = "skill_mentions.csv";
pub const PROFILES_FILE: &str = "skill_profiles.csv";
pub const REQUIREMENTS_FILE: &str = "requirements_profile.csv";
pub const CATALOG_FILE: &str = "skill_catalog.csv";
pub const MANIFEST_FILE: &str = "prepare_manifest.json";

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mentions(&self) -> PathBuf {
        self.dir.join(MENTIONS_FILE)
    }

    pub fn profiles(&self) -> PathBuf {
        self.dir.join(PROFILES_FILE)
    }

    pub fn requirements(&self) -> PathBuf {
        self.dir.join(REQUIREMENTS_FILE)
    }

    pub fn catalog(&self) -> PathBuf {
        self.dir.join(CATALOG_FILE)
    }

    pub fn manifest(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// True when both matching artifacts and their manifest are on disk
    pub fn has_matching_artifacts(&self) -> bool {
        self.mentions().exists() && self.profiles().exists() && self.manifest().exists()
    }
}

/// The parameters and inputs an artifact set was produced from.
///
/// `batch_size` is left out since it never changes the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub min_frequency: usize,
    pub max_skills: usize,
    pub top_k: usize,
    pub min_similarity: f32,
    pub ngram_range: NgramRange,
    pub catalog_source: CatalogSource,
    /// SHA-256 over the job table and taxonomy rows
    pub inputs_fingerprint: String,
}

impl ArtifactManifest {
    pub fn new(pipeline: &PipelineConfig, inputs_fingerprint: impl Into<String>) -> Self {
        Self {
            min_frequency: pipeline.min_frequency,
            max_skills: pipeline.max_skills,
            top_k: pipeline.top_k,
            min_similarity: pipeline.min_similarity,
            ngram_range: pipeline.ngram_range,
            catalog_source: pipeline.catalog_source,
            inputs_fingerprint: inputs_fingerprint.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MentionRow {
    job_id: String,
    skill_term: String,
    relevance_score: f32,
    #[serde(default = "default_mention_provenance")]
    provenance: Provenance,
}

fn default_mention_provenance() -> Provenance {
    Provenance::Extracted
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileRow {
    job_id: String,
    skill_text: String,
    #[serde(default = "default_profile_provenance")]
    provenance: Provenance,
}

fn default_profile_provenance() -> Provenance {
    Provenance::None
}

#[derive(Debug, Serialize)]
struct RequirementsRow<'a> {
    job_id: &'a str,
    education_display: &'a str,
    education_source: String,
    experience_display: &'a str,
    experience_source: String,
}

pub fn write_mentions(path: &Path, mentions: &[SkillMention]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for m in mentions {
        writer.serialize(MentionRow {
            job_id: m.job_id.clone(),
            skill_term: m.skill_term.clone(),
            relevance_score: m.relevance_score,
            provenance: m.provenance,
        })?;
    }
    if mentions.is_empty() {
        writer.write_record(["job_id", "skill_term", "relevance_score", "provenance"])?;
    }
    writer.flush()?;
    info!("Wrote {} mentions to {}", mentions.len(), path.display());
    Ok(())
}

pub fn read_mentions(path: &Path) -> Result<Vec<SkillMention>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut mentions = Vec::new();
    for row in reader.deserialize::<MentionRow>() {
        let row = row?;
        mentions.push(SkillMention {
            job_id: row.job_id,
            skill_term: row.skill_term,
            relevance_score: row.relevance_score,
            provenance: row.provenance,
        });
    }
    Ok(mentions)
}

pub fn write_profiles(path: &Path, profiles: &SkillProfiles) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for p in profiles.iter() {
        writer.serialize(ProfileRow {
            job_id: p.job_id.clone(),
            skill_text: p.skill_text.clone(),
            provenance: p.provenance,
        })?;
    }
    if profiles.is_empty() {
        writer.write_record(["job_id", "skill_text", "provenance"])?;
    }
    writer.flush()?;
    info!("Wrote {} skill profiles to {}", profiles.len(), path.display());
    Ok(())
}

pub fn read_profiles(path: &Path) -> Result<SkillProfiles> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut profiles = SkillProfiles::default();
    for row in reader.deserialize::<ProfileRow>() {
        let row = row?;
        profiles.insert(SkillProfile {
            job_id: row.job_id,
            skill_text: row.skill_text,
            provenance: row.provenance,
        });
    }
    Ok(profiles)
}

pub fn write_catalog(path: &Path, catalog: &SkillCatalog) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for entry in catalog.entries() {
        writer.serialize(entry)?;
    }
    if catalog.is_empty() {
        writer.write_record(["term", "document_count", "document_frequency"])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_catalog(path: &Path) -> Result<SkillCatalog> {
    let mut reader = csv::Reader::from_path(path)?;
    let entries = reader
        .deserialize::<CatalogEntry>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(SkillCatalog::from_entries(entries))
}

pub fn write_requirements(path: &Path, requirements: &[RequirementsProfile]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for r in requirements {
        writer.serialize(RequirementsRow {
            job_id: &r.job_id,
            education_display: &r.education.label,
            education_source: r.education.source.to_string(),
            experience_display: &r.experience.label,
            experience_source: r.experience.source.to_string(),
        })?;
    }
    if requirements.is_empty() {
        writer.write_record([
            "job_id",
            "education_display",
            "education_source",
            "experience_display",
            "experience_source",
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_manifest(path: &Path, manifest: &ArtifactManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// The stored manifest, or `None` when it is absent or unreadable
pub fn read_manifest(path: &Path) -> Result<Option<ArtifactManifest>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str(&content) {
        Ok(manifest) => Ok(Some(manifest)),
        Err(e) => {
            warn!("Ignoring unreadable manifest {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_columns_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        let mentions = vec![
            SkillMention {
                job_id: "1".to_string(),
                skill_term: "data analysis".to_string(),
                relevance_score: 0.5,
                provenance: Provenance::Extracted,
            },
            SkillMention {
                job_id: "2".to_string(),
                skill_term: "customer service".to_string(),
                relevance_score: 0.25,
                provenance: Provenance::FallbackCorrelation,
            },
        ];

        write_mentions(&paths.mentions(), &mentions).unwrap();
        let text = std::fs::read_to_string(paths.mentions()).unwrap();
        assert!(text.starts_with("job_id,skill_term,relevance_score,provenance\n"));
        assert!(text.contains("fallback_correlation"));

        assert_eq!(read_mentions(&paths.mentions()).unwrap(), mentions);
    }

    #[test]
    fn test_profiles_keep_empty_rows_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROFILES_FILE);
        let profiles: SkillProfiles = vec![
            SkillProfile {
                job_id: "b".to_string(),
                skill_text: "python sql".to_string(),
                provenance: Provenance::Extracted,
            },
            SkillProfile {
                job_id: "a".to_string(),
                skill_text: String::new(),
                provenance: Provenance::None,
            },
        ]
        .into_iter()
        .collect();

        write_profiles(&path, &profiles).unwrap();
        let loaded = read_profiles(&path).unwrap();
        assert_eq!(loaded, profiles);
    }

    #[test]
    fn test_catalog_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CATALOG_FILE);
        let catalog = SkillCatalog::from_entries(vec![CatalogEntry {
            term: "data analysis".to_string(),
            document_count: 100,
            document_frequency: 1.0,
        }]);

        write_catalog(&path, &catalog).unwrap();
        assert_eq!(read_catalog(&path).unwrap(), catalog);
    }

    #[test]
    fn test_manifest_reload_and_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        let manifest = ArtifactManifest::new(&PipelineConfig::default(), "abc123");

        assert_eq!(read_manifest(&paths.manifest()).unwrap(), None);
        write_manifest(&paths.manifest(), &manifest).unwrap();
        assert_eq!(read_manifest(&paths.manifest()).unwrap(), Some(manifest.clone()));

        let narrower = PipelineConfig {
            top_k: 1,
            ..PipelineConfig::default()
        };
        assert_ne!(ArtifactManifest::new(&narrower, "abc123"), manifest);

        let batched = PipelineConfig {
            batch_size: 1,
            ..PipelineConfig::default()
        };
        assert_eq!(ArtifactManifest::new(&batched, "abc123"), manifest);
    }

    #[test]
    fn test_corrupt_manifest_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(read_manifest(&path).unwrap(), None);
    }

    #[test]
    fn test_legacy_mentions_without_provenance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MENTIONS_FILE);
        std::fs::write(&path, "job_id,skill_term,relevance_score\n1,sql,0.3\n").unwrap();

        let mentions = read_mentions(&path).unwrap();
        assert_eq!(mentions[0].provenance, Provenance::Extracted);
    }

    #[test]
    fn test_empty_tables_still_have_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MENTIONS_FILE);
        write_mentions(&path, &[]).unwrap();

        assert!(read_mentions(&path).unwrap().is_empty());
    }
}
