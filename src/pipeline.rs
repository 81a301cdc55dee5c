//! Offline preparation: job table to catalog, mentions, profiles and
//! requirements, persisted under the artifacts directory.

use crate::config::{CatalogSource, Config, PipelineConfig};
use crate::error::Result;
use crate::input::loader::{load_jobs, load_taxonomy, TaxonomyTable};
use crate::input::schema::{self, JobRecord};
use crate::output::artifacts::{self, ArtifactManifest, ArtifactPaths};
use crate::processing::catalog::{build_catalog, build_catalog_from_taxonomy, build_job_corpus, SkillCatalog};
use crate::processing::mentions::{ExtractionParams, FallbackScores, MentionExtractor, Provenance, SkillMention};
use crate::processing::profiles::{aggregate, SkillProfiles};
use crate::processing::requirements::infer_requirements;
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PrepareOptions {
    pub jobs_path: PathBuf,
    pub taxonomy_path: Option<PathBuf>,
    pub artifacts_dir: PathBuf,
    /// Regenerate even when the cached artifacts match the inputs
    pub force: bool,
}

impl PrepareOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            jobs_path: config.data.jobs_path.clone(),
            taxonomy_path: config.data.taxonomy_path.clone(),
            artifacts_dir: config.data.artifacts_dir.clone(),
            force: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrepareSummary {
    pub jobs: usize,
    pub catalog_terms: usize,
    pub mentions: usize,
    pub profiles: usize,
    pub non_empty_profiles: usize,
    pub fallback_jobs: usize,
    pub artifacts_dir: PathBuf,
    pub reused_cache: bool,
}

/// Everything the match service needs, in job table order
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub jobs: Vec<JobRecord>,
    pub mentions: Vec<SkillMention>,
    pub profiles: SkillProfiles,
    pub summary: PrepareSummary,
}

/// Load cached artifacts when their manifest matches the current inputs and
/// parameters, else regenerate.
///
/// A missing job table fails before any artifact is touched.
pub fn prepare(options: &PrepareOptions, pipeline: &PipelineConfig) -> Result<PreparedData> {
    let table = load_jobs(&options.jobs_path)?;
    let job_ids = table.job_ids();
    let paths = ArtifactPaths::new(&options.artifacts_dir);

    let taxonomy = match &options.taxonomy_path {
        Some(path) => load_taxonomy(path)?,
        None => None,
    };
    let manifest = ArtifactManifest::new(pipeline, inputs_fingerprint(&table.jobs, taxonomy.as_ref()));

    if options.force {
        info!("Forced regeneration of artifacts in {}", paths.dir().display());
    } else if let Some((mentions, profiles)) = load_cached(&paths, &job_ids, &manifest)? {
        info!("Reusing cached artifacts from {}", paths.dir().display());
        let catalog_terms = if paths.catalog().exists() {
            artifacts::read_catalog(&paths.catalog())?.len()
        } else {
            0
        };
        let summary = summarize(&table.jobs, catalog_terms, &mentions, &profiles, &paths, true);
        return Ok(PreparedData {
            jobs: table.jobs,
            mentions,
            profiles,
            summary,
        });
    }

    let corpus = build_job_corpus(&table.jobs);
    let catalog = select_catalog(pipeline, &corpus, taxonomy.as_ref());

    let extractor = MentionExtractor::fit(&corpus, &catalog, ExtractionParams::from(pipeline));
    let fallback = taxonomy.as_ref().and_then(fallback_scores);
    let mentions = extractor.extract_all(&job_ids, &corpus, fallback.as_ref());
    let profiles = aggregate(&job_ids, &mentions);
    let requirements = infer_requirements(&table.jobs);

    paths.ensure_dir()?;
    artifacts::write_catalog(&paths.catalog(), &catalog)?;
    artifacts::write_mentions(&paths.mentions(), &mentions)?;
    artifacts::write_profiles(&paths.profiles(), &profiles)?;
    artifacts::write_requirements(&paths.requirements(), &requirements)?;
    // last, so an interrupted run never looks complete
    artifacts::write_manifest(&paths.manifest(), &manifest)?;

    let summary = summarize(&table.jobs, catalog.len(), &mentions, &profiles, &paths, false);
    Ok(PreparedData {
        jobs: table.jobs,
        mentions,
        profiles,
        summary,
    })
}

fn select_catalog(
    pipeline: &PipelineConfig,
    corpus: &[String],
    taxonomy: Option<&TaxonomyTable>,
) -> SkillCatalog {
    match (pipeline.catalog_source, taxonomy) {
        (CatalogSource::Taxonomy, Some(t)) => {
            build_catalog_from_taxonomy(&t.records, pipeline.min_frequency, pipeline.max_skills)
        }
        (CatalogSource::Taxonomy, None) => {
            warn!("catalog_source = taxonomy but no taxonomy table was found; using job text");
            build_catalog(corpus, pipeline.min_frequency, pipeline.max_skills)
        }
        (CatalogSource::JobText, _) => {
            build_catalog(corpus, pipeline.min_frequency, pipeline.max_skills)
        }
    }
}

/// Correlation fallback, only when the taxonomy carries a coefficient column
fn fallback_scores(taxonomy: &TaxonomyTable) -> Option<FallbackScores> {
    if !taxonomy.has_correlations() {
        warn!(
            "{} has no '{}' column; correlation fallback disabled",
            taxonomy.report.table,
            schema::TAXONOMY_CORRELATION
        );
        return None;
    }
    Some(FallbackScores::from_taxonomy(&taxonomy.records))
}

/// SHA-256 over every job's id and extraction fields, then the taxonomy rows
fn inputs_fingerprint(jobs: &[JobRecord], taxonomy: Option<&TaxonomyTable>) -> String {
    let mut hasher = Sha256::new();
    for job in jobs {
        hasher.update(job.job_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(job.corpus_text().as_bytes());
        hasher.update([0xffu8]);
    }
    if let Some(taxonomy) = taxonomy {
        hasher.update(b"taxonomy");
        hasher.update([u8::from(taxonomy.has_correlations())]);
        for record in &taxonomy.records {
            hasher.update(record.job_id.as_bytes());
            hasher.update([0u8]);
            hasher.update(record.skill.as_bytes());
            hasher.update([0u8]);
            if let Some(correlation) = record.correlation {
                hasher.update(correlation.to_le_bytes());
            }
            hasher.update([0xffu8]);
        }
    }
    hex::encode(hasher.finalize())
}

/// Cached mentions and profiles, if the stored manifest equals `expected`
/// and the profiles cover exactly the given job ids
fn load_cached(
    paths: &ArtifactPaths,
    job_ids: &[String],
    expected: &ArtifactManifest,
) -> Result<Option<(Vec<SkillMention>, SkillProfiles)>> {
    if !paths.has_matching_artifacts() {
        debug!("No cached artifacts in {}", paths.dir().display());
        return Ok(None);
    }

    match artifacts::read_manifest(&paths.manifest())? {
        Some(stored) if stored == *expected => {}
        _ => {
            info!("Cached artifacts were built from other inputs or parameters; regenerating");
            return Ok(None);
        }
    }

    let profiles = artifacts::read_profiles(&paths.profiles())?;
    let cached: HashSet<&str> = profiles.job_ids().collect();
    let current: HashSet<&str> = job_ids.iter().map(String::as_str).collect();
    if profiles.len() != job_ids.len() || cached != current {
        info!(
            "Cached profiles cover {} jobs but the table has {}; regenerating",
            profiles.len(),
            job_ids.len()
        );
        return Ok(None);
    }

    let mentions = artifacts::read_mentions(&paths.mentions())?;
    Ok(Some((mentions, profiles)))
}

fn summarize(
    jobs: &[JobRecord],
    catalog_terms: usize,
    mentions: &[SkillMention],
    profiles: &SkillProfiles,
    paths: &ArtifactPaths,
    reused_cache: bool,
) -> PrepareSummary {
    let fallback_jobs: HashSet<&str> = mentions
        .iter()
        .filter(|m| m.provenance == Provenance::FallbackCorrelation)
        .map(|m| m.job_id.as_str())
        .collect();

    PrepareSummary {
        jobs: jobs.len(),
        catalog_terms,
        mentions: mentions.len(),
        profiles: profiles.len(),
        non_empty_profiles: profiles.non_empty_count(),
        fallback_jobs: fallback_jobs.len(),
        artifacts_dir: paths.dir().to_path_buf(),
        reused_cache,
    }
}
