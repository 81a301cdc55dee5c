//! Per-job skill mention extraction
//!
//! Job text and catalog terms share one fitted TF-IDF space. A mention is
//! a catalog term whose vector has cosine similarity at or above the
//! threshold with the job vector. Jobs with no qualifying term can fall
//! back to correlation scores from the taxonomy table; those mentions are
//! tagged [`Provenance::FallbackCorrelation`] and skip the threshold.

use crate::config::{NgramRange, PipelineConfig};
use crate::input::schema::TaxonomyRecord;
use crate::processing::catalog::SkillCatalog;
use crate::processing::text_processor::TextProcessor;
use crate::processing::tfidf::{SparseVector, TfidfParams, TfidfVectorizer};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Where a skill association came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Scored by TF-IDF similarity against the job text
    Extracted,
    /// Copied from a source-provided correlation coefficient
    FallbackCorrelation,
    /// No skill information at all
    None,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Extracted => "extracted",
            Provenance::FallbackCorrelation => "fallback_correlation",
            Provenance::None => "none",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provenance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "extracted" => Ok(Provenance::Extracted),
            "fallback_correlation" | "fallback-correlation" => Ok(Provenance::FallbackCorrelation),
            "none" | "" => Ok(Provenance::None),
            other => Err(format!("Unknown provenance: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMention {
    pub job_id: String,
    pub skill_term: String,
    pub relevance_score: f32,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionParams {
    pub top_k: usize,
    pub min_similarity: f32,
    pub ngram_range: NgramRange,
    pub batch_size: usize,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for ExtractionParams {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            top_k: config.top_k,
            min_similarity: config.min_similarity,
            ngram_range: config.ngram_range,
            batch_size: config.batch_size.max(1),
        }
    }
}

/// Correlated skills per job, taken from the taxonomy table
#[derive(Debug, Clone, Default)]
pub struct FallbackScores {
    by_job: HashMap<String, Vec<(String, f32)>>,
}

impl FallbackScores {
    /// Group taxonomy rows by job, keeping the best coefficient per
    /// normalized skill. Rows without a coefficient are ignored.
    pub fn from_taxonomy(records: &[TaxonomyRecord]) -> Self {
        let processor = TextProcessor::new();
        let mut by_job: HashMap<String, Vec<(String, f32)>> = HashMap::new();

        for record in records {
            let Some(correlation) = record.correlation else {
                continue;
            };
            let skill = processor.normalize(&record.skill);
            if skill.is_empty() {
                continue;
            }
            let score = correlation as f32;
            let skills = by_job.entry(record.job_id.clone()).or_default();
            match skills.iter_mut().find(|(s, _)| *s == skill) {
                Some(existing) => existing.1 = existing.1.max(score),
                None => skills.push((skill, score)),
            }
        }

        for skills in by_job.values_mut() {
            // stable: equal scores keep first-seen order
            skills.sort_by(|a, b| b.1.total_cmp(&a.1));
        }

        Self { by_job }
    }

    pub fn for_job(&self, job_id: &str) -> Option<&[(String, f32)]> {
        self.by_job.get(job_id).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.by_job.is_empty()
    }
}

/// Shared TF-IDF space over the job corpus and the catalog terms
pub struct MentionExtractor {
    vectorizer: TfidfVectorizer,
    terms: Vec<String>,
    /// Feature index -> (catalog index, weight); the transposed skill matrix
    postings: Vec<Vec<(usize, f32)>>,
    params: ExtractionParams,
}

impl MentionExtractor {
    pub fn fit<S: AsRef<str>>(corpus: &[S], catalog: &SkillCatalog, params: ExtractionParams) -> Self {
        let terms: Vec<String> = catalog.terms().map(str::to_string).collect();
        let documents: Vec<&str> = corpus
            .iter()
            .map(|s| s.as_ref())
            .chain(terms.iter().map(String::as_str))
            .collect();

        let tfidf = TfidfParams {
            ngram_range: params.ngram_range,
            min_df: if documents.len() < 2 { 1 } else { 2 },
            max_df: 0.95,
            sublinear_tf: true,
        };
        let vectorizer = TfidfVectorizer::fit(&documents, tfidf);

        let mut postings = vec![Vec::new(); vectorizer.vocabulary_size()];
        for (skill_idx, term) in terms.iter().enumerate() {
            for &(feature, weight) in vectorizer.transform(term).entries() {
                postings[feature].push((skill_idx, weight));
            }
        }

        debug!(
            "Mention space: {} features, {} catalog terms",
            vectorizer.vocabulary_size(),
            terms.len()
        );

        Self {
            vectorizer,
            terms,
            postings,
            params,
        }
    }

    pub fn params(&self) -> &ExtractionParams {
        &self.params
    }

    /// Score one job's text against every catalog term
    pub fn extract(&self, job_id: &str, job_text: &str) -> Vec<SkillMention> {
        let vector = self.vectorizer.transform(job_text);
        self.score_vector(job_id, &vector)
    }

    fn score_vector(&self, job_id: &str, vector: &SparseVector) -> Vec<SkillMention> {
        if vector.is_zero() || self.terms.is_empty() {
            return Vec::new();
        }

        let mut scores = vec![0.0f32; self.terms.len()];
        for &(feature, weight) in vector.entries() {
            for &(skill_idx, skill_weight) in &self.postings[feature] {
                scores[skill_idx] += weight * skill_weight;
            }
        }

        let mut kept: Vec<(usize, f32)> = scores
            .into_iter()
            .enumerate()
            .map(|(idx, score)| (idx, score.min(1.0)))
            .filter(|(_, score)| *score > 0.0 && *score >= self.params.min_similarity)
            .collect();
        // stable sort: equal scores stay in catalog order
        kept.sort_by(|a, b| b.1.total_cmp(&a.1));
        kept.truncate(self.params.top_k);

        kept.into_iter()
            .map(|(idx, score)| SkillMention {
                job_id: job_id.to_string(),
                skill_term: self.terms[idx].clone(),
                relevance_score: score,
                provenance: Provenance::Extracted,
            })
            .collect()
    }

    /// Extract mentions for every job, in table order, chunked by `batch_size`.
    pub fn extract_all<S: AsRef<str>>(
        &self,
        job_ids: &[String],
        corpus: &[S],
        fallback: Option<&FallbackScores>,
    ) -> Vec<SkillMention> {
        let progress = ProgressBar::new(job_ids.len() as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} extracting skills [{bar:40}] {pos}/{len}")
        {
            progress.set_style(style);
        }

        let mut mentions = Vec::new();
        let mut fallback_jobs = 0usize;
        let pairs: Vec<(&String, &str)> = job_ids
            .iter()
            .zip(corpus.iter().map(|s| s.as_ref()))
            .collect();

        for (batch_no, batch) in pairs.chunks(self.params.batch_size).enumerate() {
            let vectors: Vec<SparseVector> = batch
                .iter()
                .map(|(_, text)| self.vectorizer.transform(text))
                .collect();

            for ((job_id, _), vector) in batch.iter().zip(&vectors) {
                let extracted = self.score_vector(job_id, vector);
                if extracted.is_empty() {
                    if let Some(synth) = fallback.and_then(|f| self.fallback_mentions(job_id, f)) {
                        fallback_jobs += 1;
                        mentions.extend(synth);
                    }
                } else {
                    mentions.extend(extracted);
                }
            }

            progress.inc(batch.len() as u64);
            debug!("Scored batch {} ({} jobs)", batch_no + 1, batch.len());
        }
        progress.finish_and_clear();

        info!(
            "Extracted {} skill mentions across {} jobs ({} from correlation fallback)",
            mentions.len(),
            job_ids.len(),
            fallback_jobs
        );
        mentions
    }

    fn fallback_mentions(&self, job_id: &str, fallback: &FallbackScores) -> Option<Vec<SkillMention>> {
        let skills = fallback.for_job(job_id)?;
        if skills.is_empty() {
            return None;
        }
        Some(
            skills
                .iter()
                .take(self.params.top_k)
                .map(|(skill, score)| SkillMention {
                    job_id: job_id.to_string(),
                    skill_term: skill.clone(),
                    relevance_score: *score,
                    provenance: Provenance::FallbackCorrelation,
                })
                .collect(),
        )
    }
}

/// Score a single job against a catalog, fitting the space on that job alone.
pub fn extract_mentions(
    job_id: &str,
    job_text: &str,
    catalog: &SkillCatalog,
    params: ExtractionParams,
) -> Vec<SkillMention> {
    MentionExtractor::fit(&[job_text], catalog, params).extract(job_id, job_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::catalog::build_catalog;

    fn corpus() -> Vec<String> {
        vec![
            "python developer building sql pipelines with python and docker".to_string(),
            "registered nurse patient care clinical experience".to_string(),
            "sql reporting analyst with excel and python".to_string(),
            "forklift operator warehouse logistics".to_string(),
            "docker kubernetes devops engineer".to_string(),
            "patient care technician clinical support".to_string(),
        ]
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("job-{}", i)).collect()
    }

    #[test]
    fn test_bounds_hold() {
        let corpus = corpus();
        let catalog = build_catalog(&corpus, 1, 100);
        let params = ExtractionParams {
            top_k: 3,
            min_similarity: 0.1,
            ..ExtractionParams::default()
        };
        let extractor = MentionExtractor::fit(&corpus, &catalog, params);
        let mentions = extractor.extract_all(&ids(corpus.len()), &corpus, None);

        assert!(!mentions.is_empty());
        for id in ids(corpus.len()) {
            let job: Vec<&SkillMention> = mentions.iter().filter(|m| m.job_id == id).collect();
            assert!(job.len() <= 3);
            for pair in job.windows(2) {
                assert!(pair[0].relevance_score >= pair[1].relevance_score);
            }
            for m in job {
                assert!(m.relevance_score >= 0.1 && m.relevance_score <= 1.0);
                assert_eq!(m.provenance, Provenance::Extracted);
            }
        }
    }

    #[test]
    fn test_batch_size_does_not_change_output() {
        let corpus = corpus();
        let catalog = build_catalog(&corpus, 1, 100);
        let job_ids = ids(corpus.len());

        let run = |batch_size| {
            let params = ExtractionParams {
                batch_size,
                ..ExtractionParams::default()
            };
            MentionExtractor::fit(&corpus, &catalog, params).extract_all(&job_ids, &corpus, None)
        };

        let baseline = run(256);
        assert_eq!(run(1), baseline);
        assert_eq!(run(4), baseline);
    }

    #[test]
    fn test_fallback_applies_only_without_extracted_mentions() {
        let corpus = vec![
            "python sql".to_string(),
            "python sql".to_string(),
            "zzz qqq".to_string(),
        ];
        let catalog = build_catalog(&corpus[..2], 1, 10);
        let taxonomy = vec![
            TaxonomyRecord {
                job_id: "job-2".to_string(),
                skill: "Customer Service".to_string(),
                correlation: Some(0.42),
            },
            TaxonomyRecord {
                job_id: "job-0".to_string(),
                skill: "Ignored".to_string(),
                correlation: Some(0.99),
            },
        ];
        let fallback = FallbackScores::from_taxonomy(&taxonomy);

        let extractor = MentionExtractor::fit(&corpus, &catalog, ExtractionParams::default());
        let mentions = extractor.extract_all(&ids(3), &corpus, Some(&fallback));

        let job2: Vec<&SkillMention> = mentions.iter().filter(|m| m.job_id == "job-2").collect();
        assert_eq!(job2.len(), 1);
        assert_eq!(job2[0].skill_term, "customer service");
        assert_eq!(job2[0].provenance, Provenance::FallbackCorrelation);
        assert!((job2[0].relevance_score - 0.42).abs() < 1e-6);

        assert!(mentions
            .iter()
            .filter(|m| m.job_id == "job-0")
            .all(|m| m.provenance == Provenance::Extracted));
    }

    #[test]
    fn test_rows_without_coefficient_give_no_fallback() {
        let taxonomy = vec![
            TaxonomyRecord {
                job_id: "z".to_string(),
                skill: "Forklift Operation".to_string(),
                correlation: None,
            },
            TaxonomyRecord {
                job_id: "y".to_string(),
                skill: "Welding".to_string(),
                correlation: None,
            },
            TaxonomyRecord {
                job_id: "y".to_string(),
                skill: "Blueprint Reading".to_string(),
                correlation: Some(0.3),
            },
        ];
        let fallback = FallbackScores::from_taxonomy(&taxonomy);

        assert!(fallback.for_job("z").is_none());
        let y = fallback.for_job("y").unwrap();
        assert_eq!(y.len(), 1);
        assert_eq!(y[0].0, "blueprint reading");
    }

    #[test]
    fn test_deterministic() {
        let corpus = corpus();
        let catalog = build_catalog(&corpus, 1, 100);
        let a = extract_mentions("x", &corpus[0], &catalog, ExtractionParams::default());
        let b = extract_mentions("x", &corpus[0], &catalog, ExtractionParams::default());

        assert_eq!(a, b);
        assert!(a.iter().any(|m| m.skill_term == "python"));
    }

    #[test]
    fn test_empty_catalog_yields_nothing() {
        let corpus = corpus();
        let extractor = MentionExtractor::fit(&corpus, &SkillCatalog::default(), ExtractionParams::default());
        assert!(extractor.extract("job-0", &corpus[0]).is_empty());
    }

    #[test]
    fn test_provenance_round_trip_strings() {
        for p in [Provenance::Extracted, Provenance::FallbackCorrelation, Provenance::None] {
            assert_eq!(p.as_str().parse::<Provenance>().unwrap(), p);
        }
        assert!("bogus".parse::<Provenance>().is_err());
    }
}
