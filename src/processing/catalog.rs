//! Skill catalog construction
//!
//! A catalog is a bounded, ordered vocabulary of candidate skill terms.
//! Entries are sorted by descending document count with lexical ties, and
//! every entry clears the configured minimum frequency.

use crate::config::NgramRange;
use crate::input::schema::{JobRecord, TaxonomyRecord};
use crate::processing::text_processor::TextProcessor;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const CANDIDATE_NGRAMS: NgramRange = NgramRange::new(1, 2);
/// Same floor as the tokenizer, so two-letter skills ("ai", "qa") survive
const MIN_TOKEN_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub term: String,
    pub document_count: usize,
    /// `document_count` divided by the number of documents scanned
    pub document_frequency: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillCatalog {
    entries: Vec<CatalogEntry>,
}

impl SkillCatalog {
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.term.as_str())
    }

    pub fn contains(&self, term: &str) -> bool {
        self.entries.iter().any(|e| e.term == term)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a catalog of unigram and bigram candidates from job text.
///
/// Candidates are formed from tokens of at least two characters that are
/// neither stop words nor purely numeric; bigrams join adjacent survivors.
pub fn build_catalog<S: AsRef<str>>(
    job_texts: &[S],
    min_frequency: usize,
    max_skills: usize,
) -> SkillCatalog {
    if job_texts.iter().all(|t| t.as_ref().trim().is_empty()) {
        warn!(
            "Empty corpus: no usable text in {} documents; skill catalog will be empty",
            job_texts.len()
        );
        return SkillCatalog::default();
    }

    let processor = TextProcessor::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for text in job_texts {
        let tokens: Vec<String> = processor
            .tokenize(text.as_ref())
            .into_iter()
            .filter(|t| is_candidate_token(&processor, t))
            .collect();

        let unique: HashSet<String> = TextProcessor::ngrams(&tokens, CANDIDATE_NGRAMS)
            .into_iter()
            .collect();
        for term in unique {
            *counts.entry(term).or_insert(0) += 1;
        }
    }

    let catalog = select_entries(counts, job_texts.len(), min_frequency, max_skills);
    info!(
        "Built skill catalog with {} terms from {} documents",
        catalog.len(),
        job_texts.len()
    );
    catalog
}

/// Build a catalog from taxonomy skill labels, counting one per row.
pub fn build_catalog_from_taxonomy(
    records: &[TaxonomyRecord],
    min_frequency: usize,
    max_skills: usize,
) -> SkillCatalog {
    let processor = TextProcessor::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut jobs = HashSet::new();

    for record in records {
        let label = processor.normalize(&record.skill);
        if label.chars().count() <= 2 {
            continue;
        }
        jobs.insert(record.job_id.as_str());
        *counts.entry(label).or_insert(0) += 1;
    }

    if counts.is_empty() {
        warn!("Empty corpus: taxonomy table produced no usable skill labels");
        return SkillCatalog::default();
    }

    let catalog = select_entries(counts, jobs.len(), min_frequency, max_skills);
    info!("Built taxonomy skill catalog with {} terms", catalog.len());
    catalog
}

/// Normalized extraction text for each job, in table order
pub fn build_job_corpus(jobs: &[JobRecord]) -> Vec<String> {
    let processor = TextProcessor::new();
    jobs.iter()
        .map(|job| processor.normalize(&job.corpus_text()))
        .collect()
}

fn is_candidate_token(processor: &TextProcessor, token: &str) -> bool {
    token.chars().count() >= MIN_TOKEN_CHARS
        && !processor.is_stop_word(token)
        && !token.chars().all(|c| c.is_ascii_digit())
}

fn select_entries(
    counts: HashMap<String, usize>,
    total_docs: usize,
    min_frequency: usize,
    max_skills: usize,
) -> SkillCatalog {
    let mut retained: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_frequency)
        .collect();
    retained.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    if retained.len() > max_skills {
        debug!(
            "Truncating {} catalog candidates to {}",
            retained.len(),
            max_skills
        );
        retained.truncate(max_skills);
    }

    let denom = total_docs.max(1) as f32;
    SkillCatalog::from_entries(
        retained
            .into_iter()
            .map(|(term, document_count)| CatalogEntry {
                term,
                document_count,
                document_frequency: document_count as f32 / denom,
            })
            .collect(),
    )
}
