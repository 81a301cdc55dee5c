//! Match index over skill profiles
//!
//! The index is an immutable snapshot: a fitted vectorizer, one normalized
//! row per profile and the job ids in profile order. Queries are projected
//! through the same fitted vectorizer and never refit it.

use crate::processing::profiles::SkillProfiles;
use crate::processing::tfidf::{SparseVector, TfidfParams, TfidfVectorizer};
use log::{info, warn};
use sha2::{Digest, Sha256};

pub struct MatchIndex {
    vectorizer: TfidfVectorizer,
    rows: Vec<SparseVector>,
    job_ids: Vec<String>,
    fingerprint: String,
}

impl MatchIndex {
    pub fn build(profiles: &SkillProfiles) -> Self {
        let texts: Vec<&str> = profiles.iter().map(|p| p.skill_text.as_str()).collect();
        let job_ids: Vec<String> = profiles.job_ids().map(str::to_string).collect();

        let (vectorizer, rows) = TfidfVectorizer::fit_transform(&texts, TfidfParams::default());

        if profiles.non_empty_count() == 0 {
            warn!("Empty corpus: match index built from {} empty profiles", profiles.len());
        }
        info!(
            "Built match index: {} jobs, {} features",
            job_ids.len(),
            vectorizer.vocabulary_size()
        );

        Self {
            vectorizer,
            rows,
            job_ids,
            fingerprint: fingerprint(profiles),
        }
    }

    /// Cosine scores for every job, in profile order
    pub fn scores(&self, text: &str) -> Vec<f32> {
        let query = self.vectorizer.transform(text);
        self.rows
            .iter()
            .map(|row| query.dot(row).clamp(0.0, 1.0))
            .collect()
    }

    /// Row positions ranked by descending score; ties keep profile order.
    pub fn ranked_positions(&self, text: &str) -> Vec<(usize, f32)> {
        let mut ranked: Vec<(usize, f32)> = self.scores(text).into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    pub fn query(&self, text: &str, top_n: usize) -> Vec<(String, f32)> {
        self.ranked_positions(text)
            .into_iter()
            .take(top_n)
            .map(|(pos, score)| (self.job_ids[pos].clone(), score))
            .collect()
    }

    pub fn job_id(&self, position: usize) -> &str {
        &self.job_ids[position]
    }

    pub fn len(&self) -> usize {
        self.job_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.job_ids.is_empty()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn matches_snapshot(&self, profiles: &SkillProfiles) -> bool {
        self.fingerprint == fingerprint(profiles)
    }
}

/// SHA-256 over the ordered `(job_id, skill_text)` pairs
pub fn fingerprint(profiles: &SkillProfiles) -> String {
    let mut hasher = Sha256::new();
    for profile in profiles.iter() {
        hasher.update(profile.job_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(profile.skill_text.as_bytes());
        hasher.update([0xffu8]);
    }
    hex::encode(hasher.finalize())
}
