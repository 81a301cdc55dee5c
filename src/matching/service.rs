//! Query interface over an atomically replaceable match snapshot
//!
//! A [`MatchService`] starts empty and must be built explicitly. Each
//! rebuild constructs a complete [`MatchSnapshot`] outside the lock and then
//! swaps it in, so a reader sees either the old snapshot or the new one.

use crate::error::{Result, SkillMatchError};
use crate::input::schema::JobRecord;
use crate::matching::gap::{analyze_gap, SkillGap};
use crate::matching::index::MatchIndex;
use crate::processing::mentions::SkillMention;
use crate::processing::profiles::SkillProfiles;
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub job_id: String,
    pub title: String,
    pub city: String,
    pub link: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub created_date: Option<NaiveDate>,
    pub match_score: f32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

/// Everything a query reads, built together
pub struct MatchSnapshot {
    pub index: MatchIndex,
    jobs: HashMap<String, JobRecord>,
    mentions: HashMap<String, Vec<SkillMention>>,
}

impl MatchSnapshot {
    pub fn build(jobs: &[JobRecord], mentions: &[SkillMention], profiles: &SkillProfiles) -> Self {
        let mut by_job: HashMap<String, Vec<SkillMention>> = HashMap::new();
        for mention in mentions {
            by_job
                .entry(mention.job_id.clone())
                .or_default()
                .push(mention.clone());
        }

        Self {
            index: MatchIndex::build(profiles),
            jobs: jobs.iter().map(|j| (j.job_id.clone(), j.clone())).collect(),
            mentions: by_job,
        }
    }

    pub fn job(&self, job_id: &str) -> Option<&JobRecord> {
        self.jobs.get(job_id)
    }

    fn gap(&self, job_id: &str, query_text: &str, limit: usize) -> SkillGap {
        let refs: Vec<&SkillMention> = self
            .mentions
            .get(job_id)
            .map(|m| m.iter().collect())
            .unwrap_or_default();
        analyze_gap(job_id, query_text, &refs, limit)
    }
}

pub struct MatchService {
    current: RwLock<Option<Arc<MatchSnapshot>>>,
    skill_gap_limit: usize,
}

impl MatchService {
    pub fn new(skill_gap_limit: usize) -> Self {
        Self {
            current: RwLock::new(None),
            skill_gap_limit,
        }
    }

    /// Build a fresh snapshot and replace the current one
    pub fn rebuild(
        &self,
        jobs: &[JobRecord],
        mentions: &[SkillMention],
        profiles: &SkillProfiles,
    ) -> Arc<MatchSnapshot> {
        let snapshot = Arc::new(MatchSnapshot::build(jobs, mentions, profiles));
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::clone(&snapshot));
        info!("Match index swapped in (fingerprint {})", &snapshot.index.fingerprint()[..12]);
        snapshot
    }

    /// Rebuild only if no snapshot exists or the profiles changed.
    /// Returns whether a rebuild happened.
    pub fn ensure_index(
        &self,
        jobs: &[JobRecord],
        mentions: &[SkillMention],
        profiles: &SkillProfiles,
    ) -> bool {
        if let Ok(snapshot) = self.snapshot() {
            if snapshot.index.matches_snapshot(profiles) {
                debug!("Match index is current; skipping rebuild");
                return false;
            }
        }
        self.rebuild(jobs, mentions, profiles);
        true
    }

    pub fn snapshot(&self) -> Result<Arc<MatchSnapshot>> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.clone().ok_or(SkillMatchError::IndexNotBuilt)
    }

    pub fn is_built(&self) -> bool {
        self.snapshot().is_ok()
    }

    /// Rank jobs against free text. The city filter applies before
    /// truncation, so a larger `top_n` only extends the list.
    pub fn rank(
        &self,
        query_text: &str,
        top_n: usize,
        city_filter: Option<&str>,
    ) -> Result<Vec<RankedResult>> {
        let snapshot = self.snapshot()?;
        let city_filter = city_filter.map(str::trim).filter(|c| !c.is_empty());

        let results: Vec<RankedResult> = snapshot
            .index
            .ranked_positions(query_text)
            .into_iter()
            .filter_map(|(pos, score)| {
                let job_id = snapshot.index.job_id(pos);
                let job = snapshot.job(job_id);
                if let Some(city) = city_filter {
                    if !job.map(|j| j.in_city(city)).unwrap_or(false) {
                        return None;
                    }
                }
                Some((job_id, job, score))
            })
            .take(top_n)
            .map(|(job_id, job, score)| {
                let gap = snapshot.gap(job_id, query_text, self.skill_gap_limit);
                RankedResult {
                    job_id: job_id.to_string(),
                    title: job.map(|j| j.title.clone()).unwrap_or_default(),
                    city: job.map(|j| j.city.clone()).unwrap_or_default(),
                    link: job.map(|j| j.link.clone()).unwrap_or_default(),
                    salary_min: job.and_then(|j| j.salary_min),
                    salary_max: job.and_then(|j| j.salary_max),
                    created_date: job.and_then(|j| j.created_date),
                    match_score: score,
                    matched_skills: gap.matched,
                    missing_skills: gap.missing,
                }
            })
            .collect();

        debug!("rank returned {} results", results.len());
        Ok(results)
    }

    /// Matched and missing skills for one job. Unknown jobs give an empty gap.
    pub fn skill_gap(&self, job_id: &str, query_text: &str, limit: usize) -> Result<SkillGap> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.gap(job_id, query_text, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::mentions::Provenance;
    use crate::processing::profiles::aggregate;

    fn mention(job: &str, term: &str, score: f32) -> SkillMention {
        SkillMention {
            job_id: job.to_string(),
            skill_term: term.to_string(),
            relevance_score: score,
            provenance: Provenance::Extracted,
        }
    }

    fn fixture() -> (Vec<JobRecord>, Vec<SkillMention>, SkillProfiles) {
        let mut engineer = JobRecord::new("2", "Data Engineer", "").with_city("Boulder");
        engineer.salary_min = Some(90000.0);
        engineer.salary_max = Some(120000.0);
        engineer.created_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        let jobs = vec![
            JobRecord::new("1", "Accountant", "").with_city("Denver"),
            engineer,
            JobRecord::new("3", "Analyst", "").with_city("Denver"),
        ];
        let mentions = vec![
            mention("1", "finance", 0.6),
            mention("1", "accounting", 0.5),
            mention("2", "python", 0.7),
            mention("2", "sql", 0.6),
            mention("2", "aws", 0.3),
            mention("3", "sql", 0.5),
            mention("3", "excel", 0.4),
        ];
        let ids: Vec<String> = jobs.iter().map(|j| j.job_id.clone()).collect();
        let profiles = aggregate(&ids, &mentions);
        (jobs, mentions, profiles)
    }

    #[test]
    fn test_query_before_build_fails() {
        let service = MatchService::new(12);
        assert!(matches!(
            service.rank("python", 5, None),
            Err(SkillMatchError::IndexNotBuilt)
        ));
        assert!(matches!(
            service.skill_gap("1", "python", 5),
            Err(SkillMatchError::IndexNotBuilt)
        ));
    }

    #[test]
    fn test_rank_with_explanations() {
        let (jobs, mentions, profiles) = fixture();
        let service = MatchService::new(12);
        service.rebuild(&jobs, &mentions, &profiles);

        let results = service.rank("python sql", 5, None).unwrap();
        assert_eq!(results[0].job_id, "2");
        assert_eq!(results[0].title, "Data Engineer");
        assert_eq!(results[0].matched_skills, vec!["python"]);
        assert_eq!(results[0].missing_skills, vec!["sql", "aws"]);
        assert_eq!(results[0].salary_max, Some(120000.0));
        assert_eq!(results[0].created_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(results.last().unwrap().job_id, "1");
        assert_eq!(results.last().unwrap().salary_min, None);
    }

    #[test]
    fn test_city_filter_before_truncation() {
        let (jobs, mentions, profiles) = fixture();
        let service = MatchService::new(12);
        service.rebuild(&jobs, &mentions, &profiles);

        let results = service.rank("python sql", 1, Some(" denver ")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_id, "3");
    }

    #[test]
    fn test_rank_is_deterministic() {
        let (jobs, mentions, profiles) = fixture();
        let service = MatchService::new(12);
        service.rebuild(&jobs, &mentions, &profiles);

        let a = service.rank("excel", 3, None).unwrap();
        let b = service.rank("excel", 3, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_ensure_index_skips_unchanged_profiles() {
        let (jobs, mentions, profiles) = fixture();
        let service = MatchService::new(12);

        assert!(service.ensure_index(&jobs, &mentions, &profiles));
        let before = service.snapshot().unwrap();
        assert!(!service.ensure_index(&jobs, &mentions, &profiles));
        assert!(Arc::ptr_eq(&before, &service.snapshot().unwrap()));

        let reordered: Vec<String> = ["3", "2", "1"].iter().map(|s| s.to_string()).collect();
        let changed = aggregate(&reordered, &mentions);
        assert!(service.ensure_index(&jobs, &mentions, &changed));
        assert_eq!(service.snapshot().unwrap().index.len(), 3);
    }

    #[test]
    fn test_old_snapshot_survives_swap() {
        let (jobs, mentions, profiles) = fixture();
        let service = MatchService::new(12);
        service.rebuild(&jobs, &mentions, &profiles);
        let held = service.snapshot().unwrap();

        service.rebuild(&jobs[..1], &mentions, &SkillProfiles::default());
        assert_eq!(held.index.len(), 3);
        assert!(service.rank("python", 5, None).unwrap().is_empty());
    }

    #[test]
    fn test_skill_gap_unknown_job_is_empty() {
        let (jobs, mentions, profiles) = fixture();
        let service = MatchService::new(12);
        service.rebuild(&jobs, &mentions, &profiles);

        let gap = service.skill_gap("404", "python", 12).unwrap();
        assert!(gap.matched.is_empty() && gap.missing.is_empty());
    }
}
