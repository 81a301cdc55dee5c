//! Skill profile aggregation

use crate::processing::mentions::{Provenance, SkillMention};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    pub job_id: String,
    pub skill_text: String,
    pub provenance: Provenance,
}

/// Insertion-ordered mapping from job id to profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillProfiles {
    profiles: Vec<SkillProfile>,
    index: HashMap<String, usize>,
}

impl SkillProfiles {
    /// Insert or replace; replacing keeps the original position.
    pub fn insert(&mut self, profile: SkillProfile) {
        match self.index.get(&profile.job_id) {
            Some(&pos) => self.profiles[pos] = profile,
            None => {
                self.index.insert(profile.job_id.clone(), self.profiles.len());
                self.profiles.push(profile);
            }
        }
    }

    pub fn get(&self, job_id: &str) -> Option<&SkillProfile> {
        self.index.get(job_id).map(|&pos| &self.profiles[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillProfile> {
        self.profiles.iter()
    }

    pub fn job_ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.job_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn non_empty_count(&self) -> usize {
        self.profiles.iter().filter(|p| !p.skill_text.is_empty()).count()
    }
}

impl FromIterator<SkillProfile> for SkillProfiles {
    fn from_iter<I: IntoIterator<Item = SkillProfile>>(iter: I) -> Self {
        let mut profiles = SkillProfiles::default();
        for profile in iter {
            profiles.insert(profile);
        }
        profiles
    }
}

struct Group {
    /// (lowercased term, original term, best score, extracted?)
    terms: Vec<(String, String, f32, bool)>,
}

/// Build one profile per job in `job_ids`, in that order.
///
/// Terms are deduplicated case-insensitively keeping the best score, then
/// ordered by descending score with first-seen order for ties.
pub fn aggregate(job_ids: &[String], mentions: &[SkillMention]) -> SkillProfiles {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Group> = HashMap::new();

    for mention in mentions {
        let group = groups.entry(mention.job_id.as_str()).or_insert_with(|| {
            order.push(mention.job_id.as_str());
            Group { terms: Vec::new() }
        });

        let key = mention.skill_term.to_lowercase();
        let extracted = mention.provenance == Provenance::Extracted;
        match group.terms.iter_mut().find(|(k, _, _, _)| *k == key) {
            Some(entry) => {
                if mention.relevance_score > entry.2 {
                    entry.2 = mention.relevance_score;
                }
                entry.3 |= extracted;
            }
            None => group.terms.push((
                key,
                mention.skill_term.clone(),
                mention.relevance_score,
                extracted,
            )),
        }
    }

    let mut profiles = SkillProfiles::default();
    for job_id in job_ids {
        let profile = match groups.get(job_id.as_str()) {
            Some(group) => build_profile(job_id, group),
            None => SkillProfile {
                job_id: job_id.clone(),
                skill_text: String::new(),
                provenance: Provenance::None,
            },
        };
        profiles.insert(profile);
    }

    let unknown: Vec<&str> = order
        .into_iter()
        .filter(|id| profiles.get(id).is_none())
        .collect();
    if !unknown.is_empty() {
        warn!(
            "{} job ids have mentions but are not in the job table; appending them",
            unknown.len()
        );
        for id in unknown {
            profiles.insert(build_profile(id, &groups[id]));
        }
    }

    profiles
}

fn build_profile(job_id: &str, group: &Group) -> SkillProfile {
    let mut terms: Vec<&(String, String, f32, bool)> = group.terms.iter().collect();
    terms.sort_by(|a, b| b.2.total_cmp(&a.2));

    let provenance = if group.terms.iter().any(|t| t.3) {
        Provenance::Extracted
    } else {
        Provenance::FallbackCorrelation
    };

    SkillProfile {
        job_id: job_id.to_string(),
        skill_text: terms
            .iter()
            .map(|t| t.1.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        provenance,
    }
}
