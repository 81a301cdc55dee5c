//! Skill gap analysis
//!
//! A job's top mentions are split into skills the user already shows and
//! skills they lack. The check is lexical: a skill counts as matched when
//! any of its whitespace tokens longer than three characters occurs as a
//! substring of the lowercased user text. There is no stemming or synonym
//! expansion, and substrings produce false matches ("java" is found inside
//! "javascript"). That limitation is accepted.

use crate::processing::mentions::SkillMention;
use serde::{Deserialize, Serialize};

const SHORT_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillGap {
    pub job_id: String,
    /// Ordered by descending mention score
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

pub fn analyze_gap(
    job_id: &str,
    user_text: &str,
    mentions_for_job: &[&SkillMention],
    limit: usize,
) -> SkillGap {
    let mut ranked: Vec<(&str, f32)> = Vec::new();
    for mention in mentions_for_job.iter().filter(|m| m.job_id == job_id) {
        match ranked.iter_mut().find(|(t, _)| *t == mention.skill_term) {
            Some(entry) => entry.1 = entry.1.max(mention.relevance_score),
            None => ranked.push((mention.skill_term.as_str(), mention.relevance_score)),
        }
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(limit);

    let user_text = user_text.to_lowercase();
    let mut gap = SkillGap {
        job_id: job_id.to_string(),
        ..SkillGap::default()
    };
    for (skill, _) in ranked {
        if is_present(skill, &user_text) {
            gap.matched.push(skill.to_string());
        } else {
            gap.missing.push(skill.to_string());
        }
    }
    gap
}

fn is_present(skill: &str, user_text_lower: &str) -> bool {
    skill
        .to_lowercase()
        .split_whitespace()
        .filter(|token| token.chars().count() > SHORT_TOKEN_CHARS)
        .any(|token| user_text_lower.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::mentions::Provenance;

    fn mentions(job: &str, skills: &[(&str, f32)]) -> Vec<SkillMention> {
        skills
            .iter()
            .map(|(s, score)| SkillMention {
                job_id: job.to_string(),
                skill_term: s.to_string(),
                relevance_score: *score,
                provenance: Provenance::Extracted,
            })
            .collect()
    }

    #[test]
    fn test_python_docker_communication_scenario() {
        let owned = mentions("j1", &[("python", 0.9), ("docker", 0.7), ("communication", 0.5)]);
        let refs: Vec<&SkillMention> = owned.iter().collect();

        let gap = analyze_gap("j1", "I know python and linux", &refs, 12);
        assert_eq!(gap.matched, vec!["python"]);
        assert_eq!(gap.missing, vec!["docker", "communication"]);
    }

    #[test]
    fn test_limit_takes_highest_scores() {
        let owned = mentions("j", &[("excel", 0.1), ("sql", 0.8), ("python", 0.5), ("sql", 0.2)]);
        let refs: Vec<&SkillMention> = owned.iter().collect();

        let gap = analyze_gap("j", "", &refs, 2);
        assert_eq!(gap.missing, vec!["sql", "python"]);
    }

    #[test]
    fn test_short_tokens_never_match() {
        let owned = mentions("j", &[("sql", 0.8), ("data analysis", 0.6)]);
        let refs: Vec<&SkillMention> = owned.iter().collect();

        let gap = analyze_gap("j", "SQL and some DATA work", &refs, 12);
        assert_eq!(gap.matched, vec!["data analysis"]);
        assert_eq!(gap.missing, vec!["sql"]);
    }

    #[test]
    fn test_substring_false_positive_is_kept() {
        let owned = mentions("j", &[("java", 0.8)]);
        let refs: Vec<&SkillMention> = owned.iter().collect();

        let gap = analyze_gap("j", "javascript developer", &refs, 12);
        assert_eq!(gap.matched, vec!["java"]);
    }

    #[test]
    fn test_no_mentions() {
        let gap = analyze_gap("missing", "python", &[], 12);
        assert!(gap.matched.is_empty() && gap.missing.is_empty());
    }
}
