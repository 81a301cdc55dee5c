//! Education and experience labels for display
//!
//! Precedence is strict: a value from the dataset wins, then the first
//! matching rule in priority order, then "Not specified". Matching never
//! reads these labels.

use crate::input::schema::JobRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NOT_SPECIFIED_LABEL: &str = "Not specified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementSource {
    Dataset,
    NlpInferred,
    NotSpecified,
}

impl fmt::Display for RequirementSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequirementSource::Dataset => "dataset",
            RequirementSource::NlpInferred => "nlp_inferred",
            RequirementSource::NotSpecified => "not_specified",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredRequirement {
    pub label: String,
    pub source: RequirementSource,
}

/// A pattern and the label it produces. `label` may reference capture
/// groups (`$1`).
pub struct RequirementRule {
    pub label: &'static str,
    pub pattern: Regex,
}

pub struct RequirementsInferencer {
    rules: Vec<RequirementRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementsProfile {
    pub job_id: String,
    pub education: InferredRequirement,
    pub experience: InferredRequirement,
}

impl RequirementsInferencer {
    pub fn new(rules: Vec<RequirementRule>) -> Self {
        Self { rules }
    }

    /// Highest degree first, so "bachelor's or master's" reads as master's
    pub fn education() -> Self {
        Self::new(vec![
            rule("Doctorate", r"\b(ph\.?d|doctorate|doctoral)\b"),
            rule("Master's degree", r"\b(master'?s|mba|m\.s)\b"),
            rule(
                "Bachelor's degree",
                r"\b(bachelor'?s|b\.s|b\.a|four[- ]year degree|4[- ]year degree)\b",
            ),
            rule("Associate's degree", r"\b(associate'?s|two[- ]year degree|2[- ]year degree)\b"),
            rule("High school diploma / GED", r"\b(high school|ged|diploma)\b"),
        ])
    }

    pub fn experience() -> Self {
        Self::new(vec![
            rule("$1+ years", r"\b(\d{1,2})\s*\+?\s*(?:-\s*\d{1,2}\s*)?(?:years?|yrs?)\b"),
            rule("Entry level", r"\b(entry[- ]level|no experience|will train)\b"),
        ])
    }

    pub fn infer(&self, title: &str, description: &str, existing_value: &str) -> InferredRequirement {
        let existing = existing_value.trim();
        if !existing.is_empty() && !existing.eq_ignore_ascii_case("nan") {
            return InferredRequirement {
                label: existing.to_string(),
                source: RequirementSource::Dataset,
            };
        }

        let text = format!("{} {}", title, description).to_lowercase();
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(&text) {
                let mut label = String::new();
                caps.expand(rule.label, &mut label);
                return InferredRequirement {
                    label,
                    source: RequirementSource::NlpInferred,
                };
            }
        }

        InferredRequirement {
            label: NOT_SPECIFIED_LABEL.to_string(),
            source: RequirementSource::NotSpecified,
        }
    }
}

fn rule(label: &'static str, pattern: &str) -> RequirementRule {
    RequirementRule {
        label,
        pattern: Regex::new(pattern).expect("Invalid requirement rule regex"),
    }
}

/// Both rule sets, applied together to one job
pub struct RequirementsProfiler {
    education: RequirementsInferencer,
    experience: RequirementsInferencer,
}

impl RequirementsProfiler {
    pub fn new() -> Self {
        Self {
            education: RequirementsInferencer::education(),
            experience: RequirementsInferencer::experience(),
        }
    }

    pub fn infer_for_job(&self, job: &JobRecord) -> RequirementsProfile {
        RequirementsProfile {
            job_id: job.job_id.clone(),
            education: self.education.infer(&job.title, &job.description, &job.min_education),
            experience: self.experience.infer(&job.title, &job.description, &job.experience),
        }
    }
}

impl Default for RequirementsProfiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Education and experience labels for every job
pub fn infer_requirements(jobs: &[JobRecord]) -> Vec<RequirementsProfile> {
    let profiler = RequirementsProfiler::new();
    jobs.iter().map(|job| profiler.infer_for_job(job)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_value_wins() {
        let inferencer = RequirementsInferencer::education();
        let result = inferencer.infer("Engineer", "PhD preferred", "Bachelor's");

        assert_eq!(result.label, "Bachelor's");
        assert_eq!(result.source, RequirementSource::Dataset);
    }

    #[test]
    fn test_first_rule_wins() {
        let inferencer = RequirementsInferencer::education();
        let result = inferencer.infer("Analyst", "Bachelor's or Master's degree required", "");

        assert_eq!(result.label, "Master's degree");
        assert_eq!(result.source, RequirementSource::NlpInferred);
    }

    #[test]
    fn test_experience_years_capture() {
        let inferencer = RequirementsInferencer::experience();
        let result = inferencer.infer("Nurse", "Requires 3-5 years of clinical work", "nan");

        assert_eq!(result.label, "3+ years");
        assert_eq!(result.source, RequirementSource::NlpInferred);
    }

    #[test]
    fn test_not_specified() {
        let inferencer = RequirementsInferencer::experience();
        let result = inferencer.infer("Cashier", "Friendly team", "");

        assert_eq!(result.label, NOT_SPECIFIED_LABEL);
        assert_eq!(result.source, RequirementSource::NotSpecified);
        assert_eq!(result.source.to_string(), "not_specified");
    }

    #[test]
    fn test_infer_for_job_combines_both() {
        let mut job = JobRecord::new("7", "Junior Analyst", "Entry level role, associate's degree");
        job.min_education = "nan".to_string();
        let profile = RequirementsProfiler::new().infer_for_job(&job);

        assert_eq!(profile.job_id, "7");
        assert_eq!(profile.education.label, "Associate's degree");
        assert_eq!(profile.experience.label, "Entry level");
    }
}
