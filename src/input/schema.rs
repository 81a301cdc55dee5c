//! Typed records produced at the ingestion boundary

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Accepted header names for the job identifier, in priority order
pub const JOB_ID_COLUMNS: &[&str] = &["system_job_id", "job_id"];

pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const CITY: &str = "city";
pub const SALARY_MIN: &str = "parameters_salary_min";
pub const SALARY_MAX: &str = "parameters_salary_max";
pub const MIN_EDUCATION: &str = "requirements_min_education";
pub const EXPERIENCE: &str = "requirements_experience";
pub const ONET_CODE: &str = "classifications_onet_code";
pub const MOC_CODES: &str = "moc_codes";
pub const LINK: &str = "link";
pub const CREATED_DATE: &str = "created_date";

/// Optional job columns; absent ones resolve to empty values
pub const OPTIONAL_JOB_COLUMNS: &[&str] = &[
    TITLE,
    DESCRIPTION,
    CITY,
    SALARY_MIN,
    SALARY_MAX,
    MIN_EDUCATION,
    EXPERIENCE,
    ONET_CODE,
    MOC_CODES,
    LINK,
    CREATED_DATE,
];

pub const TAXONOMY_JOB_ID: &str = "Research ID";
pub const TAXONOMY_SKILL: &str = "Taxonomy Skill";
pub const TAXONOMY_CORRELATION: &str = "Correlation Coefficient";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub title: String,
    pub description: String,
    pub city: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub min_education: String,
    pub experience: String,
    pub onet_code: String,
    pub moc_codes: String,
    pub link: String,
    pub created_date: Option<NaiveDate>,
}

impl JobRecord {
    /// A record with only the identifier and free text set
    pub fn new(job_id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            title: title.into(),
            description: description.into(),
            city: String::new(),
            salary_min: None,
            salary_max: None,
            min_education: String::new(),
            experience: String::new(),
            onet_code: String::new(),
            moc_codes: String::new(),
            link: String::new(),
            created_date: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    /// Text fields that feed skill extraction, space-joined
    pub fn corpus_text(&self) -> String {
        [
            self.title.as_str(),
            self.description.as_str(),
            self.min_education.as_str(),
            self.experience.as_str(),
            self.onet_code.as_str(),
        ]
        .join(" ")
    }

    pub fn in_city(&self, city: &str) -> bool {
        self.city.trim().eq_ignore_ascii_case(city.trim())
    }

    pub fn salary_range(&self) -> Option<String> {
        format_salary(self.salary_min, self.salary_max)
    }
}

/// One row of the taxonomy skill table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyRecord {
    pub job_id: String,
    pub skill: String,
    pub correlation: Option<f64>,
}

pub fn parse_optional_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// "$50,000 - $70,000", or "$50,000+" without a maximum. `None` unless
/// the minimum is positive.
pub fn format_salary(min: Option<f64>, max: Option<f64>) -> Option<String> {
    let min = min.filter(|v| *v > 0.0)?;
    match max.filter(|v| *v > 0.0) {
        Some(max) => Some(format!("{} - {}", dollars(min), dollars(max))),
        None => Some(format!("{}+", dollars(min))),
    }
}

fn dollars(value: f64) -> String {
    if value < 1000.0 && value.fract() != 0.0 {
        return format!("${:.2}", value);
    }
    let digits = (value.round() as u64).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${}", grouped)
}

/// Accepts `YYYY-MM-DD` with an optional time suffix.
pub fn parse_optional_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_number() {
        assert_eq!(parse_optional_number("52000"), Some(52000.0));
        assert_eq!(parse_optional_number(" 18.5 "), Some(18.5));
        assert_eq!(parse_optional_number(""), None);
        assert_eq!(parse_optional_number("NaN"), None);
        assert_eq!(parse_optional_number("n/a"), None);
    }

    #[test]
    fn test_parse_optional_date() {
        assert_eq!(
            parse_optional_date("2024-03-05T10:00:00Z"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(parse_optional_date("2024-03-05"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(parse_optional_date("yesterday"), None);
        assert_eq!(parse_optional_date(""), None);
    }

    #[test]
    fn test_format_salary() {
        assert_eq!(
            format_salary(Some(50000.0), Some(70000.0)).as_deref(),
            Some("$50,000 - $70,000")
        );
        assert_eq!(format_salary(Some(125000.0), None).as_deref(), Some("$125,000+"));
        assert_eq!(format_salary(Some(18.5), Some(22.0)).as_deref(), Some("$18.50 - $22"));
        assert_eq!(format_salary(Some(0.0), Some(70000.0)), None);
        assert_eq!(format_salary(None, Some(70000.0)), None);

        let mut job = JobRecord::new("1", "Welder", "");
        job.salary_min = Some(1500000.0);
        assert_eq!(job.salary_range().as_deref(), Some("$1,500,000+"));
    }

    #[test]
    fn test_city_comparison() {
        let job = JobRecord::new("1", "Analyst", "").with_city(" Denver ");
        assert!(job.in_city("denver"));
        assert!(!job.in_city("Boulder"));
    }
}
