//! CSV loading with one-time schema resolution

use crate::error::{Result, SkillMatchError};
use crate::input::schema::{self, JobRecord, TaxonomyRecord};
use csv::StringRecord;
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

/// What happened while resolving a table against its expected schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub table: String,
    pub rows: usize,
    /// Expected columns that were absent and filled with empty values
    pub substituted_columns: Vec<String>,
    pub skipped_rows: usize,
}

#[derive(Debug, Clone)]
pub struct JobTable {
    pub jobs: Vec<JobRecord>,
    pub report: LoadReport,
}

#[derive(Debug, Clone)]
pub struct TaxonomyTable {
    pub records: Vec<TaxonomyRecord>,
    pub report: LoadReport,
}

impl JobTable {
    pub fn job_ids(&self) -> Vec<String> {
        self.jobs.iter().map(|j| j.job_id.clone()).collect()
    }
}

impl TaxonomyTable {
    /// False when the source had no correlation coefficient column
    pub fn has_correlations(&self) -> bool {
        !self
            .report
            .substituted_columns
            .iter()
            .any(|c| c == schema::TAXONOMY_CORRELATION)
    }
}

/// Maps header names to column positions and hands out typed field readers
struct ColumnResolver {
    positions: HashMap<String, usize>,
}

impl ColumnResolver {
    fn new(headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { positions }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    fn first_of(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.position(n))
    }

    fn field<'r>(record: &'r StringRecord, position: Option<usize>) -> &'r str {
        position.and_then(|p| record.get(p)).unwrap_or("")
    }
}

/// Load the job table. A missing file is fatal; missing optional columns are not.
pub fn load_jobs(path: &Path) -> Result<JobTable> {
    if !path.exists() {
        return Err(SkillMatchError::MissingInput(path.to_path_buf()));
    }
    info!("Loading job table: {}", path.display());
    let file = std::fs::File::open(path)?;
    read_jobs(file, &path.display().to_string())
}

pub fn read_jobs<R: Read>(reader: R, table: &str) -> Result<JobTable> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let resolver = ColumnResolver::new(csv_reader.headers()?);

    let id_pos = resolver.first_of(schema::JOB_ID_COLUMNS).ok_or_else(|| {
        SkillMatchError::schema(
            table,
            format!("no job id column (expected one of {:?})", schema::JOB_ID_COLUMNS),
        )
    })?;

    let mut report = LoadReport {
        table: table.to_string(),
        ..LoadReport::default()
    };
    let mut pos = HashMap::new();
    for column in schema::OPTIONAL_JOB_COLUMNS {
        match resolver.position(column) {
            Some(p) => {
                pos.insert(*column, p);
            }
            None => {
                warn!(
                    "Column '{}' missing from {}; substituting empty values",
                    column, table
                );
                report.substituted_columns.push(column.to_string());
            }
        }
    }
    let col = |record: &StringRecord, name: &str| -> String {
        ColumnResolver::field(record, pos.get(name).copied())
            .trim()
            .to_string()
    };

    let mut seen = HashSet::new();
    let mut jobs = Vec::new();
    for row in csv_reader.records() {
        let record = row?;
        let job_id = ColumnResolver::field(&record, Some(id_pos)).trim().to_string();
        if job_id.is_empty() || !seen.insert(job_id.clone()) {
            report.skipped_rows += 1;
            continue;
        }

        jobs.push(JobRecord {
            job_id,
            title: col(&record, schema::TITLE),
            description: col(&record, schema::DESCRIPTION),
            city: col(&record, schema::CITY),
            salary_min: schema::parse_optional_number(&col(&record, schema::SALARY_MIN)),
            salary_max: schema::parse_optional_number(&col(&record, schema::SALARY_MAX)),
            min_education: col(&record, schema::MIN_EDUCATION),
            experience: col(&record, schema::EXPERIENCE),
            onet_code: col(&record, schema::ONET_CODE),
            moc_codes: col(&record, schema::MOC_CODES),
            link: col(&record, schema::LINK),
            created_date: schema::parse_optional_date(&col(&record, schema::CREATED_DATE)),
        });
    }

    if report.skipped_rows > 0 {
        warn!(
            "Skipped {} rows in {} with empty or duplicate job ids",
            report.skipped_rows, table
        );
    }
    report.rows = jobs.len();
    info!("Loaded {} jobs from {}", report.rows, table);

    Ok(JobTable { jobs, report })
}

/// Load the optional taxonomy table. Returns `None` when the file is absent.
pub fn load_taxonomy(path: &Path) -> Result<Option<TaxonomyTable>> {
    if !path.exists() {
        warn!(
            "Taxonomy table not found at {}; correlation fallback disabled",
            path.display()
        );
        return Ok(None);
    }
    info!("Loading taxonomy table: {}", path.display());
    let file = std::fs::File::open(path)?;
    read_taxonomy(file, &path.display().to_string()).map(Some)
}

pub fn read_taxonomy<R: Read>(reader: R, table: &str) -> Result<TaxonomyTable> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let resolver = ColumnResolver::new(csv_reader.headers()?);

    let mut report = LoadReport {
        table: table.to_string(),
        ..LoadReport::default()
    };
    let mut resolve = |name: &str| {
        let position = resolver.position(name);
        if position.is_none() {
            warn!(
                "Column '{}' missing from {}; substituting empty values",
                name, table
            );
            report.substituted_columns.push(name.to_string());
        }
        position
    };
    let id_pos = resolve(schema::TAXONOMY_JOB_ID);
    let skill_pos = resolve(schema::TAXONOMY_SKILL);
    let corr_pos = resolve(schema::TAXONOMY_CORRELATION);

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let record = row?;
        let job_id = ColumnResolver::field(&record, id_pos).trim().to_string();
        let skill = ColumnResolver::field(&record, skill_pos).trim().to_string();
        if job_id.is_empty() || skill.is_empty() {
            report.skipped_rows += 1;
            continue;
        }
        records.push(TaxonomyRecord {
            job_id,
            skill,
            correlation: schema::parse_optional_number(ColumnResolver::field(&record, corr_pos)),
        });
    }

    report.rows = records.len();
    info!("Loaded {} taxonomy rows from {}", report.rows, table);
    Ok(TaxonomyTable { records, report })
}
