//! Error handling for the skill matcher

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillMatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required input table not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Schema mismatch in {table}: {message}")]
    SchemaMismatch { table: String, message: String },

    #[error("Match index has not been built; call rebuild() before querying")]
    IndexNotBuilt,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, SkillMatchError>;

impl SkillMatchError {
    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        SkillMatchError::SchemaMismatch {
            table: table.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_names_path() {
        let err = SkillMatchError::MissingInput(PathBuf::from("data/raw/jobs.csv"));
        assert_eq!(err.to_string(), "Required input table not found: data/raw/jobs.csv");
    }

    #[test]
    fn test_schema_helper() {
        let err = SkillMatchError::schema("jobs.csv", "no job id column");
        assert!(matches!(err, SkillMatchError::SchemaMismatch { ref table, .. } if table == "jobs.csv"));
        assert_eq!(err.to_string(), "Schema mismatch in jobs.csv: no job id column");
    }

    #[test]
    fn test_context_keeps_source_error() {
        use anyhow::Context;

        let result: Result<()> = Err(SkillMatchError::IndexNotBuilt);
        let err = result.context("Failed to rank jobs").unwrap_err();
        assert_eq!(err.to_string(), "Failed to rank jobs");
        assert!(matches!(
            err.downcast_ref::<SkillMatchError>(),
            Some(SkillMatchError::IndexNotBuilt)
        ));
    }
}
