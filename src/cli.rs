//! CLI interface for the skill matcher

use crate::config::OutputFormat;
use crate::pipeline::PrepareOptions;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skill-matcher")]
#[command(about = "Skill-based job recommendations and skill gap analysis")]
#[command(long_about = "Build a skill catalog from job postings, profile every job by its skills, and rank jobs against free-text skill descriptions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build catalog, mentions, profiles and requirements artifacts
    Prepare {
        #[command(flatten)]
        data: DataArgs,

        /// Regenerate even if cached artifacts are current
        #[arg(short, long)]
        force: bool,
    },

    /// Rank jobs against a description of your skills
    Rank {
        /// Free-text skills or resume excerpt
        #[arg(short, long)]
        query: String,

        /// Number of results to show
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Only show jobs in this city
        #[arg(long)]
        city: Option<String>,

        /// Output format: console, json
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Show matched and missing skills for one job
    Gap {
        /// Job id
        #[arg(short, long)]
        job: String,

        /// Free-text skills or resume excerpt
        #[arg(short, long)]
        query: String,

        /// Number of job skills to consider
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

/// Input and artifact locations, overriding the `[data]` config section
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct DataArgs {
    /// Job table (CSV)
    #[arg(long)]
    pub jobs: Option<PathBuf>,

    /// Taxonomy skill table (CSV)
    #[arg(long)]
    pub taxonomy: Option<PathBuf>,

    /// Artifacts directory
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl DataArgs {
    /// Replace each configured location that was given on the command line
    pub fn apply(&self, options: &mut PrepareOptions) {
        if let Some(jobs) = &self.jobs {
            options.jobs_path = jobs.clone();
        }
        if let Some(taxonomy) = &self.taxonomy {
            options.taxonomy_path = Some(taxonomy.clone());
        }
        if let Some(out) = &self.out {
            options.artifacts_dir = out.clone();
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!("Invalid output format: {}. Supported: console, json", format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("JSON"), Ok(OutputFormat::Json));
        assert_eq!(parse_output_format("console"), Ok(OutputFormat::Console));
        assert!(parse_output_format("pdf").is_err());
    }

    #[test]
    fn test_rank_arguments() {
        let cli = Cli::try_parse_from([
            "skill-matcher", "-v", "rank", "--query", "python sql", "-n", "3", "--city", "Denver",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Rank {
                query,
                top,
                city,
                output,
                data,
            } => {
                assert_eq!(query, "python sql");
                assert_eq!(top, Some(3));
                assert_eq!(city.as_deref(), Some("Denver"));
                assert!(output.is_none());
                assert_eq!(data, DataArgs::default());
            }
            _ => panic!("expected rank"),
        }
    }

    #[test]
    fn test_prepare_flags() {
        let cli = Cli::try_parse_from(["skill-matcher", "prepare", "--jobs", "j.csv", "--force"]).unwrap();
        match cli.command {
            Commands::Prepare { data, force } => {
                assert_eq!(data.jobs, Some(PathBuf::from("j.csv")));
                assert!(force);
                assert!(data.out.is_none());
            }
            _ => panic!("expected prepare"),
        }
    }

    #[test]
    fn test_data_args_override_config_paths() {
        let config = crate::config::Config::default();
        let mut options = PrepareOptions::from_config(&config);
        DataArgs {
            jobs: None,
            taxonomy: None,
            out: Some(PathBuf::from("elsewhere")),
        }
        .apply(&mut options);

        assert_eq!(options.jobs_path, config.data.jobs_path);
        assert_eq!(options.taxonomy_path, config.data.taxonomy_path);
        assert_eq!(options.artifacts_dir, PathBuf::from("elsewhere"));
    }

    #[test]
    fn test_rank_and_gap_accept_data_paths() {
        let cli = Cli::try_parse_from([
            "skill-matcher", "rank", "-q", "sql", "--jobs", "x.csv", "--out", "dir", "-o", "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Rank { data, output, .. } => {
                assert_eq!(data.jobs, Some(PathBuf::from("x.csv")));
                assert_eq!(data.out, Some(PathBuf::from("dir")));
                assert_eq!(output.as_deref(), Some("json"));
            }
            _ => panic!("expected rank"),
        }

        let cli = Cli::try_parse_from([
            "skill-matcher", "gap", "-j", "42", "-q", "sql", "--taxonomy", "t.csv", "--out", "dir",
        ])
        .unwrap();
        match cli.command {
            Commands::Gap { job, data, .. } => {
                assert_eq!(job, "42");
                assert_eq!(data.taxonomy, Some(PathBuf::from("t.csv")));
                assert_eq!(data.out, Some(PathBuf::from("dir")));
                assert!(data.jobs.is_none());
            }
            _ => panic!("expected gap"),
        }
    }
}
