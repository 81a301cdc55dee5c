//! Skill matcher: TF-IDF skill profiles, job ranking and skill gaps

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use skill_matcher::cli::{self, Cli, Commands, ConfigAction, DataArgs};
use skill_matcher::config::Config;
use skill_matcher::matching::MatchService;
use skill_matcher::output::{formatter_for, ConsoleFormatter};
use skill_matcher::pipeline::{self, PrepareOptions, PreparedData};
use std::path::PathBuf;
use std::process;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Execute command
    if let Err(e) = run_command(cli.command, config, cli.config) {
        error!("Command failed: {:#}", e);
        process::exit(1);
    }
}

fn run_command(command: Commands, config: Config, config_file: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Prepare { data, force } => {
            let mut options = PrepareOptions::from_config(&config);
            data.apply(&mut options);
            options.force = force;

            info!("Preparing artifacts from {}", options.jobs_path.display());
            let prepared = pipeline::prepare(&options, &config.pipeline)
                .with_context(|| format!("Failed to prepare artifacts in {}", options.artifacts_dir.display()))?;
            let formatter = ConsoleFormatter::new(config.output.color_output, config.output.detailed);
            print!("{}", formatter.format_summary(&prepared.summary));
        }

        Commands::Rank {
            query,
            top,
            city,
            output,
            data,
        } => {
            let format = match output {
                Some(f) => cli::parse_output_format(&f).map_err(anyhow::Error::msg)?,
                None => config.output.format,
            };
            let top_n = top.unwrap_or(config.matching.default_top_n);

            let service = build_service(&config, &data)?;
            let results = service
                .rank(&query, top_n, city.as_deref())
                .context("Failed to rank jobs")?;

            let formatter = formatter_for(&format, config.output.color_output, config.output.detailed);
            println!("{}", formatter.format_results(&query, &results)?);
        }

        Commands::Gap {
            job,
            query,
            limit,
            data,
        } => {
            let limit = limit.unwrap_or(config.matching.skill_gap_limit);
            let service = build_service(&config, &data)?;
            let gap = service
                .skill_gap(&job, &query, limit)
                .with_context(|| format!("Failed to compute skill gap for job {}", job))?;

            let formatter = formatter_for(
                &config.output.format,
                config.output.color_output,
                config.output.detailed,
            );
            println!("{}", formatter.format_gap(&gap)?);
        }

        Commands::Config { action } => {
            let path = config_file.unwrap_or_else(Config::config_path);
            match action {
                Some(ConfigAction::Show) | None => {
                    let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
                    println!("# {}\n{}", path.display(), content);
                }
                Some(ConfigAction::Reset) => {
                    Config::default()
                        .save(&path)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Configuration reset to defaults at {}", path.display());
                }
                Some(ConfigAction::Path) => {
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}

/// Load or regenerate artifacts and build the match index once
fn build_service(config: &Config, data: &DataArgs) -> Result<MatchService> {
    let mut options = PrepareOptions::from_config(config);
    data.apply(&mut options);

    let PreparedData {
        jobs,
        mentions,
        profiles,
        ..
    } = pipeline::prepare(&options, &config.pipeline)
        .with_context(|| format!("Failed to load artifacts from {}", options.artifacts_dir.display()))?;

    let service = MatchService::new(config.matching.skill_gap_limit);
    service.ensure_index(&jobs, &mentions, &profiles);
    Ok(service)
}
