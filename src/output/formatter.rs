//! Console and JSON rendering of ranked results and skill gaps

use crate::config::OutputFormat;
use crate::error::Result;
use crate::input::schema::format_salary;
use crate::matching::gap::SkillGap;
use crate::matching::service::RankedResult;
use crate::pipeline::PrepareSummary;
use colored::{Color, Colorize};

/// Renders query results in one output format
pub trait OutputFormatter {
    fn format_results(&self, query: &str, results: &[RankedResult]) -> Result<String>;
    fn format_gap(&self, gap: &SkillGap) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };
        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: f32) -> String {
        let (badge, color) = match (score * 100.0).round() as u32 {
            60..=100 => ("STRONG", Color::Green),
            40..=59 => ("GOOD", Color::BrightGreen),
            20..=39 => ("FAIR", Color::Yellow),
            1..=19 => ("WEAK", Color::BrightYellow),
            _ => ("NONE", Color::BrightBlack),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_skill_list(&self, label: &str, skills: &[String], color: Color) -> String {
        if skills.is_empty() {
            return format!("   {} -\n", label);
        }
        format!("   {} {}\n", label, self.colorize(&skills.join(", "), color))
    }

    pub fn format_summary(&self, summary: &PrepareSummary) -> String {
        let mut output = self.format_header("Preparation complete", 1);
        if summary.reused_cache {
            output.push_str(&self.colorize("Reused cached artifacts\n", Color::Cyan));
        }
        output.push_str(&format!("Jobs:            {}\n", summary.jobs));
        output.push_str(&format!("Catalog terms:   {}\n", summary.catalog_terms));
        output.push_str(&format!("Mentions:        {}\n", summary.mentions));
        output.push_str(&format!(
            "Profiles:        {} ({} with skills)\n",
            summary.profiles, summary.non_empty_profiles
        ));
        output.push_str(&format!("Fallback jobs:   {}\n", summary.fallback_jobs));
        output.push_str(&format!("Artifacts:       {}\n", summary.artifacts_dir.display()));
        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_results(&self, query: &str, results: &[RankedResult]) -> Result<String> {
        let mut output = self.format_header("Job Recommendations", 1);
        output.push_str(&format!("Query: {}\n", self.colorize(query, Color::Cyan)));

        if results.is_empty() {
            output.push_str(&self.colorize("\nNo matching jobs found.\n", Color::Yellow));
            return Ok(output);
        }

        for (i, result) in results.iter().enumerate() {
            let title = if result.title.is_empty() { "(untitled)" } else { &result.title };
            output.push_str(&format!(
                "\n{}. {} {} {:.3}\n",
                i + 1,
                self.colorize(title, Color::White),
                self.format_score_badge(result.match_score),
                result.match_score
            ));
            let city = if result.city.is_empty() { "-" } else { &result.city };
            output.push_str(&format!(
                "   {}\n",
                self.colorize(&format!("id {} | {}", result.job_id, city), Color::BrightBlack)
            ));
            let salary = format_salary(result.salary_min, result.salary_max)
                .unwrap_or_else(|| "Not disclosed".to_string());
            output.push_str(&format!("   Salary: {}\n", salary));
            output.push_str(&self.format_skill_list("Have:", &result.matched_skills, Color::Green));
            output.push_str(&self.format_skill_list("Gap: ", &result.missing_skills, Color::Yellow));
            if self.detailed {
                if let Some(date) = result.created_date {
                    output.push_str(&format!("   Posted: {}\n", date.format("%Y-%m-%d")));
                }
                if !result.link.is_empty() {
                    output.push_str(&format!("   Link: {}\n", result.link));
                }
            }
        }

        Ok(output)
    }

    fn format_gap(&self, gap: &SkillGap) -> Result<String> {
        let mut output = self.format_header(&format!("Skill Gap for job {}", gap.job_id), 2);
        if gap.matched.is_empty() && gap.missing.is_empty() {
            output.push_str(&self.colorize("No skills recorded for this job.\n", Color::Yellow));
            return Ok(output);
        }

        output.push_str(&self.format_header("Matched", 3));
        for skill in &gap.matched {
            output.push_str(&format!("  • {}\n", self.colorize(skill, Color::Green)));
        }
        output.push_str(&self.format_header("Missing", 3));
        for skill in &gap.missing {
            output.push_str(&format!("  • {}\n", self.colorize(skill, Color::Yellow)));
        }
        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

#[derive(serde::Serialize)]
struct ResultsPayload<'a> {
    query: &'a str,
    results: &'a [RankedResult],
}

impl OutputFormatter for JsonFormatter {
    fn format_results(&self, query: &str, results: &[RankedResult]) -> Result<String> {
        self.render(&ResultsPayload { query, results })
    }

    fn format_gap(&self, gap: &SkillGap) -> Result<String> {
        self.render(gap)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

/// Picks the formatter for the configured format
pub fn formatter_for(format: &OutputFormat, use_colors: bool, detailed: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter::new(use_colors, detailed)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
