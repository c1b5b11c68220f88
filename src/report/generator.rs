//! Text report generation.
//!
//! Console text and Markdown share one tabular layout per result set; JSON
//! is the serialized `Report`.

use super::{Report, ReportError};
use crate::analysis::tech_stack::StackPick;
use crate::analysis::{
    AnalysisResult, BehaviorSummary, CountryStackSummary, MentalHealthSummary, RemoteWorkSummary,
    SelfTaughtOutcome, TechStackSummary,
};
use crate::models::{QueryStats, ReportMetadata};
use comfy_table::{presets, Cell, CellAlignment};

/// Column alignment in a rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// A header row plus body rows, all pre-formatted.
#[derive(Debug, Clone)]
struct Table {
    headers: Vec<(&'static str, Align)>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: Vec<(&'static str, Align)>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn to_console(&self) -> String {
        let alignment = |align: Align| match align {
            Align::Left => CellAlignment::Left,
            Align::Right => CellAlignment::Right,
        };

        let mut table = comfy_table::Table::new();
        table.load_preset(presets::ASCII_FULL_CONDENSED).set_header(
            self.headers
                .iter()
                .map(|(name, align)| Cell::new(name).set_alignment(alignment(*align))),
        );

        for row in &self.rows {
            table.add_row(
                row.iter()
                    .zip(&self.headers)
                    .map(|(cell, (_, align))| Cell::new(cell).set_alignment(alignment(*align))),
            );
        }

        format!("{}\n", table)
    }

    fn to_markdown(&self) -> String {
        let mut out = String::new();

        let names: Vec<&str> = self.headers.iter().map(|(name, _)| *name).collect();
        out.push_str(&format!("| {} |\n", names.join(" | ")));

        let rule: Vec<&str> = self
            .headers
            .iter()
            .map(|(_, align)| match align {
                Align::Left => ":---",
                Align::Right => "---:",
            })
            .collect();
        out.push_str(&format!("|{}|\n", rule.join("|")));

        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|cell| cell.replace('|', "\\|")).collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }

        out
    }
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

fn tokens(values: &[String]) -> String {
    values.join(", ")
}

/// Render every result as plain console text.
pub fn render_console(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Data Count: {} records ({})\n\n",
        report.metadata.total_records, report.metadata.source
    ));

    for result in &report.results {
        let title = result.task().title();
        output.push_str(title);
        output.push('\n');
        output.push_str(&"=".repeat(title.chars().count()));
        output.push_str("\n\n");

        if result.is_empty() {
            output.push_str("No matching records.\n");
        } else {
            output.push_str(&result_table(result).to_console());
        }

        if let Some(stats) = result.stats() {
            output.push_str(&format!("\n{}\n", stats_line(&stats)));
        }
        output.push('\n');
    }

    output
}

/// Render a complete Markdown report.
pub fn render_markdown(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Developer Survey Statistics\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    for result in &report.results {
        output.push_str(&generate_result_section(result));
    }

    output.push_str("---\n\n");
    output.push_str(&format!(
        "*Report generated by surveystat v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    output
}

/// Serialize the report, metadata included.
pub fn render_json(report: &Report) -> Result<String, ReportError> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Data Count:** {}\n", metadata.total_records));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    for result in &report.results {
        let title = result.task().title();
        toc.push_str(&format!("- [{}](#{})\n", title, anchor(title)));
    }
    toc.push('\n');

    toc
}

fn anchor(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

fn generate_result_section(result: &AnalysisResult) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", result.task().title()));

    if result.is_empty() {
        section.push_str("No matching records.\n\n");
    } else {
        section.push_str(&result_table(result).to_markdown());
        section.push('\n');
    }

    if let Some(stats) = result.stats() {
        section.push_str(&format!("*{}*\n\n", stats_line(&stats)));
    }

    section
}

fn stats_line(stats: &QueryStats) -> String {
    if stats.unbucketed > 0 {
        format!(
            "{} records matched; {} skipped for an unreadable age.",
            stats.scanned, stats.unbucketed
        )
    } else {
        format!("{} records matched.", stats.scanned)
    }
}

fn result_table(result: &AnalysisResult) -> Table {
    match result {
        AnalysisResult::TechStack(summary) => tech_stack_table(summary),
        AnalysisResult::CountryStack(summary) => country_stack_table(summary),
        AnalysisResult::MentalHealth(summary) => mental_health_table(summary),
        AnalysisResult::MentalHealthBehavior(summary) => behavior_table(summary),
        AnalysisResult::RemoteWork(summary) => remote_work_table(summary),
        AnalysisResult::SelfTaught(outcome) => self_taught_table(outcome),
    }
}

fn tech_stack_table(summary: &TechStackSummary) -> Table {
    let mut table = Table::new(vec![
        ("Age Group", Align::Left),
        ("Rank", Align::Left),
        ("Languages", Align::Left),
        ("Databases", Align::Left),
        ("Web Frameworks", Align::Left),
        ("Respondents", Align::Right),
        ("Mean Compensation", Align::Right),
    ]);

    let pick_row = |group: String, rank: &str, pick: &StackPick| {
        vec![
            group,
            rank.to_string(),
            tokens(&pick.languages),
            tokens(&pick.databases),
            tokens(&pick.webframes),
            pick.respondents.to_string(),
            money(pick.mean_compensation),
        ]
    };

    for row in &summary.rows {
        table.push(pick_row(row.age_group.to_string(), "Top", &row.top));
        if let Some(ref second) = row.second {
            table.push(pick_row(String::new(), "Second", second));
        }
    }

    table
}

fn country_stack_table(summary: &CountryStackSummary) -> Table {
    let mut table = Table::new(vec![
        ("Country", Align::Left),
        ("Respondents", Align::Right),
        ("Dominant Stack", Align::Left),
        ("Count", Align::Right),
        ("Mean Compensation", Align::Right),
        ("Least Dominant Stack", Align::Left),
        ("Count", Align::Right),
        ("Mean Compensation", Align::Right),
    ]);

    for row in &summary.rows {
        table.push(vec![
            row.country.clone(),
            row.respondents.to_string(),
            row.dominant.stack.clone(),
            row.dominant.respondents.to_string(),
            money(row.dominant.mean_compensation),
            row.least_dominant.stack.clone(),
            row.least_dominant.respondents.to_string(),
            money(row.least_dominant.mean_compensation),
        ]);
    }

    table
}

fn mental_health_table(summary: &MentalHealthSummary) -> Table {
    let mut table = Table::new(vec![
        ("Age Group", Align::Left),
        ("Gender", Align::Left),
        ("Ethnicity", Align::Left),
        ("Respondents", Align::Right),
        ("With Issues", Align::Right),
        ("Share", Align::Right),
    ]);

    for row in &summary.rows {
        table.push(vec![
            row.age_group.to_string(),
            row.gender.clone(),
            row.ethnicity.clone(),
            row.respondents.to_string(),
            row.with_issues.to_string(),
            percent(row.issue_percentage),
        ]);
    }

    table
}

fn behavior_table(summary: &BehaviorSummary) -> Table {
    let mut table = Table::new(vec![
        ("Gender", Align::Left),
        ("Ethnicity", Align::Left),
        ("Respondents", Align::Right),
        ("Likely Issues", Align::Right),
        ("Share", Align::Right),
        ("Likely No Issues", Align::Right),
        ("Share", Align::Right),
    ]);

    for row in &summary.rows {
        table.push(vec![
            row.gender.clone(),
            row.ethnicity.clone(),
            row.respondents.to_string(),
            row.likely_issues.to_string(),
            percent(row.likely_issue_percentage),
            row.likely_no_issues.to_string(),
            percent(row.likely_no_issue_percentage),
        ]);
    }

    table
}

fn remote_work_table(summary: &RemoteWorkSummary) -> Table {
    let mut table = Table::new(vec![
        ("Age Group", Align::Left),
        ("Remote Work", Align::Left),
        ("Respondents", Align::Right),
        ("Mean Compensation", Align::Right),
        ("Mean Years Experience", Align::Right),
    ]);

    for row in &summary.rows {
        table.push(vec![
            row.age_group.to_string(),
            row.remote_work.clone(),
            row.respondents.to_string(),
            money(row.mean_compensation),
            format!("{:.1}", row.mean_years_experience),
        ]);
    }

    table
}

fn self_taught_table(outcome: &SelfTaughtOutcome) -> Table {
    let mut table = Table::new(vec![
        ("Professional Developers", Align::Right),
        ("Self-Taught", Align::Right),
        ("Share", Align::Right),
    ]);

    table.push(vec![
        outcome.population.to_string(),
        outcome.self_taught.to_string(),
        percent(outcome.share_percentage),
    ]);

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::remote_work::RemoteCompensation;
    use crate::analysis::tech_stack::AgeGroupStack;
    use crate::models::AgeGroup;
    use chrono::Utc;

    fn metadata() -> ReportMetadata {
        ReportMetadata {
            source: "mongodb://StackOverflow2022/surveyresult".to_string(),
            generated_at: Utc::now(),
            total_records: 73268,
            duration_seconds: 4.2,
        }
    }

    fn pick(language: &str, respondents: usize, mean: f64) -> StackPick {
        StackPick {
            languages: vec![language.to_string(), "SQL".to_string()],
            databases: vec!["PostgreSQL".to_string()],
            webframes: vec!["Axum".to_string()],
            respondents,
            mean_compensation: mean,
        }
    }

    fn create_test_report() -> Report {
        let tech = TechStackSummary {
            rows: vec![AgeGroupStack {
                age_group: AgeGroup::From25To35,
                top: pick("Rust", 3, 150000.0),
                second: Some(pick("Go", 5, 120000.0)),
            }],
            stats: QueryStats {
                scanned: 9,
                unbucketed: 1,
            },
        };
        let remote = RemoteWorkSummary {
            rows: vec![RemoteCompensation {
                age_group: AgeGroup::Under25,
                remote_work: "Fully remote".to_string(),
                respondents: 2,
                mean_compensation: 150.0,
                mean_years_experience: 5.0,
            }],
            stats: QueryStats {
                scanned: 2,
                unbucketed: 0,
            },
        };
        let self_taught = SelfTaughtOutcome {
            self_taught: 6,
            population: 9,
            share_percentage: 600.0 / 9.0,
        };

        Report {
            metadata: metadata(),
            results: vec![
                AnalysisResult::TechStack(tech),
                AnalysisResult::RemoteWork(remote),
                AnalysisResult::SelfTaught(self_taught),
            ],
        }
    }

    #[test]
    fn test_render_markdown() {
        let markdown = render_markdown(&create_test_report());

        assert!(markdown.contains("# Developer Survey Statistics"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Data Count:** 73268"));
        assert!(markdown.contains("## Best-paid tech stacks by age group"));
        assert!(markdown.contains("| 25-35 | Top | Rust, SQL | PostgreSQL | Axum | 3 | 150000.00 |"));
        assert!(markdown.contains("|  | Second | Go, SQL |"));
        assert!(markdown.contains("9 records matched; 1 skipped for an unreadable age."));
        assert!(markdown.contains("| 9 | 6 | 66.7% |"));
    }

    #[test]
    fn test_table_of_contents_anchors() {
        let markdown = render_markdown(&create_test_report());
        assert!(markdown.contains("- [Remote work compensation](#remote-work-compensation)"));
        assert!(markdown.contains("(#self-taught-professional-developers)"));
    }

    #[test]
    fn test_render_console_alignment() {
        let console = render_console(&create_test_report());

        assert!(console.starts_with("Data Count: 73268 records"));
        assert!(console.contains("Remote work compensation\n========================\n"));

        let header = console
            .lines()
            .find(|line| line.contains("Remote Work") && line.contains("Age Group"))
            .unwrap();
        assert!(header.contains("Mean Years Experience"));

        let row = console
            .lines()
            .find(|line| line.contains("Fully remote"))
            .unwrap();
        assert!(row.starts_with("| Under 25 "));
        // Numeric columns are right-aligned to the header width.
        assert!(row.ends_with(&format!("{:>21} |", "5.0")));
        assert!(row.contains(&format!("{:>17} |", "150.00")));
    }

    #[test]
    fn test_console_table_keeps_pipes() {
        let mut table = Table::new(vec![("Name", Align::Left), ("Count", Align::Right)]);
        table.push(vec!["a|b".to_string(), "7".to_string()]);

        let console = table.to_console();
        assert!(console.contains("| a|b  |     7 |"));
        assert!(console.lines().all(|line| !line.is_empty()));
    }

    #[test]
    fn test_empty_result_section() {
        let report = Report {
            metadata: metadata(),
            results: vec![AnalysisResult::MentalHealth(MentalHealthSummary {
                rows: Vec::new(),
                stats: QueryStats::default(),
            })],
        };

        assert!(render_console(&report).contains("No matching records."));
        assert!(render_markdown(&report).contains("No matching records."));
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let mut table = Table::new(vec![("Name", Align::Left)]);
        table.push(vec!["a|b".to_string()]);
        assert!(table.to_markdown().contains("| a\\|b |"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&create_test_report()).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"total_records\": 73268"));
        assert!(json.contains("\"task\": \"tech_stack\""));
        assert!(json.contains("\"age_group\": \"25-35\""));
        assert!(!json.contains("\"records\""));
    }
}
