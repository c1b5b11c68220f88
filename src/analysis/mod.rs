//! Survey analyses.
//!
//! Each analysis is a filter pushed to the data source followed by
//! in-memory derive, group, sort and projection steps. Analyses are
//! independent: none reads another's output.

pub mod aggregator;
pub mod derive;
pub mod mental_health;
pub mod remote_work;
pub mod self_taught;
pub mod tech_stack;

use crate::models::QueryStats;
use crate::source::{DataSource, Pattern};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

pub use mental_health::{BehaviorSummary, MentalHealthSummary};
pub use remote_work::RemoteWorkSummary;
pub use self_taught::SelfTaughtOutcome;
pub use tech_stack::{CountryStackSummary, TechStackSummary};

pub const PROFESSIONAL_DEVELOPER: &str = "I am a developer by profession";
pub const FORMER_DEVELOPER: &str = "I used to be a developer by profession, but no longer am";
pub const FULL_TIME: &str = "Employed, full-time";
pub const FULLY_REMOTE: &str = "Fully remote";
pub const HYBRID: &str = "Hybrid (some remote, some in-person)";
pub const YEARLY: &str = "Yearly";
pub const NO_MENTAL_HEALTH_ISSUE: &str = "None of the above";
pub const STRONG_INFLUENCE_MARKER: &str = "great deal";

pub const DEFAULT_REFUSAL_PATTERN: &str = "Prefer not to say|Or, in your own words";
pub const DEFAULT_FORMAL_TRAINING_PATTERN: &str = "Bootcamp|School|Certification";

/// Errors raised by the analyses themselves.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Invalid aggregation state: {0}")]
    InvalidAggregationState(String),

    #[error("Age {0:?} contains no number")]
    UnbucketableAge(String),

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Tunables of the analyses.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub countries: Vec<String>,
    pub country_limit: usize,
    pub demographic_limit: usize,
    pub behavior_limit: usize,
    pub refusal_pattern: String,
    pub formal_training_pattern: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            countries: default_countries(),
            country_limit: 5,
            demographic_limit: 10,
            behavior_limit: 5,
            refusal_pattern: DEFAULT_REFUSAL_PATTERN.to_string(),
            formal_training_pattern: DEFAULT_FORMAL_TRAINING_PATTERN.to_string(),
        }
    }
}

pub fn default_countries() -> Vec<String> {
    vec![
        "United States of America",
        "Germany",
        "India",
        "United Kingdom of Great Britain and Northern Ireland",
        "Canada",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// One of the analyses the tool can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    TechStack,
    CountryStack,
    MentalHealth,
    MentalHealthBehavior,
    RemoteWork,
    SelfTaught,
}

impl Task {
    /// Every task, in run order.
    pub const ALL: [Task; 6] = [
        Task::TechStack,
        Task::CountryStack,
        Task::MentalHealth,
        Task::MentalHealthBehavior,
        Task::RemoteWork,
        Task::SelfTaught,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Task::TechStack => "Best-paid tech stacks by age group",
            Task::CountryStack => "Dominant tech stacks by country",
            Task::MentalHealth => "Mental health by age, gender and ethnicity",
            Task::MentalHealthBehavior => "Mental health of engaged decision makers",
            Task::RemoteWork => "Remote work compensation",
            Task::SelfTaught => "Self-taught professional developers",
        }
    }

    /// Short identifier used for file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Task::TechStack => "tech_stack",
            Task::CountryStack => "country_stack",
            Task::MentalHealth => "mental_health",
            Task::MentalHealthBehavior => "mental_health_behavior",
            Task::RemoteWork => "remote_work",
            Task::SelfTaught => "self_taught",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Result of one analysis, ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "task", content = "result", rename_all = "snake_case")]
pub enum AnalysisResult {
    TechStack(TechStackSummary),
    CountryStack(CountryStackSummary),
    MentalHealth(MentalHealthSummary),
    MentalHealthBehavior(BehaviorSummary),
    RemoteWork(RemoteWorkSummary),
    SelfTaught(SelfTaughtOutcome),
}

impl AnalysisResult {
    pub fn task(&self) -> Task {
        match self {
            AnalysisResult::TechStack(_) => Task::TechStack,
            AnalysisResult::CountryStack(_) => Task::CountryStack,
            AnalysisResult::MentalHealth(_) => Task::MentalHealth,
            AnalysisResult::MentalHealthBehavior(_) => Task::MentalHealthBehavior,
            AnalysisResult::RemoteWork(_) => Task::RemoteWork,
            AnalysisResult::SelfTaught(_) => Task::SelfTaught,
        }
    }

    /// Counters of the underlying query, where it has any.
    pub fn stats(&self) -> Option<QueryStats> {
        match self {
            AnalysisResult::TechStack(s) => Some(s.stats),
            AnalysisResult::CountryStack(s) => Some(s.stats),
            AnalysisResult::MentalHealth(s) => Some(s.stats),
            AnalysisResult::MentalHealthBehavior(s) => Some(s.stats),
            AnalysisResult::RemoteWork(s) => Some(s.stats),
            AnalysisResult::SelfTaught(_) => None,
        }
    }

    /// Number of result rows. The self-taught outcome is a single row.
    pub fn len(&self) -> usize {
        match self {
            AnalysisResult::TechStack(s) => s.rows.len(),
            AnalysisResult::CountryStack(s) => s.rows.len(),
            AnalysisResult::MentalHealth(s) => s.rows.len(),
            AnalysisResult::MentalHealthBehavior(s) => s.rows.len(),
            AnalysisResult::RemoteWork(s) => s.rows.len(),
            AnalysisResult::SelfTaught(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs analyses one at a time against a single data source.
pub struct Analyzer<'a> {
    source: &'a DataSource,
    settings: AnalysisSettings,
    refusal: Pattern,
    formal_training: Pattern,
}

impl<'a> Analyzer<'a> {
    /// Compile the configured patterns.
    pub fn new(source: &'a DataSource, settings: AnalysisSettings) -> Result<Self, AnalysisError> {
        let refusal = compile(&settings.refusal_pattern, false)?;
        let formal_training = compile(&settings.formal_training_pattern, true)?;
        debug!(
            "Refusal pattern /{}/, formal training pattern /{}/i",
            refusal.as_str(),
            formal_training.as_str()
        );

        Ok(Self {
            source,
            settings,
            refusal,
            formal_training,
        })
    }

    /// Run one analysis to completion.
    pub async fn run(&self, task: Task) -> Result<AnalysisResult> {
        info!("Running analysis: {}", task.title());

        let result = match task {
            Task::TechStack => {
                let records = self
                    .source
                    .run_aggregation(&tech_stack::age_filter(), tech_stack::AGE_PROJECTION)
                    .await?;
                AnalysisResult::TechStack(tech_stack::summarize_by_age(&records)?)
            }
            Task::CountryStack => {
                let filter = tech_stack::country_filter(&self.settings.countries);
                let records = self
                    .source
                    .run_aggregation(&filter, tech_stack::COUNTRY_PROJECTION)
                    .await?;
                AnalysisResult::CountryStack(tech_stack::summarize_by_country(
                    &records,
                    self.settings.country_limit,
                )?)
            }
            Task::MentalHealth => {
                let records = self
                    .source
                    .run_aggregation(
                        &mental_health::demographic_filter(),
                        mental_health::DEMOGRAPHIC_PROJECTION,
                    )
                    .await?;
                AnalysisResult::MentalHealth(mental_health::summarize_demographics(
                    &records,
                    self.settings.demographic_limit,
                )?)
            }
            Task::MentalHealthBehavior => {
                let filter = mental_health::behavior_filter(&self.refusal);
                let records = self
                    .source
                    .run_aggregation(&filter, mental_health::BEHAVIOR_PROJECTION)
                    .await?;
                AnalysisResult::MentalHealthBehavior(mental_health::summarize_behavior(
                    &records,
                    self.settings.behavior_limit,
                )?)
            }
            Task::RemoteWork => {
                let records = self
                    .source
                    .run_aggregation(&remote_work::filter(), remote_work::PROJECTION)
                    .await?;
                AnalysisResult::RemoteWork(remote_work::summarize(&records)?)
            }
            Task::SelfTaught => {
                let records = self
                    .source
                    .run_aggregation(
                        &self_taught::filter(&self.formal_training),
                        self_taught::PROJECTION,
                    )
                    .await?;
                let population = self
                    .source
                    .count(&self_taught::population_filter())
                    .await
                    .context("Failed to count the professional population")?;
                AnalysisResult::SelfTaught(self_taught::outcome(records.len(), population)?)
            }
        };

        if let Some(stats) = result.stats() {
            debug!(
                "{}: {} records scanned, {} unbucketed, {} rows",
                task.slug(),
                stats.scanned,
                stats.unbucketed,
                result.len()
            );
        }

        Ok(result)
    }
}

fn compile(pattern: &str, case_insensitive: bool) -> Result<Pattern, AnalysisError> {
    Pattern::new(pattern, case_insensitive).map_err(|e| AnalysisError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceSettings;
    use std::path::PathBuf;

    fn fixture_source() -> DataSource {
        let settings = SourceSettings {
            file: Some(PathBuf::from(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/fixtures/survey_sample.csv"
            ))),
            ..Default::default()
        };
        tokio_test::block_on(DataSource::connect(&settings)).unwrap()
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let source = fixture_source();
        let settings = AnalysisSettings {
            refusal_pattern: "(unclosed".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Analyzer::new(&source, settings),
            Err(AnalysisError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_every_task_runs_on_fixture() {
        let source = fixture_source();
        let analyzer = Analyzer::new(&source, AnalysisSettings::default()).unwrap();
        for task in Task::ALL {
            let result = tokio_test::block_on(analyzer.run(task)).unwrap();
            assert_eq!(result.task(), task);
        }
    }

    #[test]
    fn test_fixture_remote_work() {
        let source = fixture_source();
        let analyzer = Analyzer::new(&source, AnalysisSettings::default()).unwrap();
        let result = tokio_test::block_on(analyzer.run(Task::RemoteWork)).unwrap();

        let AnalysisResult::RemoteWork(summary) = result else {
            panic!("unexpected result");
        };
        // Eight professional full-time remote/hybrid developers; one
        // declined to give an age.
        assert_eq!(summary.stats.scanned, 8);
        assert_eq!(summary.stats.unbucketed, 1);
        let total: usize = summary.rows.iter().map(|r| r.respondents).sum();
        assert_eq!(total, 7);
    }

    #[test]
    fn test_fixture_country_stack() {
        let source = fixture_source();
        let analyzer = Analyzer::new(&source, AnalysisSettings::default()).unwrap();
        let result = tokio_test::block_on(analyzer.run(Task::CountryStack)).unwrap();

        let AnalysisResult::CountryStack(summary) = result else {
            panic!("unexpected result");
        };
        let allow = default_countries();
        assert_eq!(summary.rows.len(), 5);
        assert!(summary.rows.iter().all(|row| allow.contains(&row.country)));
        // Canada, India and the USA tie on two respondents each.
        assert_eq!(summary.rows[0].country, "Canada");
        assert_eq!(summary.rows[0].dominant.stack, "C#;ASP.NET Core");

        let usa = summary
            .rows
            .iter()
            .find(|row| row.country == "United States of America")
            .unwrap();
        assert_eq!(usa.respondents, 2);
        assert_eq!(usa.dominant.stack, "JavaScript;React.js");
        assert_eq!(usa.dominant.mean_compensation, 140000.0);
    }

    #[test]
    fn test_fixture_self_taught() {
        let source = fixture_source();
        let analyzer = Analyzer::new(&source, AnalysisSettings::default()).unwrap();
        let result = tokio_test::block_on(analyzer.run(Task::SelfTaught)).unwrap();

        let AnalysisResult::SelfTaught(outcome) = result else {
            panic!("unexpected result");
        };
        assert_eq!(outcome.population, 9);
        assert_eq!(outcome.self_taught, 7);
    }

    #[test]
    fn test_task_slugs_are_unique() {
        let mut slugs: Vec<_> = Task::ALL.iter().map(Task::slug).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), Task::ALL.len());
    }
}
