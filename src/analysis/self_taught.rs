//! Self-taught versus formally trained developers.
//!
//! A developer counts as self-taught when none of their learning methods
//! match the formal-education pattern (bootcamps, schools, certificates).

use super::aggregator::percentage;
use super::{AnalysisError, FORMER_DEVELOPER, FULL_TIME, PROFESSIONAL_DEVELOPER};
use crate::models::Field;
use crate::source::{Pattern, RecordFilter};
use serde::{Deserialize, Serialize};

pub const PROJECTION: &[Field] = &[
    Field::MainBranch,
    Field::Employment,
    Field::LearnCode,
    Field::Country,
    Field::YearsCodePro,
];

/// Self-taught developers against the full-time professional population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfTaughtOutcome {
    pub self_taught: usize,
    pub population: u64,
    pub share_percentage: f64,
}

/// Current or former professional developers in full-time employment.
pub fn population_filter() -> RecordFilter {
    RecordFilter::one_of(Field::MainBranch, [PROFESSIONAL_DEVELOPER, FORMER_DEVELOPER])
        .and(RecordFilter::equals(Field::Employment, FULL_TIME))
}

/// The population, narrowed to respondents without formal training.
pub fn filter(formal_training: &Pattern) -> RecordFilter {
    population_filter()
        .and(RecordFilter::Present(Field::LearnCode))
        .and(RecordFilter::NotMatching(Field::LearnCode, formal_training.clone()))
}

/// Share of the population that is self-taught. An empty population is an
/// invalid state rather than a zero share.
pub fn outcome(self_taught: usize, population: u64) -> Result<SelfTaughtOutcome, AnalysisError> {
    let population_size = usize::try_from(population).map_err(|_| {
        AnalysisError::InvalidAggregationState(format!("population {} too large", population))
    })?;

    Ok(SelfTaughtOutcome {
        self_taught,
        population,
        share_percentage: percentage(self_taught, population_size)?,
    })
}
