//! Derived fields: age buckets, multi-select tokens, experience years.

use super::AnalysisError;
use crate::models::{AgeGroup, QueryStats, SurveyResponse};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Separator of multi-select answers.
pub const MULTI_SELECT_DELIMITER: char = ';';

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"));

/// First maximal run of ASCII digits, as a number.
pub fn extract_age(text: &str) -> Option<u32> {
    DIGIT_RUN
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Bucket a free-text age ("25-34 years old", "Under 18 years old").
pub fn age_group(text: &str) -> Result<AgeGroup, AnalysisError> {
    extract_age(text)
        .map(AgeGroup::from_age)
        .ok_or_else(|| AnalysisError::UnbucketableAge(text.to_string()))
}

/// Pair every record with its age group.
///
/// Records without a bucketable age are dropped and counted in `stats`.
pub fn bucket_records<'a>(
    records: &'a [SurveyResponse],
    stats: &mut QueryStats,
) -> Vec<(AgeGroup, &'a SurveyResponse)> {
    let mut bucketed = Vec::with_capacity(records.len());

    for record in records {
        let text = record.age.as_deref().unwrap_or_default();
        match age_group(text) {
            Ok(group) => bucketed.push((group, record)),
            Err(e) => {
                debug!("Dropping record: {}", e);
                stats.unbucketed += 1;
            }
        }
    }

    bucketed
}

/// Split a multi-select answer into trimmed, non-empty tokens.
pub fn split_tokens(text: &str) -> Vec<&str> {
    text.split(MULTI_SELECT_DELIMITER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Number of tokens in an optional multi-select answer.
pub fn token_count(text: Option<&str>) -> usize {
    text.map_or(0, |t| split_tokens(t).len())
}

/// Every pairing of one left token with one right token, left-major.
pub fn cross_product<'a>(left: &[&'a str], right: &[&'a str]) -> Vec<(&'a str, &'a str)> {
    left.iter()
        .flat_map(|l| right.iter().map(move |r| (*l, *r)))
        .collect()
}

/// Years of professional experience as a number.
///
/// The survey encodes the extremes as text. Only finite, non-negative
/// values are accepted.
pub fn years_of_experience(text: &str) -> Option<f64> {
    match text.trim() {
        "Less than 1 year" => Some(0.0),
        "More than 50 years" => Some(50.0),
        other => match other.parse::<f64>() {
            Ok(years) => Some(years).filter(|y| y.is_finite() && *y >= 0.0),
            Err(_) => extract_age(other).map(f64::from),
        },
    }
}
