//! Mental-health impact by demographic.

use super::aggregator::{group_rows, percentage, top_n};
use super::derive::{bucket_records, cross_product, split_tokens, token_count};
use super::{AnalysisError, NO_MENTAL_HEALTH_ISSUE, STRONG_INFLUENCE_MARKER};
use crate::models::{AgeGroup, Field, QueryStats, SurveyResponse};
use crate::source::{Pattern, RecordFilter};
use serde::{Deserialize, Serialize};

pub const DEMOGRAPHIC_PROJECTION: &[Field] = &[
    Field::MentalHealth,
    Field::Age,
    Field::Gender,
    Field::Ethnicity,
];

pub const BEHAVIOR_PROJECTION: &[Field] = &[
    Field::MentalHealth,
    Field::Gender,
    Field::Ethnicity,
    Field::CodingActivities,
    Field::PurchaseInfluence,
];

/// Coding activities a respondent must exceed to count as highly engaged.
pub const ENGAGED_ACTIVITY_THRESHOLD: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicImpact {
    pub age_group: AgeGroup,
    pub gender: String,
    pub ethnicity: String,
    pub respondents: usize,
    pub with_issues: usize,
    pub issue_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentalHealthSummary {
    pub rows: Vec<DemographicImpact>,
    pub stats: QueryStats,
}

/// Issue split among engaged, purchase-influential respondents of one
/// gender/ethnicity group.
///
/// Both likely counts are subsets of `respondents` and share it as their
/// denominator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorImpact {
    pub gender: String,
    pub ethnicity: String,
    pub respondents: usize,
    pub likely_issues: usize,
    pub likely_no_issues: usize,
    pub likely_issue_percentage: f64,
    pub likely_no_issue_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSummary {
    pub rows: Vec<BehaviorImpact>,
    pub stats: QueryStats,
}

pub fn demographic_filter() -> RecordFilter {
    RecordFilter::present(DEMOGRAPHIC_PROJECTION)
}

/// Respondents with mental-health, gender and ethnicity answers, minus
/// refusals and free-text answers.
pub fn behavior_filter(refusal: &Pattern) -> RecordFilter {
    RecordFilter::present(&[Field::MentalHealth, Field::Gender, Field::Ethnicity])
        .and(RecordFilter::NotMatching(Field::Gender, refusal.clone()))
        .and(RecordFilter::NotMatching(Field::Ethnicity, refusal.clone()))
}

fn has_issue(record: &SurveyResponse) -> bool {
    record.mental_health.as_deref() != Some(NO_MENTAL_HEALTH_ISSUE)
}

/// Engaged in several coding activities and holds real purchase influence.
fn is_engaged_buyer(record: &SurveyResponse) -> bool {
    let activities = token_count(record.coding_activities.as_deref());
    let influential = record
        .purchase_influence
        .as_deref()
        .is_some_and(|p| p.contains(STRONG_INFLUENCE_MARKER));
    activities > ENGAGED_ACTIVITY_THRESHOLD && influential
}

/// Expand a record into one (gender, ethnicity) row per selected pair.
fn demographic_pairs(record: &SurveyResponse) -> Vec<(String, String)> {
    let genders = split_tokens(record.gender.as_deref().unwrap_or_default());
    let ethnicities = split_tokens(record.ethnicity.as_deref().unwrap_or_default());
    cross_product(&genders, &ethnicities)
        .into_iter()
        .map(|(g, e)| (g.to_string(), e.to_string()))
        .collect()
}

/// Share of respondents reporting an issue per age group, gender and
/// ethnicity. Largest groups first; `limit` rows at most.
pub fn summarize_demographics(
    records: &[SurveyResponse],
    limit: usize,
) -> Result<MentalHealthSummary, AnalysisError> {
    let mut stats = QueryStats {
        scanned: records.len(),
        ..Default::default()
    };

    let rows = bucket_records(records, &mut stats)
        .into_iter()
        .flat_map(|(group, record)| {
            let issue = has_issue(record);
            demographic_pairs(record)
                .into_iter()
                .map(move |(gender, ethnicity)| ((group, gender, ethnicity), issue))
        });

    let mut impacts = Vec::new();
    for ((age_group, gender, ethnicity), issues) in group_rows(rows) {
        let respondents = issues.len();
        let with_issues = issues.iter().filter(|&&issue| issue).count();
        impacts.push(DemographicImpact {
            age_group,
            gender,
            ethnicity,
            respondents,
            with_issues,
            issue_percentage: percentage(with_issues, respondents)?,
        });
    }

    // Stable sort: equal counts keep the group-key order.
    impacts.sort_by(|a, b| {
        b.respondents
            .cmp(&a.respondents)
            .then_with(|| b.with_issues.cmp(&a.with_issues))
    });

    Ok(MentalHealthSummary {
        rows: top_n(impacts, limit),
        stats,
    })
}

/// Issue split among engaged buyers per gender and ethnicity, ranked by
/// likely issues. `limit` rows at most.
pub fn summarize_behavior(
    records: &[SurveyResponse],
    limit: usize,
) -> Result<BehaviorSummary, AnalysisError> {
    let stats = QueryStats {
        scanned: records.len(),
        ..Default::default()
    };

    let rows = records.iter().flat_map(|record| {
        let profile = (is_engaged_buyer(record), has_issue(record));
        demographic_pairs(record)
            .into_iter()
            .map(move |key| (key, profile))
    });

    let mut impacts = Vec::new();
    for ((gender, ethnicity), profiles) in group_rows(rows) {
        let respondents = profiles.len();
        let likely_issues = profiles.iter().filter(|&&(gate, issue)| gate && issue).count();
        let likely_no_issues = profiles.iter().filter(|&&(gate, issue)| gate && !issue).count();
        impacts.push(BehaviorImpact {
            gender,
            ethnicity,
            respondents,
            likely_issues,
            likely_no_issues,
            likely_issue_percentage: percentage(likely_issues, respondents)?,
            likely_no_issue_percentage: percentage(likely_no_issues, respondents)?,
        });
    }

    impacts.sort_by(|a, b| {
        b.likely_issues
            .cmp(&a.likely_issues)
            .then_with(|| b.respondents.cmp(&a.respondents))
    });

    Ok(BehaviorSummary {
        rows: top_n(impacts, limit),
        stats,
    })
}
