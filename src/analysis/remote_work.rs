//! Compensation of remote and hybrid professional developers.

use super::aggregator::{group_rows, MeanAccumulator};
use super::derive::{bucket_records, years_of_experience};
use super::{AnalysisError, FULLY_REMOTE, FULL_TIME, HYBRID, PROFESSIONAL_DEVELOPER};
use crate::models::{AgeGroup, Field, QueryStats, SurveyResponse};
use crate::source::RecordFilter;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const PROJECTION: &[Field] = &[
    Field::MainBranch,
    Field::Employment,
    Field::RemoteWork,
    Field::Age,
    Field::YearsCodePro,
    Field::ConvertedCompYearly,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCompensation {
    pub age_group: AgeGroup,
    pub remote_work: String,
    pub respondents: usize,
    pub mean_compensation: f64,
    pub mean_years_experience: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteWorkSummary {
    pub rows: Vec<RemoteCompensation>,
    pub stats: QueryStats,
}

pub fn filter() -> RecordFilter {
    RecordFilter::equals(Field::MainBranch, PROFESSIONAL_DEVELOPER)
        .and(RecordFilter::equals(Field::Employment, FULL_TIME))
        .and(RecordFilter::one_of(Field::RemoteWork, [FULLY_REMOTE, HYBRID]))
        .and(RecordFilter::present(&[
            Field::Age,
            Field::YearsCodePro,
            Field::ConvertedCompYearly,
        ]))
}

/// Mean pay and experience per age group and remote-work arrangement,
/// ordered by age group and then arrangement name.
pub fn summarize(records: &[SurveyResponse]) -> Result<RemoteWorkSummary, AnalysisError> {
    let mut stats = QueryStats {
        scanned: records.len(),
        ..Default::default()
    };

    let rows = bucket_records(records, &mut stats)
        .into_iter()
        .filter_map(|(group, record)| {
            let remote = record.remote_work.clone()?;
            let salary = record.converted_comp_yearly?;
            let raw_years = record.years_code_pro.as_deref()?;
            let Some(years) = years_of_experience(raw_years) else {
                debug!("Dropping record with unreadable experience {:?}", raw_years);
                return None;
            };
            Some(((group, remote), (salary, years)))
        });

    let mut summaries = Vec::new();
    for ((age_group, remote_work), values) in group_rows(rows) {
        let pay: MeanAccumulator = values.iter().map(|(salary, _)| *salary).collect();
        let experience: MeanAccumulator = values.iter().map(|(_, years)| *years).collect();
        summaries.push(RemoteCompensation {
            age_group,
            remote_work,
            respondents: pay.count,
            mean_compensation: pay.mean()?,
            mean_years_experience: experience.mean()?,
        });
    }

    Ok(RemoteWorkSummary {
        rows: summaries,
        stats,
    })
}
