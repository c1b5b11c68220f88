//! Technology stack versus compensation.
//!
//! Two views: the best-paid stack combinations per age group, and the most
//! and least common language/web-framework pairing in each of a fixed set
//! of countries.

use super::aggregator::{descending, group_rows, top_n, MeanAccumulator};
use super::derive::{bucket_records, cross_product, split_tokens, MULTI_SELECT_DELIMITER};
use super::{AnalysisError, YEARLY};
use crate::models::{AgeGroup, Field, QueryStats, SurveyResponse};
use crate::source::RecordFilter;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Columns read by the per-age-group query.
pub const AGE_PROJECTION: &[Field] = &[
    Field::Age,
    Field::ConvertedCompYearly,
    Field::LanguageHaveWorkedWith,
    Field::DatabaseHaveWorkedWith,
    Field::WebframeHaveWorkedWith,
];

/// Columns read by the per-country query.
pub const COUNTRY_PROJECTION: &[Field] = &[
    Field::Country,
    Field::CompFreq,
    Field::ConvertedCompYearly,
    Field::LanguageHaveWorkedWith,
    Field::WebframeHaveWorkedWith,
];

/// One language/database/web-framework combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackPick {
    pub languages: Vec<String>,
    pub databases: Vec<String>,
    pub webframes: Vec<String>,
    pub respondents: usize,
    pub mean_compensation: f64,
}

/// Best and runner-up stack for an age group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroupStack {
    pub age_group: AgeGroup,
    pub top: StackPick,
    /// Absent when the age group has a single distinct stack.
    pub second: Option<StackPick>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechStackSummary {
    pub rows: Vec<AgeGroupStack>,
    pub stats: QueryStats,
}

/// A language;webframe pairing within one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackShare {
    pub stack: String,
    pub respondents: usize,
    pub mean_compensation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryStack {
    pub country: String,
    /// Distinct respondents behind the country's stacks.
    pub respondents: usize,
    pub dominant: StackShare,
    pub least_dominant: StackShare,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryStackSummary {
    pub rows: Vec<CountryStack>,
    pub stats: QueryStats,
}

pub fn age_filter() -> RecordFilter {
    RecordFilter::present(AGE_PROJECTION)
}

pub fn country_filter(countries: &[String]) -> RecordFilter {
    RecordFilter::one_of(Field::Country, countries.iter().cloned())
        .and(RecordFilter::present(&[
            Field::LanguageHaveWorkedWith,
            Field::WebframeHaveWorkedWith,
            Field::ConvertedCompYearly,
        ]))
        .and(RecordFilter::equals(Field::CompFreq, YEARLY))
}

/// Top and second best-paid stack per age group.
///
/// Stacks are whole multi-select answers, compared by their trimmed tokens
/// so spacing around the delimiter does not split a stack. Within an age
/// group they are ranked by mean compensation, then respondent count, then
/// the stack text.
pub fn summarize_by_age(records: &[SurveyResponse]) -> Result<TechStackSummary, AnalysisError> {
    let mut stats = QueryStats {
        scanned: records.len(),
        ..Default::default()
    };

    let keyed = bucket_records(records, &mut stats)
        .into_iter()
        .filter_map(|(group, record)| {
            let key = (
                group,
                to_tokens(record.language_have_worked_with.as_deref()?),
                to_tokens(record.database_have_worked_with.as_deref()?),
                to_tokens(record.webframe_have_worked_with.as_deref()?),
            );
            Some((key, record.converted_comp_yearly?))
        });

    let mut by_age: BTreeMap<AgeGroup, Vec<(StackPick, String)>> = BTreeMap::new();
    for ((group, languages, databases, webframes), salaries) in group_rows(keyed) {
        let acc: MeanAccumulator = salaries.into_iter().collect();
        let sort_key = [&languages, &databases, &webframes]
            .map(|tokens| tokens.join(";"))
            .join("|");
        let pick = StackPick {
            languages,
            databases,
            webframes,
            respondents: acc.count,
            mean_compensation: acc.mean()?,
        };
        by_age.entry(group).or_default().push((pick, sort_key));
    }

    let rows = by_age
        .into_iter()
        .filter_map(|(age_group, mut picks)| {
            picks.sort_by(|(a, a_key), (b, b_key)| {
                descending(a.mean_compensation, b.mean_compensation)
                    .then_with(|| b.respondents.cmp(&a.respondents))
                    .then_with(|| a_key.cmp(b_key))
            });
            let mut ranked = picks.into_iter().map(|(pick, _)| pick);
            let top = ranked.next()?;
            Some(AgeGroupStack {
                age_group,
                top,
                second: ranked.next(),
            })
        })
        .collect();

    Ok(TechStackSummary { rows, stats })
}

/// Dominant and least dominant language;webframe pairing per country.
///
/// Each respondent contributes one row per language x webframe pairing.
/// Countries are ranked by distinct respondents and cut to `limit`.
pub fn summarize_by_country(
    records: &[SurveyResponse],
    limit: usize,
) -> Result<CountryStackSummary, AnalysisError> {
    let stats = QueryStats {
        scanned: records.len(),
        ..Default::default()
    };

    let mut respondents: BTreeMap<&str, usize> = BTreeMap::new();
    let mut rows = Vec::new();

    for record in records {
        let (Some(country), Some(languages), Some(webframes), Some(salary)) = (
            record.country.as_deref(),
            record.language_have_worked_with.as_deref(),
            record.webframe_have_worked_with.as_deref(),
            record.converted_comp_yearly,
        ) else {
            continue;
        };

        let pairs = cross_product(&split_tokens(languages), &split_tokens(webframes));
        if pairs.is_empty() {
            continue;
        }

        *respondents.entry(country).or_default() += 1;
        for (language, webframe) in pairs {
            let stack = format!("{}{}{}", language, MULTI_SELECT_DELIMITER, webframe);
            rows.push(((country, stack), salary));
        }
    }

    let mut by_country: BTreeMap<&str, Vec<StackShare>> = BTreeMap::new();
    for ((country, stack), salaries) in group_rows(rows) {
        let acc: MeanAccumulator = salaries.into_iter().collect();
        by_country.entry(country).or_default().push(StackShare {
            stack,
            respondents: acc.count,
            mean_compensation: acc.mean()?,
        });
    }

    let mut countries: Vec<CountryStack> = by_country
        .into_iter()
        .filter_map(|(country, stacks)| {
            let dominant = stacks.iter().min_by(|a, b| dominance(a, b))?.clone();
            let least_dominant = stacks.iter().min_by(|a, b| scarcity(a, b))?.clone();
            Some(CountryStack {
                country: country.to_string(),
                respondents: respondents.get(country).copied().unwrap_or_default(),
                dominant,
                least_dominant,
            })
        })
        .collect();

    countries.sort_by(|a, b| {
        b.respondents
            .cmp(&a.respondents)
            .then_with(|| a.country.cmp(&b.country))
    });

    Ok(CountryStackSummary {
        rows: top_n(countries, limit),
        stats,
    })
}

/// Most common first; ties go to the better paid, then the stack name.
fn dominance(a: &StackShare, b: &StackShare) -> Ordering {
    b.respondents
        .cmp(&a.respondents)
        .then_with(|| descending(a.mean_compensation, b.mean_compensation))
        .then_with(|| a.stack.cmp(&b.stack))
}

/// Least common first; ties go to the worse paid, then the stack name.
fn scarcity(a: &StackShare, b: &StackShare) -> Ordering {
    a.respondents
        .cmp(&b.respondents)
        .then_with(|| a.mean_compensation.total_cmp(&b.mean_compensation))
        .then_with(|| a.stack.cmp(&b.stack))
}

fn to_tokens(text: &str) -> Vec<String> {
    split_tokens(text).into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn respondent(age: &str, lang: &str, db: &str, web: &str, comp: f64) -> SurveyResponse {
        SurveyResponse {
            age: Some(age.to_string()),
            language_have_worked_with: Some(lang.to_string()),
            database_have_worked_with: Some(db.to_string()),
            webframe_have_worked_with: Some(web.to_string()),
            converted_comp_yearly: Some(comp),
            ..Default::default()
        }
    }

    fn in_country(country: &str, lang: &str, web: &str, comp: f64) -> SurveyResponse {
        SurveyResponse {
            country: Some(country.to_string()),
            comp_freq: Some(YEARLY.to_string()),
            language_have_worked_with: Some(lang.to_string()),
            webframe_have_worked_with: Some(web.to_string()),
            converted_comp_yearly: Some(comp),
            ..Default::default()
        }
    }

    #[test]
    fn test_top_and_second_per_age_group() {
        let records = vec![
            respondent("25-34 years old", "Rust;Go", "PostgreSQL", "Actix", 150000.0),
            respondent("25-34 years old", "Rust;Go", "PostgreSQL", "Actix", 130000.0),
            respondent("25-34 years old", "Python", "MySQL", "Django", 90000.0),
            respondent("25-34 years old", "PHP", "MySQL", "Laravel", 40000.0),
            respondent("18-24 years old", "JavaScript", "MongoDB", "React.js", 30000.0),
        ];

        let summary = summarize_by_age(&records).unwrap();
        assert_eq!(summary.stats.scanned, 5);
        assert_eq!(summary.rows.len(), 2);

        let young = &summary.rows[0];
        assert_eq!(young.age_group, AgeGroup::Under25);
        assert_eq!(young.top.languages, vec!["JavaScript"]);
        assert!(young.second.is_none());

        let mid = &summary.rows[1];
        assert_eq!(mid.age_group, AgeGroup::From25To35);
        assert_eq!(mid.top.languages, vec!["Rust", "Go"]);
        assert_eq!(mid.top.respondents, 2);
        assert_eq!(mid.top.mean_compensation, 140000.0);
        let second = mid.second.as_ref().unwrap();
        assert_eq!(second.languages, vec!["Python"]);
        assert_ne!(&mid.top, second);
    }

    #[test]
    fn test_equal_pay_breaks_ties_by_count_then_text() {
        let records = vec![
            respondent("30", "Zig", "SQLite", "None", 100000.0),
            respondent("30", "Ada", "SQLite", "None", 100000.0),
            respondent("30", "Go", "Redis", "Gin", 100000.0),
            respondent("30", "Go", "Redis", "Gin", 100000.0),
        ];

        let summary = summarize_by_age(&records).unwrap();
        let row = &summary.rows[0];
        assert_eq!(row.top.languages, vec!["Go"]);
        assert_eq!(row.second.as_ref().unwrap().languages, vec!["Ada"]);
    }

    #[test]
    fn test_spacing_variants_share_one_stack() {
        let records = vec![
            respondent("30", "Rust;Go", "Redis", "Axum", 120000.0),
            respondent("30", "Rust; Go", "Redis ", "Axum", 100000.0),
            respondent("30", "Python", "Redis", "Flask", 90000.0),
        ];

        let summary = summarize_by_age(&records).unwrap();
        let row = &summary.rows[0];
        assert_eq!(row.top.languages, vec!["Rust", "Go"]);
        assert_eq!(row.top.respondents, 2);
        assert_eq!(row.top.mean_compensation, 110000.0);
        let second = row.second.as_ref().unwrap();
        assert_eq!(second.languages, vec!["Python"]);
        assert_ne!(row.top.languages, second.languages);
    }

    #[test]
    fn test_unbucketable_ages_are_counted() {
        let records = vec![
            respondent("Prefer not to say", "Rust", "Redis", "Axum", 1.0),
            respondent("40", "Rust", "Redis", "Axum", 1.0),
        ];
        let summary = summarize_by_age(&records).unwrap();
        assert_eq!(summary.stats.unbucketed, 1);
        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].age_group, AgeGroup::From35To45);
    }

    #[test]
    fn test_country_dominant_and_least_dominant() {
        let records = vec![
            in_country("Germany", "Python;Rust", "Django", 70000.0),
            in_country("Germany", "Python", "Django;Flask", 80000.0),
            in_country("Germany", "Java", "Spring", 60000.0),
            in_country("India", "Java", "Spring", 20000.0),
        ];

        let summary = summarize_by_country(&records, 5).unwrap();
        assert_eq!(summary.rows.len(), 2);

        let germany = &summary.rows[0];
        assert_eq!(germany.country, "Germany");
        assert_eq!(germany.respondents, 3);
        assert_eq!(germany.dominant.stack, "Python;Django");
        assert_eq!(germany.dominant.respondents, 2);
        assert_eq!(germany.dominant.mean_compensation, 75000.0);
        // Three single-respondent stacks; the worst paid wins the tie.
        assert_eq!(germany.least_dominant.stack, "Java;Spring");

        let india = &summary.rows[1];
        assert_eq!(india.dominant, india.least_dominant);
    }

    #[test]
    fn test_country_limit_and_allow_list() {
        let allow: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect();
        let filter = country_filter(&allow);

        let mut records = Vec::new();
        for (i, country) in ["A", "B", "C", "D", "E", "F", "G"].iter().enumerate() {
            for _ in 0..=i {
                records.push(in_country(country, "Rust", "Axum", 1000.0));
            }
        }
        let matched: Vec<SurveyResponse> =
            records.into_iter().filter(|r| filter.matches(r)).collect();

        let summary = summarize_by_country(&matched, 5).unwrap();
        assert!(summary.rows.len() <= 5);
        assert!(summary.rows.iter().all(|row| allow.contains(&row.country)));
        assert_eq!(summary.rows[0].country, "E");

        let capped = summarize_by_country(&matched, 2).unwrap();
        assert_eq!(capped.rows.len(), 2);
    }

    #[test]
    fn test_country_filter_requires_yearly() {
        let filter = country_filter(&["Germany".to_string()]);
        let mut monthly = in_country("Germany", "Rust", "Axum", 1.0);
        monthly.comp_freq = Some("Monthly".to_string());
        assert!(!filter.matches(&monthly));
        assert!(filter.matches(&in_country("Germany", "Rust", "Axum", 1.0)));
    }
}
