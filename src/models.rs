//! Data models for the survey statistics tool.
//!
//! This module contains the survey record, the derived age group and the
//! report envelope shared by every analysis and renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal used by the survey export for "no answer".
pub const MISSING_SENTINEL: &str = "NA";

/// A column of the survey export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Age,
    ConvertedCompYearly,
    CompTotal,
    CompFreq,
    LanguageHaveWorkedWith,
    DatabaseHaveWorkedWith,
    WebframeHaveWorkedWith,
    CodingActivities,
    PurchaseInfluence,
    LearnCode,
    Gender,
    Ethnicity,
    MentalHealth,
    MainBranch,
    Employment,
    RemoteWork,
    YearsCodePro,
    Country,
}

impl Field {
    /// Every column the tool reads, in export order.
    pub const ALL: [Field; 18] = [
        Field::MainBranch,
        Field::Employment,
        Field::RemoteWork,
        Field::CodingActivities,
        Field::LearnCode,
        Field::YearsCodePro,
        Field::Country,
        Field::CompTotal,
        Field::CompFreq,
        Field::LanguageHaveWorkedWith,
        Field::DatabaseHaveWorkedWith,
        Field::WebframeHaveWorkedWith,
        Field::PurchaseInfluence,
        Field::ConvertedCompYearly,
        Field::Age,
        Field::Gender,
        Field::Ethnicity,
        Field::MentalHealth,
    ];

    /// Column name as it appears in the survey export and in the collection.
    pub fn column(&self) -> &'static str {
        match self {
            Field::Age => "Age",
            Field::ConvertedCompYearly => "ConvertedCompYearly",
            Field::CompTotal => "CompTotal",
            Field::CompFreq => "CompFreq",
            Field::LanguageHaveWorkedWith => "LanguageHaveWorkedWith",
            Field::DatabaseHaveWorkedWith => "DatabaseHaveWorkedWith",
            Field::WebframeHaveWorkedWith => "WebframeHaveWorkedWith",
            Field::CodingActivities => "CodingActivities",
            Field::PurchaseInfluence => "PurchaseInfluence",
            Field::LearnCode => "LearnCode",
            Field::Gender => "Gender",
            Field::Ethnicity => "Ethnicity",
            Field::MentalHealth => "MentalHealth",
            Field::MainBranch => "MainBranch",
            Field::Employment => "Employment",
            Field::RemoteWork => "RemoteWork",
            Field::YearsCodePro => "YearsCodePro",
            Field::Country => "Country",
        }
    }

    /// Whether the column holds a number rather than text.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Field::ConvertedCompYearly | Field::CompTotal)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// One survey respondent.
///
/// Every field is optional: an absent column, a null, an empty string and
/// the literal `"NA"` all decode to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SurveyResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_work: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coding_activities: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learn_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_code_pro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comp_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comp_freq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_have_worked_with: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_have_worked_with: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webframe_have_worked_with: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_influence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_comp_yearly: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mental_health: Option<String>,
}

impl SurveyResponse {
    /// Build a response from a raw column lookup.
    ///
    /// `lookup` returns the raw text of a column, if the column exists.
    /// Missing-value sentinels are normalized away and numeric columns are
    /// parsed; unparseable numbers are treated as missing.
    pub fn from_columns<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |field: Field| lookup(field.column()).and_then(|raw| clean_value(&raw));
        let number = |field: Field| {
            text(field)
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };

        Self {
            main_branch: text(Field::MainBranch),
            employment: text(Field::Employment),
            remote_work: text(Field::RemoteWork),
            coding_activities: text(Field::CodingActivities),
            learn_code: text(Field::LearnCode),
            years_code_pro: text(Field::YearsCodePro),
            country: text(Field::Country),
            comp_total: number(Field::CompTotal),
            comp_freq: text(Field::CompFreq),
            language_have_worked_with: text(Field::LanguageHaveWorkedWith),
            database_have_worked_with: text(Field::DatabaseHaveWorkedWith),
            webframe_have_worked_with: text(Field::WebframeHaveWorkedWith),
            purchase_influence: text(Field::PurchaseInfluence),
            converted_comp_yearly: number(Field::ConvertedCompYearly),
            age: text(Field::Age),
            gender: text(Field::Gender),
            ethnicity: text(Field::Ethnicity),
            mental_health: text(Field::MentalHealth),
        }
    }

    /// Text value of a column. Numeric columns have no text value.
    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Age => &self.age,
            Field::CompFreq => &self.comp_freq,
            Field::LanguageHaveWorkedWith => &self.language_have_worked_with,
            Field::DatabaseHaveWorkedWith => &self.database_have_worked_with,
            Field::WebframeHaveWorkedWith => &self.webframe_have_worked_with,
            Field::CodingActivities => &self.coding_activities,
            Field::PurchaseInfluence => &self.purchase_influence,
            Field::LearnCode => &self.learn_code,
            Field::Gender => &self.gender,
            Field::Ethnicity => &self.ethnicity,
            Field::MentalHealth => &self.mental_health,
            Field::MainBranch => &self.main_branch,
            Field::Employment => &self.employment,
            Field::RemoteWork => &self.remote_work,
            Field::YearsCodePro => &self.years_code_pro,
            Field::Country => &self.country,
            Field::ConvertedCompYearly | Field::CompTotal => return None,
        };
        value.as_deref()
    }

    /// Numeric value of a column. Text columns have no numeric value.
    pub fn number(&self, field: Field) -> Option<f64> {
        match field {
            Field::ConvertedCompYearly => self.converted_comp_yearly,
            Field::CompTotal => self.comp_total,
            _ => None,
        }
    }

    /// Whether the column holds a non-missing value.
    pub fn is_present(&self, field: Field) -> bool {
        if field.is_numeric() {
            self.number(field).is_some()
        } else {
            self.text(field).is_some()
        }
    }
}

/// Normalize a raw cell: trims whitespace and maps every missing-value
/// sentinel to `None`.
pub fn clean_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == MISSING_SENTINEL {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Age bucket derived from the free-text `Age` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "Under 25")]
    Under25,
    #[serde(rename = "25-35")]
    From25To35,
    #[serde(rename = "35-45")]
    From35To45,
    #[serde(rename = "45-55")]
    From45To55,
    #[serde(rename = "55+")]
    Over55,
}

impl AgeGroup {
    /// Bucket an age. Thresholds are tried in order and the first one that
    /// holds wins.
    pub fn from_age(age: u32) -> Self {
        if age <= 24 {
            AgeGroup::Under25
        } else if age <= 34 {
            AgeGroup::From25To35
        } else if age <= 44 {
            AgeGroup::From35To45
        } else if age <= 54 {
            AgeGroup::From45To55
        } else {
            AgeGroup::Over55
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Under25 => "Under 25",
            AgeGroup::From25To35 => "25-35",
            AgeGroup::From35To45 => "35-45",
            AgeGroup::From45To55 => "45-55",
            AgeGroup::Over55 => "55+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Counters every query reports next to its rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStats {
    /// Records that passed the query's filter.
    pub scanned: usize,
    /// Records dropped because their age could not be bucketed.
    pub unbucketed: usize,
}

/// Metadata about a report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Human-readable description of the data source.
    pub source: String,
    /// Date and time of the run.
    pub generated_at: DateTime<Utc>,
    /// Number of documents in the collection.
    pub total_records: u64,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |column| map.get(column).cloned()
    }

    #[test]
    fn test_clean_value_sentinels() {
        assert_eq!(clean_value("NA"), None);
        assert_eq!(clean_value(""), None);
        assert_eq!(clean_value("   "), None);
        assert_eq!(clean_value(" Rust "), Some("Rust".to_string()));
    }

    #[test]
    fn test_from_columns_parses_numbers() {
        let response = SurveyResponse::from_columns(lookup_from(&[
            ("Age", "25-34 years old"),
            ("ConvertedCompYearly", "85000"),
            ("CompTotal", "NA"),
            ("Country", "Germany"),
        ]));

        assert_eq!(response.age.as_deref(), Some("25-34 years old"));
        assert_eq!(response.converted_comp_yearly, Some(85000.0));
        assert_eq!(response.comp_total, None);
        assert_eq!(response.text(Field::Country), Some("Germany"));
        assert!(response.is_present(Field::ConvertedCompYearly));
        assert!(!response.is_present(Field::CompTotal));
        assert!(!response.is_present(Field::Gender));
    }

    #[test]
    fn test_unparseable_number_is_missing() {
        let response =
            SurveyResponse::from_columns(lookup_from(&[("ConvertedCompYearly", "lots")]));
        assert_eq!(response.converted_comp_yearly, None);
    }

    #[test]
    fn test_numeric_fields_have_no_text() {
        let response = SurveyResponse {
            converted_comp_yearly: Some(1.0),
            ..Default::default()
        };
        assert_eq!(response.text(Field::ConvertedCompYearly), None);
        assert_eq!(response.number(Field::ConvertedCompYearly), Some(1.0));
        assert_eq!(response.number(Field::Age), None);
    }

    #[test]
    fn test_age_group_boundaries() {
        for age in 0..=24 {
            assert_eq!(AgeGroup::from_age(age), AgeGroup::Under25);
        }
        assert_eq!(AgeGroup::from_age(25), AgeGroup::From25To35);
        assert_eq!(AgeGroup::from_age(34), AgeGroup::From25To35);
        assert_eq!(AgeGroup::from_age(35), AgeGroup::From35To45);
        assert_eq!(AgeGroup::from_age(44), AgeGroup::From35To45);
        assert_eq!(AgeGroup::from_age(45), AgeGroup::From45To55);
        assert_eq!(AgeGroup::from_age(54), AgeGroup::From45To55);
        assert_eq!(AgeGroup::from_age(55), AgeGroup::Over55);
        assert_eq!(AgeGroup::from_age(99), AgeGroup::Over55);
    }

    #[test]
    fn test_age_group_ordering_and_labels() {
        let ordered = vec![
            AgeGroup::Under25,
            AgeGroup::From25To35,
            AgeGroup::From35To45,
            AgeGroup::From45To55,
            AgeGroup::Over55,
        ];
        let mut sorted: Vec<AgeGroup> = ordered.iter().rev().copied().collect();
        sorted.sort();
        assert_eq!(sorted, ordered);
        assert_eq!(AgeGroup::Under25.to_string(), "Under 25");
        assert_eq!(
            serde_json::to_string(&AgeGroup::Over55).unwrap(),
            "\"55+\""
        );
    }

    #[test]
    fn test_serialize_uses_column_names() {
        let response = SurveyResponse {
            years_code_pro: Some("5".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"YearsCodePro":"5"}"#);
    }
}
