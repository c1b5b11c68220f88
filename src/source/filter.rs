//! Record filters.
//!
//! A [`RecordFilter`] is the `$match` stage of every query. It can be
//! evaluated against an in-memory [`SurveyResponse`] or translated into a
//! MongoDB query document and pushed down to the server. Both evaluations
//! agree: a missing column never equals, is never one of, and never matches
//! anything.

use crate::models::{Field, SurveyResponse, MISSING_SENTINEL};
use mongodb::bson::{doc, Bson, Document, Regex as BsonRegex};
use regex::{Regex, RegexBuilder};

/// A compiled text pattern that remembers how it was written so it can be
/// shipped to the document store unchanged.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    source: String,
    case_insensitive: bool,
}

impl Pattern {
    /// Compile a pattern.
    pub fn new(source: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            regex,
            source: source.to_string(),
            case_insensitive,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn to_bson(&self) -> Bson {
        let options = if self.case_insensitive { "i" } else { "" };
        Bson::RegularExpression(BsonRegex {
            pattern: self.source.clone(),
            options: options.to_string(),
        })
    }
}

/// Predicate over survey responses.
#[derive(Debug, Clone)]
pub enum RecordFilter {
    /// Every record.
    All,
    /// Column holds a non-missing value.
    Present(Field),
    /// Column equals the value exactly.
    Equals(Field, String),
    /// Column equals one of the values.
    OneOf(Field, Vec<String>),
    /// Column is missing or does not match the pattern.
    NotMatching(Field, Pattern),
    /// Every inner filter holds.
    And(Vec<RecordFilter>),
}

impl RecordFilter {
    /// All of the given columns are present.
    pub fn present(fields: &[Field]) -> Self {
        RecordFilter::And(fields.iter().copied().map(RecordFilter::Present).collect())
    }

    pub fn equals(field: Field, value: impl Into<String>) -> Self {
        RecordFilter::Equals(field, value.into())
    }

    pub fn one_of<I, S>(field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RecordFilter::OneOf(field, values.into_iter().map(Into::into).collect())
    }

    /// Conjunction of this filter and another, flattening nested `And`s.
    pub fn and(self, other: RecordFilter) -> Self {
        let mut clauses = Vec::new();
        for filter in [self, other] {
            match filter {
                RecordFilter::All => {}
                RecordFilter::And(inner) => clauses.extend(inner),
                single => clauses.push(single),
            }
        }
        RecordFilter::And(clauses)
    }

    /// Evaluate against a record.
    pub fn matches(&self, record: &SurveyResponse) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::Present(field) => record.is_present(*field),
            RecordFilter::Equals(field, value) => record.text(*field) == Some(value.as_str()),
            RecordFilter::OneOf(field, values) => record
                .text(*field)
                .is_some_and(|text| values.iter().any(|v| v == text)),
            RecordFilter::NotMatching(field, pattern) => record
                .text(*field)
                .map_or(true, |text| !pattern.is_match(text)),
            RecordFilter::And(filters) => filters.iter().all(|f| f.matches(record)),
        }
    }

    /// Translate into a MongoDB query document.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        match self {
            RecordFilter::All => {}
            RecordFilter::Present(field) => {
                document.insert(
                    field.column(),
                    doc! { "$exists": true, "$nin": [Bson::Null, MISSING_SENTINEL, ""] },
                );
            }
            RecordFilter::Equals(field, value) => {
                document.insert(field.column(), value.as_str());
            }
            RecordFilter::OneOf(field, values) => {
                document.insert(field.column(), doc! { "$in": values.clone() });
            }
            RecordFilter::NotMatching(field, pattern) => {
                document.insert(field.column(), doc! { "$not": pattern.to_bson() });
            }
            RecordFilter::And(filters) => {
                let clauses: Vec<Bson> = filters
                    .iter()
                    .map(|f| Bson::Document(f.to_document()))
                    .collect();
                if !clauses.is_empty() {
                    document.insert("$and", clauses);
                }
            }
        }
        document
    }

    /// Columns the filter reads.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, out: &mut Vec<Field>) {
        let field = match self {
            RecordFilter::All => return,
            RecordFilter::And(filters) => {
                for filter in filters {
                    filter.collect_fields(out);
                }
                return;
            }
            RecordFilter::Present(field)
            | RecordFilter::Equals(field, _)
            | RecordFilter::OneOf(field, _)
            | RecordFilter::NotMatching(field, _) => *field,
        };
        if !out.contains(&field) {
            out.push(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SurveyResponse {
        SurveyResponse {
            main_branch: Some("I am a developer by profession".to_string()),
            learn_code: Some("Books / Physical media;Coding Bootcamp".to_string()),
            converted_comp_yearly: Some(50000.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_present() {
        let r = record();
        assert!(RecordFilter::Present(Field::MainBranch).matches(&r));
        assert!(RecordFilter::Present(Field::ConvertedCompYearly).matches(&r));
        assert!(!RecordFilter::Present(Field::Age).matches(&r));
        assert!(!RecordFilter::present(&[Field::MainBranch, Field::Age]).matches(&r));
    }

    #[test]
    fn test_equals_and_one_of() {
        let r = record();
        assert!(RecordFilter::equals(Field::MainBranch, "I am a developer by profession").matches(&r));
        assert!(!RecordFilter::equals(Field::MainBranch, "I am a developer").matches(&r));
        assert!(RecordFilter::one_of(Field::MainBranch, ["x", "I am a developer by profession"])
            .matches(&r));
        assert!(!RecordFilter::one_of(Field::Country, ["Germany"]).matches(&r));
    }

    #[test]
    fn test_not_matching() {
        let r = record();
        let bootcamp = Pattern::new("bootcamp", true).unwrap();
        assert!(!RecordFilter::NotMatching(Field::LearnCode, bootcamp.clone()).matches(&r));
        // Missing columns never match a pattern.
        assert!(RecordFilter::NotMatching(Field::Gender, bootcamp).matches(&r));

        let sensitive = Pattern::new("bootcamp", false).unwrap();
        assert!(RecordFilter::NotMatching(Field::LearnCode, sensitive).matches(&r));
    }

    #[test]
    fn test_and_flattens() {
        let filter = RecordFilter::present(&[Field::Age, Field::Gender])
            .and(RecordFilter::All)
            .and(RecordFilter::equals(Field::Country, "India"));
        match &filter {
            RecordFilter::And(clauses) => assert_eq!(clauses.len(), 3),
            other => panic!("expected And, got {:?}", other),
        }
        assert_eq!(filter.fields(), vec![Field::Age, Field::Gender, Field::Country]);
    }

    #[test]
    fn test_to_document() {
        let pattern = Pattern::new("School|Bootcamp", true).unwrap();
        let filter = RecordFilter::Present(Field::Age)
            .and(RecordFilter::one_of(Field::RemoteWork, ["Fully remote"]))
            .and(RecordFilter::NotMatching(Field::LearnCode, pattern));

        let document = filter.to_document();
        let clauses = document.get_array("$and").unwrap();
        assert_eq!(clauses.len(), 3);

        let age = clauses[0].as_document().unwrap().get_document("Age").unwrap();
        assert_eq!(age.get_bool("$exists").unwrap(), true);

        let remote = clauses[1]
            .as_document()
            .unwrap()
            .get_document("RemoteWork")
            .unwrap();
        assert_eq!(remote.get_array("$in").unwrap().len(), 1);

        let learn = clauses[2]
            .as_document()
            .unwrap()
            .get_document("LearnCode")
            .unwrap();
        match learn.get("$not") {
            Some(Bson::RegularExpression(regex)) => {
                assert_eq!(regex.pattern, "School|Bootcamp");
                assert_eq!(regex.options, "i");
            }
            other => panic!("expected regex, got {:?}", other),
        }
    }

    #[test]
    fn test_all_is_empty_document() {
        assert!(RecordFilter::All.to_document().is_empty());
        assert!(RecordFilter::All.matches(&SurveyResponse::default()));
    }
}
