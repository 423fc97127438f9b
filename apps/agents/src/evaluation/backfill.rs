//! Schema back-fill.
//!
//! Turns whatever the extractor recovered (or nothing at all) into complete,
//! schema-conformant sections. Each field takes the first alias holding a
//! non-null value, kept exactly as the model wrote it; only `rating` is
//! coerced. Otherwise the documented default from
//! [`super::schema`] is used and its dotted path is recorded, so a stored record
//! always tells real answers apart from placeholders.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::keywords::{coerce_rating, TextScan, DEFAULT_RATING};
use super::schema::{Fallback, FieldSpec, Section, ALL_SECTIONS};
use crate::extraction::JsonObject;

/// Where a record's section values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseSource {
    Structured,
    TextFallback,
}

#[derive(Debug, Clone)]
pub struct BackfillOutcome {
    /// Section key → completed section object.
    pub sections: JsonObject,
    /// Dotted paths (`candidate_rating.strengths`) filled from the default table.
    pub backfilled: Vec<String>,
    pub source: ParseSource,
}

impl BackfillOutcome {
    pub fn section(&self, section: Section) -> Option<&Value> {
        self.sections.get(section.key())
    }

    pub fn rating(&self) -> i64 {
        self.section(Section::CandidateRating)
            .and_then(|s| s.get("rating"))
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_RATING)
    }

    /// Folds another section outcome into this one. The merged record counts as
    /// a text fallback when any part of it was.
    pub fn merge(&mut self, other: BackfillOutcome) {
        self.sections.extend(other.sections);
        self.backfilled.extend(other.backfilled);
        if other.source == ParseSource::TextFallback {
            self.source = ParseSource::TextFallback;
        }
    }

    /// Sections plus the provenance fields, ready to patch onto a record.
    pub fn into_patch(self) -> Result<JsonObject, serde_json::Error> {
        let mut patch = self.sections;
        patch.insert("parse_source".into(), serde_json::to_value(self.source)?);
        patch.insert("backfilled_fields".into(), serde_json::to_value(self.backfilled)?);
        Ok(patch)
    }

    /// Candidate name the model read from the résumé, when it found one.
    pub fn candidate_name(&self) -> Option<String> {
        self.section(Section::ResumeParsing)?
            .pointer("/personal_info/name")?
            .as_str()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

/// Back-fills every section from a combined answer.
///
/// A section is read from its nested object when the answer has one; otherwise
/// sections that allow it read their aliases from the top level of the answer.
/// With no parsed answer, fields come from a keyword scan of `raw` or the
/// default table.
pub fn backfill_evaluation(parsed: Option<&JsonObject>, raw: &str) -> BackfillOutcome {
    let scan = parsed.is_none().then(|| TextScan::of(raw));
    let mut sections = JsonObject::new();
    let mut backfilled = Vec::new();

    for section in ALL_SECTIONS {
        let scope = parsed.and_then(|answer| match nested_section(answer, section) {
            Some(nested) => Some(Scope::Owned(nested)),
            None if section.flat_lookup() => Some(Scope::Shared(answer)),
            None => None,
        });
        let filled = fill_section(section, scope, scan.as_ref(), raw, &mut backfilled);
        sections.insert(section.key().to_string(), Value::Object(filled));
    }

    BackfillOutcome {
        sections,
        backfilled,
        source: source_of(parsed),
    }
}

/// Back-fills one section from an answer whose top-level keys are that
/// section's own keys. An answer that nests the section under one of its
/// source keys is unwrapped first.
pub fn backfill_section(section: Section, parsed: Option<&JsonObject>, raw: &str) -> BackfillOutcome {
    let scan = parsed.is_none().then(|| TextScan::of(raw));
    let scope = parsed.map(|answer| Scope::Owned(nested_section(answer, section).unwrap_or(answer)));
    let mut backfilled = Vec::new();
    let filled = fill_section(section, scope, scan.as_ref(), raw, &mut backfilled);

    let mut sections = JsonObject::new();
    sections.insert(section.key().to_string(), Value::Object(filled));
    BackfillOutcome {
        sections,
        backfilled,
        source: source_of(parsed),
    }
}

/// Object a field lookup reads from.
enum Scope<'a> {
    /// Belongs to the section: unrecognized keys are carried over.
    Owned(&'a JsonObject),
    /// Top level of a combined answer, shared by several sections.
    Shared(&'a JsonObject),
}

impl<'a> Scope<'a> {
    fn object(&self) -> &'a JsonObject {
        match self {
            Self::Owned(object) | Self::Shared(object) => object,
        }
    }
}

fn source_of(parsed: Option<&JsonObject>) -> ParseSource {
    if parsed.is_some() {
        ParseSource::Structured
    } else {
        ParseSource::TextFallback
    }
}

fn nested_section(answer: &JsonObject, section: Section) -> Option<&JsonObject> {
    section
        .source_keys()
        .iter()
        .find_map(|key| answer.get(*key).and_then(Value::as_object))
}

fn fill_section(
    section: Section,
    scope: Option<Scope<'_>>,
    scan: Option<&TextScan>,
    raw: &str,
    backfilled: &mut Vec<String>,
) -> JsonObject {
    let mut out = JsonObject::new();
    let mut consumed = HashSet::new();
    let mut rating = None;

    for field in section.fields() {
        let found = scope.as_ref().and_then(|scope| match scope {
            Scope::Owned(object) => find_value(object, field, |_| true),
            Scope::Shared(object) => find_value(object, field, |alias| !section.alias_is_shared(alias)),
        });

        let value = match found {
            Some((alias, value)) => {
                consumed.insert(root_key(alias));
                value
            }
            None => {
                let (value, placeholder) = fallback_value(field.fallback, scan, rating);
                if placeholder {
                    backfilled.push(format!("{}.{}", section.key(), field.path));
                }
                value
            }
        };

        if matches!(field.fallback, Fallback::Rating) {
            rating = value.as_i64();
        }
        set_path(&mut out, field.path, value);
    }

    if let Some(Scope::Owned(object)) = scope {
        for (key, value) in object {
            if !consumed.contains(key.as_str()) && !out.contains_key(key) {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    if let Some(raw_key) = section.raw_key() {
        out.insert(raw_key.to_string(), Value::String(raw.to_string()));
    }

    out
}

fn find_value(
    object: &JsonObject,
    field: &FieldSpec,
    usable: impl Fn(&str) -> bool,
) -> Option<(&'static str, Value)> {
    field
        .aliases
        .iter()
        .filter(|alias| usable(alias))
        .find_map(|alias| {
            let value = lookup(object, alias)?;
            accept(field, alias, value).map(|accepted| (*alias, accepted))
        })
}

/// The model's value as written. Ratings are coerced to an integer, and an
/// alias that names the parent object of another alias only matches a leaf.
fn accept(field: &FieldSpec, alias: &str, value: &Value) -> Option<Value> {
    if matches!(field.fallback, Fallback::Rating) {
        return coerce_rating(value).map(Value::from);
    }
    if value.is_object() && is_container_alias(field, alias) {
        return None;
    }
    Some(value.clone())
}

fn is_container_alias(field: &FieldSpec, alias: &str) -> bool {
    field.aliases.iter().any(|other| {
        other
            .strip_prefix(alias)
            .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// Returns the default value and whether it is a placeholder.
fn fallback_value(fallback: Fallback, scan: Option<&TextScan>, rating: Option<i64>) -> (Value, bool) {
    match fallback {
        Fallback::Text(text) => (Value::from(text), true),
        Fallback::List(items) => (Value::from(items.to_vec()), true),
        Fallback::Skills(category) => {
            let found = scan.map(|scan| scan.skills_in(category)).unwrap_or_default();
            let placeholder = found.is_empty();
            (Value::from(found), placeholder)
        }
        Fallback::Rating => match scan.and_then(|scan| scan.rating) {
            Some(scanned) => (Value::from(scanned), false),
            None => (Value::from(DEFAULT_RATING), true),
        },
        Fallback::RatingReasoning => {
            let rating = rating.unwrap_or(DEFAULT_RATING);
            (
                Value::String(format!("Candidate evaluation completed with rating of {rating}/5")),
                true,
            )
        }
    }
}

fn root_key(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

fn lookup<'a>(object: &'a JsonObject, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = object.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    (!current.is_null()).then_some(current)
}

fn set_path(object: &mut JsonObject, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            object.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = object
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(JsonObject::new()));
            if !child.is_object() {
                *child = Value::Object(JsonObject::new());
            }
            if let Value::Object(child) = child {
                set_path(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::schema::CORE_SECTIONS;
    use crate::extraction::extract_json_object;
    use serde_json::json;

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().expect("object literal")
    }

    fn assert_all_paths_present(outcome: &BackfillOutcome, sections: &[Section]) {
        for section in sections {
            let filled = outcome.section(*section).expect("section present");
            for field in section.fields() {
                let pointer = format!("/{}", field.path.replace('.', "/"));
                assert!(
                    filled.pointer(&pointer).is_some(),
                    "{} missing {}",
                    section.key(),
                    field.path
                );
            }
            if let Some(raw_key) = section.raw_key() {
                assert!(filled.get(raw_key).is_some());
            }
        }
    }

    #[test]
    fn test_rating_only_answer_gains_defaults() {
        let parsed = object(json!({"rating": 2}));
        let outcome = backfill_section(Section::CandidateRating, Some(&parsed), "{\"rating\": 2}");
        let rating = outcome.section(Section::CandidateRating).unwrap();

        assert_eq!(rating["rating"], json!(2));
        assert_eq!(rating["strengths"], json!([]));
        assert_eq!(rating["weaknesses"], json!([]));
        assert_eq!(
            rating["reasoning"],
            json!("Candidate evaluation completed with rating of 2/5")
        );
        assert_eq!(rating["raw_rating"], json!("{\"rating\": 2}"));
        assert!(outcome.backfilled.contains(&"candidate_rating.strengths".to_string()));
        assert!(!outcome.backfilled.contains(&"candidate_rating.rating".to_string()));
        assert_eq!(outcome.source, ParseSource::Structured);
    }

    #[test]
    fn test_fenced_answer_end_to_end() {
        let raw = "Sure, here is the result: ```json\n{\"rating\": 5, \"reasoning\": \"Great fit\"}\n```";
        let parsed = extract_json_object(raw);
        let outcome = backfill_section(Section::CandidateRating, parsed.as_ref(), raw);
        let rating = outcome.section(Section::CandidateRating).unwrap();

        assert_eq!(rating["rating"], json!(5));
        assert_eq!(rating["reasoning"], json!("Great fit"));
        assert_eq!(rating["strengths"], json!([]));
        assert_eq!(rating["weaknesses"], json!([]));
        assert_eq!(rating["job_fit"], json!("Candidate shows potential for the role"));
    }

    #[test]
    fn test_text_fallback_reads_rating_from_prose() {
        let raw = "The candidate rating: 4 out of 5 based on strong experience";
        let parsed = extract_json_object(raw);
        assert!(parsed.is_none());

        let outcome = backfill_evaluation(parsed.as_ref(), raw);
        assert_eq!(outcome.source, ParseSource::TextFallback);
        assert_eq!(outcome.rating(), 4);
        assert!(!outcome.backfilled.contains(&"candidate_rating.rating".to_string()));
        assert_all_paths_present(&outcome, &ALL_SECTIONS);
    }

    #[test]
    fn test_text_fallback_scans_skills() {
        let raw = "Solid Python engineer with TensorFlow on AWS. No rating given.";
        let outcome = backfill_evaluation(None, raw);
        let evaluation = outcome.section(Section::EvaluationResults).unwrap();

        assert_eq!(
            evaluation.pointer("/skills_summary/programming_languages"),
            Some(&json!(["Python"]))
        );
        assert_eq!(
            evaluation.pointer("/skills_summary/ml_frameworks"),
            Some(&json!(["TensorFlow"]))
        );
        assert_eq!(evaluation["raw_evaluation"], json!(raw));
        assert_eq!(outcome.rating(), 3);
        assert!(outcome
            .backfilled
            .contains(&"evaluation_results.skills_summary.databases".to_string()));
    }

    #[test]
    fn test_empty_answer_yields_every_core_path() {
        let parsed = JsonObject::new();
        let outcome = backfill_evaluation(Some(&parsed), "{}");
        assert_all_paths_present(&outcome, &ALL_SECTIONS);
        assert_eq!(outcome.rating(), 3);
        assert_eq!(
            outcome.section(Section::InterviewNotes).unwrap()["technical_questions"]
                .as_array()
                .map(Vec::len),
            Some(3)
        );
    }

    #[test]
    fn test_nested_combined_answer() {
        let parsed = object(json!({
            "resume_parsing": {"personal_info": {"name": "Jane Doe", "email": "jane@example.com"}},
            "resume_evaluation": {
                "analysis": "Deep ML background",
                "skills_match_percentage": 85,
                "experience_relevance": "Highly relevant",
                "education_alignment": "Exceeds requirements"
            },
            "gap_analysis": {
                "analysis": "Limited Kubernetes exposure",
                "missing_skills": ["Kubernetes", "Go"],
                "experience_gaps": [],
                "development_areas": ["Distributed systems"]
            },
            "candidate_rating": {"rating": "4", "justification": "Strong fit", "strengths": ["ML"]},
            "interview_notes": {"questions": ["Tell us about MLOps"], "focus_areas": ["Scale"]}
        }));
        let outcome = backfill_evaluation(Some(&parsed), "raw");

        assert_eq!(outcome.candidate_name().as_deref(), Some("Jane Doe"));
        assert_eq!(outcome.rating(), 4);

        let evaluation = outcome.section(Section::EvaluationResults).unwrap();
        assert_eq!(evaluation.pointer("/technical_expertise/depth"), Some(&json!("Deep ML background")));
        assert_eq!(evaluation.pointer("/job_match_analysis/skills_match"), Some(&json!(85)));
        assert_eq!(
            evaluation.pointer("/education_summary/alignment"),
            Some(&json!("Exceeds requirements"))
        );

        let gaps = outcome.section(Section::GapsAnalysis).unwrap();
        assert_eq!(
            gaps.pointer("/gaps_analysis/skill_mismatches/analysis"),
            Some(&json!(["Kubernetes", "Go"]))
        );
        assert_eq!(
            gaps.pointer("/gaps_analysis/overall_concerns/analysis"),
            Some(&json!("Limited Kubernetes exposure"))
        );
        assert_eq!(
            gaps.pointer("/gaps_analysis/overall_concerns/areas_for_improvement"),
            Some(&json!(["Distributed systems"]))
        );
        assert_eq!(gaps.pointer("/gaps_analysis/experience_gaps/analysis"), Some(&json!([])));
        assert!(outcome
            .backfilled
            .contains(&"gaps_analysis.gaps_analysis.experience_gaps.clarification_needed".to_string()));

        let rating = outcome.section(Section::CandidateRating).unwrap();
        assert_eq!(rating["reasoning"], json!("Strong fit"));
        assert_eq!(rating["strengths"], json!(["ML"]));

        let notes = outcome.section(Section::InterviewNotes).unwrap();
        assert_eq!(notes["technical_questions"], json!(["Tell us about MLOps"]));
        assert_eq!(notes.pointer("/general_notes/strengths_to_explore"), Some(&json!(["Scale"])));
    }

    #[test]
    fn test_flat_combined_answer() {
        let parsed = object(json!({
            "skills_summary": {"programming_languages": ["Rust"]},
            "technical_assessment": "Systems depth",
            "rating": 5,
            "strengths": ["Ownership"],
            "technical_questions": ["Explain lifetimes"]
        }));
        let outcome = backfill_evaluation(Some(&parsed), "raw");

        let evaluation = outcome.section(Section::EvaluationResults).unwrap();
        assert_eq!(
            evaluation.pointer("/skills_summary/programming_languages"),
            Some(&json!(["Rust"]))
        );
        assert_eq!(evaluation.pointer("/technical_expertise/depth"), Some(&json!("Systems depth")));
        assert_eq!(outcome.rating(), 5);
        assert_eq!(
            outcome.section(Section::InterviewNotes).unwrap()["technical_questions"],
            json!(["Explain lifetimes"])
        );
        // Flat keys never leak into sections as extras.
        assert!(evaluation.get("rating").is_none());
        // Résumé parsing never reads from the top level.
        assert!(outcome
            .backfilled
            .contains(&"resume_parsing.analysis".to_string()));
    }

    #[test]
    fn test_model_values_are_kept_as_written() {
        let parsed = object(json!({
            "job_match_analysis": {"skills_match": {"score": 80, "detail": "Python, AWS"}},
            "experience_summary": {"years_of_experience": 7, "relevant_roles": "ML Engineer"}
        }));
        let outcome = backfill_section(Section::EvaluationResults, Some(&parsed), "raw");
        let evaluation = outcome.section(Section::EvaluationResults).unwrap();

        assert_eq!(
            evaluation.pointer("/job_match_analysis/skills_match"),
            Some(&json!({"score": 80, "detail": "Python, AWS"}))
        );
        assert_eq!(evaluation.pointer("/experience_summary/years_of_experience"), Some(&json!(7)));
        assert_eq!(
            evaluation.pointer("/experience_summary/relevant_roles"),
            Some(&json!("ML Engineer"))
        );
        for path in [
            "evaluation_results.job_match_analysis.skills_match",
            "evaluation_results.experience_summary.years_of_experience",
            "evaluation_results.experience_summary.relevant_roles",
        ] {
            assert!(!outcome.backfilled.contains(&path.to_string()), "{path}");
        }

        let parsed = object(json!({"job_fit": {"summary": "good"}, "rating": "4"}));
        let outcome = backfill_section(Section::CandidateRating, Some(&parsed), "raw");
        let rating = outcome.section(Section::CandidateRating).unwrap();
        assert_eq!(rating["job_fit"], json!({"summary": "good"}));
        assert_eq!(rating["rating"], json!(4));
    }

    #[test]
    fn test_parent_alias_does_not_swallow_its_object() {
        let parsed = object(json!({"job_match_analysis": {"experience_relevance": "High"}}));
        let outcome = backfill_section(Section::EvaluationResults, Some(&parsed), "raw");
        let evaluation = outcome.section(Section::EvaluationResults).unwrap();

        assert_eq!(
            evaluation.pointer("/job_match_analysis/skills_match"),
            Some(&json!("Skill alignment to be verified"))
        );
        assert_eq!(
            evaluation.pointer("/job_match_analysis/experience_relevance"),
            Some(&json!("High"))
        );
    }

    #[test]
    fn test_flat_generic_key_is_not_filed_as_concerns() {
        let parsed = object(json!({"analysis": "Excellent candidate, strong Python", "rating": 5}));
        let outcome = backfill_evaluation(Some(&parsed), "raw");
        let gaps = outcome.section(Section::GapsAnalysis).unwrap();

        assert_eq!(
            gaps.pointer("/gaps_analysis/overall_concerns/analysis"),
            Some(&json!("No significant concerns identified"))
        );
        assert!(outcome
            .backfilled
            .contains(&"gaps_analysis.gaps_analysis.overall_concerns.analysis".to_string()));
        assert_eq!(outcome.rating(), 5);

        // Inside its own section object the same key still counts.
        let parsed = object(json!({"gap_analysis": {"analysis": "Short tenures"}}));
        let outcome = backfill_evaluation(Some(&parsed), "raw");
        assert_eq!(
            outcome
                .section(Section::GapsAnalysis)
                .unwrap()
                .pointer("/gaps_analysis/overall_concerns/analysis"),
            Some(&json!("Short tenures"))
        );
    }

    #[test]
    fn test_null_and_out_of_range_values_fall_through() {
        let parsed = object(json!({"rating": 9, "score": null, "overall_rating": 2, "strengths": null}));
        let outcome = backfill_section(Section::CandidateRating, Some(&parsed), "raw");
        let rating = outcome.section(Section::CandidateRating).unwrap();
        assert_eq!(rating["rating"], json!(2));
        assert_eq!(rating["strengths"], json!([]));
    }

    #[test]
    fn test_section_scoped_answer_keeps_extras() {
        let parsed = object(json!({
            "employment_gaps": ["2019-2020"],
            "overall_concerns": "Short tenures",
            "confidence": "medium"
        }));
        let outcome = backfill_section(Section::GapsAnalysis, Some(&parsed), "raw");
        let gaps = outcome.section(Section::GapsAnalysis).unwrap();

        assert_eq!(gaps.pointer("/gaps_analysis/employment_gaps"), Some(&json!(["2019-2020"])));
        assert_eq!(
            gaps.pointer("/gaps_analysis/overall_concerns/analysis"),
            Some(&json!("Short tenures"))
        );
        assert_eq!(gaps["confidence"], json!("medium"));
        assert!(gaps.get("employment_gaps").is_none());
        assert_eq!(gaps["raw_gaps"], json!("raw"));
    }

    #[test]
    fn test_section_answer_wrapped_in_its_key_is_unwrapped() {
        let parsed = object(json!({"candidate_rating": {"rating": 1, "weaknesses": ["Sparse"]}}));
        let outcome = backfill_section(Section::CandidateRating, Some(&parsed), "raw");
        let rating = outcome.section(Section::CandidateRating).unwrap();
        assert_eq!(rating["rating"], json!(1));
        assert_eq!(rating["weaknesses"], json!(["Sparse"]));
    }

    #[test]
    fn test_core_sections_complete_for_any_shape() {
        let shapes = [
            json!({}),
            json!({"evaluation_results": "not an object"}),
            json!({"candidate_rating": {"rating": "n/a"}}),
            json!({"gaps_analysis": {"gaps_analysis": {"skill_mismatches": {"analysis": "None"}}}}),
        ];
        for shape in shapes {
            let parsed = object(shape);
            let outcome = backfill_evaluation(Some(&parsed), "raw");
            assert_all_paths_present(&outcome, &CORE_SECTIONS);
        }
    }

    #[test]
    fn test_merge_and_patch_carry_provenance() {
        let parsed = object(json!({"rating": 4}));
        let mut outcome = backfill_section(Section::CandidateRating, Some(&parsed), "raw");
        outcome.merge(backfill_section(Section::InterviewNotes, None, "no json here"));

        assert_eq!(outcome.source, ParseSource::TextFallback);
        assert!(outcome.section(Section::InterviewNotes).is_some());
        let patch = outcome.into_patch().unwrap();
        assert_eq!(patch["parse_source"], json!("text_fallback"));
        assert!(patch["backfilled_fields"]
            .as_array()
            .unwrap()
            .contains(&json!("interview_notes.technical_questions")));
        assert_eq!(patch["candidate_rating"]["rating"], json!(4));
    }

    #[test]
    fn test_set_path_replaces_scalar_parent() {
        let mut out = object(json!({"a": "scalar"}));
        set_path(&mut out, "a.b", json!(1));
        assert_eq!(Value::Object(out), json!({"a": {"b": 1}}));
    }
}
