//! Keyword scan used when a model answer carries no JSON at all.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const DEFAULT_RATING: i64 = 3;
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

static RATING_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"rating[:\s]*(\d+)").expect("rating pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillCategory {
    ProgrammingLanguages,
    MlFrameworks,
    CloudPlatforms,
    Tools,
    Databases,
    BigData,
}

use SkillCategory::*;

/// (lowercase needle, display name, category)
const SKILL_VOCABULARY: &[(&str, &str, SkillCategory)] = &[
    ("python", "Python", ProgrammingLanguages),
    ("java", "Java", ProgrammingLanguages),
    ("javascript", "JavaScript", ProgrammingLanguages),
    ("typescript", "TypeScript", ProgrammingLanguages),
    ("golang", "Go", ProgrammingLanguages),
    ("rust", "Rust", ProgrammingLanguages),
    ("c++", "C++", ProgrammingLanguages),
    ("scala", "Scala", ProgrammingLanguages),
    ("sql", "SQL", ProgrammingLanguages),
    ("tensorflow", "TensorFlow", MlFrameworks),
    ("pytorch", "PyTorch", MlFrameworks),
    ("scikit-learn", "scikit-learn", MlFrameworks),
    ("keras", "Keras", MlFrameworks),
    ("xgboost", "XGBoost", MlFrameworks),
    ("hugging face", "Hugging Face", MlFrameworks),
    ("aws", "AWS", CloudPlatforms),
    ("gcp", "GCP", CloudPlatforms),
    ("google cloud", "Google Cloud", CloudPlatforms),
    ("azure", "Azure", CloudPlatforms),
    ("docker", "Docker", Tools),
    ("kubernetes", "Kubernetes", Tools),
    ("git", "Git", Tools),
    ("terraform", "Terraform", Tools),
    ("mlflow", "MLflow", Tools),
    ("postgresql", "PostgreSQL", Databases),
    ("mysql", "MySQL", Databases),
    ("mongodb", "MongoDB", Databases),
    ("dynamodb", "DynamoDB", Databases),
    ("redis", "Redis", Databases),
    ("spark", "Apache Spark", BigData),
    ("hadoop", "Hadoop", BigData),
    ("kafka", "Kafka", BigData),
    ("airflow", "Airflow", BigData),
];

/// Skills and rating recovered from unstructured model text.
#[derive(Debug, Clone, Default)]
pub struct TextScan {
    skills: Vec<(SkillCategory, &'static str)>,
    pub rating: Option<i64>,
}

impl TextScan {
    pub fn of(text: &str) -> Self {
        let lower = text.to_lowercase();
        let skills = SKILL_VOCABULARY
            .iter()
            .filter(|(needle, _, _)| contains_word(&lower, needle))
            .map(|(_, name, category)| (*category, *name))
            .collect();

        Self {
            skills,
            rating: scan_rating(&lower),
        }
    }

    pub fn skills_in(&self, category: SkillCategory) -> Vec<&'static str> {
        self.skills
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, name)| *name)
            .collect()
    }
}

/// First `rating` mention followed by digits, kept only when it is 1..=5.
pub fn scan_rating(lower: &str) -> Option<i64> {
    let digits = RATING_MENTION.captures(lower)?.get(1)?.as_str();
    digits.parse().ok().filter(|r| RATING_RANGE.contains(r))
}

/// Coerces a model-supplied rating (`4`, `4.0`, `"4"`, `"4/5"`) to an integer 1..=5.
pub fn coerce_rating(value: &Value) -> Option<i64> {
    let rating = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }?;
    RATING_RANGE.contains(&rating).then_some(rating)
}

/// Whole-word match: `java` does not match inside `javascript`.
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rating_from_prose() {
        let scan = TextScan::of("The candidate rating: 4 out of 5 based on strong experience");
        assert_eq!(scan.rating, Some(4));
    }

    #[test]
    fn test_rating_out_of_range_is_ignored() {
        assert_eq!(scan_rating("overall rating 9"), None);
        assert_eq!(scan_rating("rating: 0"), None);
        assert_eq!(scan_rating("no score given"), None);
    }

    #[test]
    fn test_only_first_rating_mention_counts() {
        assert_eq!(scan_rating("rating: 7. revised rating: 4"), None);
    }

    #[test]
    fn test_skills_grouped_by_category() {
        let scan = TextScan::of("Strong Python and SQL, ships PyTorch models on AWS with Docker and Spark.");
        assert_eq!(scan.skills_in(ProgrammingLanguages), vec!["Python", "SQL"]);
        assert_eq!(scan.skills_in(MlFrameworks), vec!["PyTorch"]);
        assert_eq!(scan.skills_in(CloudPlatforms), vec!["AWS"]);
        assert_eq!(scan.skills_in(Tools), vec!["Docker"]);
        assert_eq!(scan.skills_in(BigData), vec!["Apache Spark"]);
        assert!(scan.skills_in(Databases).is_empty());
    }

    #[test]
    fn test_word_boundaries() {
        let scan = TextScan::of("JavaScript and PostgreSQL, sparkling git-ops");
        assert_eq!(scan.skills_in(ProgrammingLanguages), vec!["JavaScript"]);
        assert_eq!(scan.skills_in(Databases), vec!["PostgreSQL"]);
        assert!(scan.skills_in(BigData).is_empty());
        assert_eq!(scan.skills_in(Tools), vec!["Git"]);
    }

    #[test]
    fn test_coerce_rating_shapes() {
        assert_eq!(coerce_rating(&json!(4)), Some(4));
        assert_eq!(coerce_rating(&json!(3.6)), Some(4));
        assert_eq!(coerce_rating(&json!("2")), Some(2));
        assert_eq!(coerce_rating(&json!(" 5/5")), Some(5));
        assert_eq!(coerce_rating(&json!(11)), None);
        assert_eq!(coerce_rating(&json!("excellent")), None);
        assert_eq!(coerce_rating(&json!(null)), None);
    }
}
