//! Structured resume — the canonical parsed representation stored in `resumes.parsed_data`.
//!
//! Stored JSON and planner output are both loosely shaped, so every sequence and
//! string field defaults to empty when it is absent OR `null`. Keys this schema
//! does not know about are kept in `extra` and written back untouched.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Deserializes `null` the same way as a missing key: `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts a string, number or bool (years and GPAs often arrive as numbers).
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredResume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Case-insensitively unique; original casing preserved.
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    /// Most recent first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
    /// Source order, never reordered by a merge.
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<EducationEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub certifications: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Employer or context ("Personal", "Hackathon", ...).
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bullets: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bullets: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub degree: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub school: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub gpa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StructuredResume {
    /// Reads stored `parsed_data`. `None` means there is nothing to merge against:
    /// the column is NULL, or holds an object with no content in any field.
    pub fn from_stored(value: &Value) -> Result<Option<Self>, serde_json::Error> {
        if value.is_null() {
            return Ok(None);
        }
        let resume = Self::deserialize(value)?;
        Ok((!resume.is_empty()).then_some(resume))
    }

    /// True when every field is absent or empty, e.g. `{}` or `{"skills": []}`.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_sequences_default_to_empty() {
        let resume: StructuredResume = serde_json::from_value(json!({"name": "Ada"})).unwrap();
        assert!(resume.skills.is_empty());
        assert!(resume.projects.is_empty());
        assert!(resume.experience.is_empty());
        assert_eq!(resume.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_null_sequences_default_to_empty() {
        let resume: StructuredResume = serde_json::from_value(json!({
            "skills": null,
            "projects": null,
            "experience": [{"company": "Tech Corp", "title": null, "bullets": null}]
        }))
        .unwrap();
        assert!(resume.skills.is_empty());
        assert!(resume.projects.is_empty());
        assert_eq!(resume.experience[0].title, "");
        assert!(resume.experience[0].bullets.is_empty());
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let input = json!({
            "skills": ["Rust"],
            "languages": ["English", "German"],
            "experience": [{
                "company": "Tech Corp",
                "title": "Developer",
                "bullets": [],
                "team_size": 4
            }]
        });
        let resume: StructuredResume = serde_json::from_value(input).unwrap();
        assert_eq!(resume.extra["languages"], json!(["English", "German"]));

        let output = serde_json::to_value(&resume).unwrap();
        assert_eq!(output["languages"], json!(["English", "German"]));
        assert_eq!(output["experience"][0]["team_size"], json!(4));
    }

    #[test]
    fn test_numeric_years_and_gpa_are_accepted() {
        let resume: StructuredResume = serde_json::from_value(json!({
            "education": [{"degree": "BSc", "school": "MIT", "year": 2020, "gpa": 3.8}],
            "projects": [{"title": "Agent", "duration": 2024}]
        }))
        .unwrap();
        assert_eq!(resume.education[0].year, "2020");
        assert_eq!(resume.education[0].gpa.as_deref(), Some("3.8"));
        assert_eq!(resume.projects[0].duration, "2024");
    }

    #[test]
    fn test_from_stored_null_and_empty_mean_no_data() {
        assert!(StructuredResume::from_stored(&Value::Null).unwrap().is_none());
        assert!(StructuredResume::from_stored(&json!({})).unwrap().is_none());
    }

    #[test]
    fn test_from_stored_treats_empty_sections_as_no_data() {
        // What a resume registered with `"parsed_data": {}` looks like once written back.
        let registered: StructuredResume = serde_json::from_value(json!({})).unwrap();
        let stored = serde_json::to_value(&registered).unwrap();
        assert!(StructuredResume::from_stored(&stored).unwrap().is_none());

        let nulls = json!({"skills": null, "projects": [], "experience": null});
        assert!(StructuredResume::from_stored(&nulls).unwrap().is_none());
    }

    #[test]
    fn test_from_stored_keeps_resume_with_only_unknown_keys() {
        let stored = json!({"languages": ["German"]});
        let resume = StructuredResume::from_stored(&stored).unwrap().unwrap();
        assert_eq!(resume.extra["languages"], json!(["German"]));
    }

    #[test]
    fn test_from_stored_reads_populated_object() {
        let stored = json!({"skills": ["Python"]});
        let resume = StructuredResume::from_stored(&stored).unwrap().unwrap();
        assert_eq!(resume.skills, vec!["Python".to_string()]);
    }

    #[test]
    fn test_from_stored_rejects_wrong_shape() {
        assert!(StructuredResume::from_stored(&json!(["not", "an", "object"])).is_err());
        assert!(StructuredResume::from_stored(&json!({"skills": "Python"})).is_err());
    }
}
