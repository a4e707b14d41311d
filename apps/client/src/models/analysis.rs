use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Structured resume analysis as returned by `POST /api/analyze`.
///
/// Immutable once received. The shell replaces it wholesale on a new upload
/// or when the user picks their previously stored analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub personal_info: PersonalInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub predicted_role: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub executive_summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub experience_years: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub improvements: Vec<Improvement>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub jobs: Vec<JobRecommendation>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub education: Vec<Education>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub certifications: Vec<Certification>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub projects: Vec<Project>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub work_experience: Vec<WorkExperience>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub achievements: Vec<String>,
    /// Job-search hints the backend derived; opaque to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_params: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementKind {
    #[serde(alias = "Critical")]
    Critical,
    #[serde(alias = "Recommended")]
    Recommended,
}

impl ImprovementKind {
    pub fn label(self) -> &'static str {
        match self {
            ImprovementKind::Critical => "critical",
            ImprovementKind::Recommended => "recommended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    #[serde(rename = "type")]
    pub kind: ImprovementKind,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecommendation {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub salary_range: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub apply_link: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub match_score: f64, // 0 – 100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub institution: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub responsibilities: Vec<String>,
}

impl AnalysisResult {
    /// Clamps values the backend computed into their documented ranges.
    /// Called at the trust boundary, right after a response is decoded.
    pub fn normalized(mut self) -> Self {
        for job in &mut self.jobs {
            job.match_score = if job.match_score.is_finite() {
                job.match_score.clamp(0.0, 100.0)
            } else {
                0.0
            };
        }
        self
    }

    /// Name to greet the user with; `None` when the resume had no name.
    pub fn display_name(&self) -> Option<&str> {
        let name = self.personal_info.name.trim();
        (!name.is_empty()).then_some(name)
    }
}

impl JobRecommendation {
    /// Match score rounded for a `NN%` badge.
    pub fn match_percent(&self) -> u32 {
        self.match_score.round() as u32
    }
}

/// The analysis model fills fields it could not extract with `null`; read
/// those as the field's empty value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The analysis model is prompted for strings but sometimes answers with
/// bare numbers (`"experience_years": 4`).
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
