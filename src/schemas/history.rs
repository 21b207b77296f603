use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Record identifier. The backend sends integers for database rows and
/// strings for everything else; both are accepted and echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub(crate) enum Category {
    Ppt,
    Git,
    /// File uploads and anything the backend adds later.
    Other(String),
}

impl Category {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Ppt => "PowerPoint",
            Self::Git => "GitHub",
            Self::Other(_) => "File Upload",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ppt" => Self::Ppt,
            "git" => Self::Git,
            _ => Self::Other(value),
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Ppt => "ppt".to_string(),
            Category::Git => "git".to_string(),
            Category::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct HistoryRecord {
    pub(crate) id: RecordId,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) category: Category,
    #[serde(default)]
    #[serde(alias = "createdAt")]
    pub(crate) created_at: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct HistoryDetail {
    pub(crate) id: RecordId,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) category: Category,
    #[serde(default)]
    pub(crate) results: Vec<StudentResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StudentResult {
    #[serde(default)]
    pub(crate) student_name: String,
    #[serde(default)]
    pub(crate) score_percent: f64,
    #[serde(default)]
    pub(crate) reasoning: String,
    #[serde(default)]
    pub(crate) file_id: Option<String>,
    /// Original upload name, when the backend kept it.
    #[serde(default)]
    pub(crate) filename: Option<String>,
    #[serde(default)]
    pub(crate) details: Vec<QuestionDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct QuestionDetail {
    #[serde(default)]
    pub(crate) question: String,
    #[serde(default)]
    pub(crate) student_answer: Option<String>,
    #[serde(default)]
    pub(crate) feedback: String,
    #[serde(default)]
    pub(crate) is_correct: bool,
}

impl StudentResult {
    pub(crate) fn downloadable_file(&self) -> Option<&str> {
        self.file_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Name offered when saving this student's upload.
    pub(crate) fn suggested_filename(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .or(Some(self.student_name.as_str()))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Body of `POST /reevaluate`: one submitted file graded again against the
/// record's task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub(crate) struct ReEvaluateRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub(crate) description: String,
    #[validate(length(min = 1, message = "file id is required"))]
    pub(crate) file_id: String,
}

impl ReEvaluateRequest {
    pub(crate) fn for_student(detail: &HistoryDetail, result: &StudentResult) -> Option<Self> {
        Some(Self {
            title: detail.title.trim().to_string(),
            description: detail.description.trim().to_string(),
            file_id: result.downloadable_file()?.to_string(),
        })
    }
}

/// `{success, result, error}`; a failed grading still answers 200.
#[derive(Debug, Deserialize)]
pub(crate) struct ReEvaluateResponse {
    #[serde(default)]
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) result: Option<Value>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}
