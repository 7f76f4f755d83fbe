use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shown when a failure carries no readable detail.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed. Please try again.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub msg: String,
    #[serde(default)]
    pub loc: Vec<Value>,
}

/// `detail` field of a failed service response: a plain message for business
/// rule rejections, or a list of issues for request schema errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationIssue>),
    Other(Value),
}

impl ErrorDetail {
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Message(message) if !message.trim().is_empty() => Some(message.clone()),
            Self::Message(_) => None,
            Self::Validation(issues) if !issues.is_empty() => Some(
                issues
                    .iter()
                    .map(|issue| match field_name(&issue.loc) {
                        Some(field) => format!("{field}: {}", issue.msg),
                        None => issue.msg.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Self::Validation(_) => None,
            Self::Other(Value::Null) => None,
            Self::Other(value) => Some(value.to_string()),
        }
    }
}

fn field_name(loc: &[Value]) -> Option<&str> {
    loc.last().and_then(Value::as_str)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

impl ErrorBody {
    /// Extracts a human-readable message from a raw failure body, if any.
    pub fn message_from_bytes(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.detail)
            .and_then(|detail| detail.message())
    }
}
