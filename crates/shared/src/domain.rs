use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned summary identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryId(pub String);

impl SummaryId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SummaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SummaryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SummaryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(rename = "_id")]
    pub id: SummaryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
    #[serde(rename = "summary", default, skip_serializing_if = "Option::is_none")]
    pub summary_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Summary {
    /// Name with empty strings folded into `None`.
    pub fn file_name(&self) -> Option<&str> {
        self.original_file_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Text with empty strings folded into `None`.
    pub fn text(&self) -> Option<&str> {
        self.summary_text.as_deref().filter(|text| !text.is_empty())
    }
}
