use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RequestError, EMPTY_ANALYZE_TEXT, EMPTY_SEARCH_TEXT};

/// Identity of one submission; later submissions always compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestSeq(pub u64);

impl RequestSeq {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One analysis submission. The text is stored as entered; only its trimmed
/// form is checked for emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    text: String,
    group: String,
    category: String,
}

impl Query {
    pub fn new(
        text: impl Into<String>,
        group: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self, RequestError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(RequestError::validation(EMPTY_ANALYZE_TEXT));
        }
        Ok(Self {
            text,
            group: group.into(),
            category: category.into(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub user_group: Vec<String>,
    #[serde(default)]
    pub problem_category: Vec<String>,
}

impl SearchFilters {
    pub fn single(group: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            user_group: vec![group.into()],
            problem_category: vec![category.into()],
        }
    }

    pub fn primary_group(&self) -> &str {
        self.user_group.first().map(String::as_str).unwrap_or_default()
    }

    pub fn primary_category(&self) -> &str {
        self.problem_category
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    text: String,
    filters: SearchFilters,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, filters: SearchFilters) -> Result<Self, RequestError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(RequestError::validation(EMPTY_SEARCH_TEXT));
        }
        Ok(Self { text, filters })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }
}

/// The request a lifecycle state refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Submission {
    Analyze(Query),
    Search(SearchQuery),
}

impl Submission {
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Analyze(_) => "analyze",
            Self::Search(_) => "search",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Analyze(query) => query.text(),
            Self::Search(query) => query.text(),
        }
    }

    /// Group used for issues that do not name one.
    pub fn fallback_group(&self) -> &str {
        match self {
            Self::Analyze(query) => query.group(),
            Self::Search(query) => query.filters().primary_group(),
        }
    }

    /// Category used for issues that do not list any.
    pub fn fallback_category(&self) -> &str {
        match self {
            Self::Analyze(query) => query.category(),
            Self::Search(query) => query.filters().primary_category(),
        }
    }
}

/// Canonical issue record produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    pub description: String,
    pub group: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    pub groups: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionSource {
    Remote,
    Fallback,
}
