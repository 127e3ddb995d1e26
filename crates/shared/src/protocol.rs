use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{Query, SearchFilters, SearchQuery};

/// Every call the client can make against the analysis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceRequest {
    Analyze(AnalyzeRequest),
    Search(SearchRequest),
    Groups,
    Categories,
    Health,
}

impl ServiceRequest {
    /// Path relative to the service base url.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Analyze(_) => "analyze",
            Self::Search(_) => "search",
            Self::Groups => "groups",
            Self::Categories => "categories",
            Self::Health => "health",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    pub group: String,
    pub category: String,
}

impl From<&Query> for AnalyzeRequest {
    fn from(query: &Query) -> Self {
        Self {
            text: query.text().to_string(),
            group: query.group().to_string(),
            category: query.category().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub filters: SearchFilters,
}

impl From<&SearchQuery> for SearchRequest {
    fn from(query: &SearchQuery) -> Self {
        Self {
            query: query.text().to_string(),
            filters: query.filters().clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default, deserialize_with = "lenient_issue_list")]
    pub issues: Vec<RawIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "lenient_issue_list")]
    pub results: Vec<RawIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupsResponse {
    #[serde(alias = "user_groups")]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoriesResponse {
    #[serde(alias = "problem_categories")]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error payload returned with non-success statuses. Only `error` is read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// One element of an `issues` or `results` array as the service sent it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawIssue {
    Text(String),
    Record(Box<RawIssueRecord>),
    Unrecognized(Value),
}

impl RawIssue {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(_) => match serde_json::from_value::<RawIssueRecord>(value.clone()) {
                Ok(record) => Self::Record(Box::new(record)),
                Err(_) => Self::Unrecognized(value),
            },
            other => Self::Unrecognized(other),
        }
    }
}

impl<'de> Deserialize<'de> for RawIssue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Structured issue as emitted by the service. Both the canonical field names
/// and the ones the extraction backend produces (`summary`, `user_group`,
/// `problem_category`, `quote`) are accepted. Fields are decoded one at a
/// time: a wrongly typed value reads as absent and the rest of the record is
/// kept.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawIssueRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<RawIssueId>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub group: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub user_group: Option<String>,
    #[serde(default, deserialize_with = "lenient_categories")]
    pub categories: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub problem_category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub evidence: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub quote: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub impact: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawIssueId {
    Text(String),
    Number(serde_json::Number),
}

impl std::fmt::Display for RawIssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A list keeps only its string entries; a bare string is a one-element list.
fn lenient_categories<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text),
                    _ => None,
                })
                .collect(),
        ),
        Value::String(text) => Some(vec![text]),
        _ => None,
    })
}

fn lenient_issue_list<'de, D>(deserializer: D) -> Result<Vec<RawIssue>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.into_iter().map(RawIssue::from_value).collect()),
        _ => Ok(Vec::new()),
    }
}
