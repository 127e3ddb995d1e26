//! Maps the heterogeneous issue elements returned by the service onto the
//! canonical [`Issue`] record.
//!
//! Normalization never fails as a whole: elements that cannot produce a
//! non-empty title are dropped and the rest of the batch is kept.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use shared::{
    domain::Issue,
    protocol::{RawIssue, RawIssueRecord},
};
use tracing::warn;

pub fn normalize(raw: RawIssue, fallback_group: &str, fallback_category: &str) -> Option<Issue> {
    match raw {
        RawIssue::Text(text) => {
            let title = non_blank(Some(text))?;
            Some(Issue {
                description: title.clone(),
                title,
                group: fallback_group.to_string(),
                categories: fallback_categories(fallback_category),
                evidence: None,
                impact: None,
                source: None,
                confidence: None,
                timestamp: None,
                id: None,
            })
        }
        RawIssue::Record(record) => normalize_record(*record, fallback_group, fallback_category),
        RawIssue::Unrecognized(_) => None,
    }
}

/// Normalizes a whole response list, preserving element order.
pub fn normalize_batch(
    raw: Vec<RawIssue>,
    fallback_group: &str,
    fallback_category: &str,
) -> Vec<Issue> {
    let received = raw.len();
    let issues: Vec<Issue> = raw
        .into_iter()
        .filter_map(|item| normalize(item, fallback_group, fallback_category))
        .collect();

    let dropped = received - issues.len();
    if dropped > 0 {
        warn!(received, dropped, "dropped malformed issues from service response");
    }
    issues
}

fn normalize_record(
    record: RawIssueRecord,
    fallback_group: &str,
    fallback_category: &str,
) -> Option<Issue> {
    let title = [record.title, record.summary]
        .into_iter()
        .find_map(non_blank)?;
    let description = non_blank(record.description).unwrap_or_else(|| title.clone());

    // Present fields win even when empty; only absent ones take the fallback.
    let group = record
        .group
        .or(record.user_group)
        .unwrap_or_else(|| fallback_group.to_string());
    let categories = match (record.categories, record.category.or(record.problem_category)) {
        (Some(categories), _) => dedup_categories(categories),
        (None, Some(category)) => dedup_categories(vec![category]),
        (None, None) => fallback_categories(fallback_category),
    };

    Some(Issue {
        title,
        description,
        group,
        categories,
        evidence: non_blank(record.evidence.or(record.quote)),
        impact: non_blank(record.impact),
        source: non_blank(record.source),
        confidence: record
            .confidence
            .filter(|value| value.is_finite() && (0.0..=1.0).contains(value)),
        timestamp: record.timestamp.as_deref().and_then(parse_timestamp),
        id: non_blank(record.id.map(|id| id.to_string())),
    })
}

fn fallback_categories(fallback_category: &str) -> Vec<String> {
    if fallback_category.trim().is_empty() {
        Vec::new()
    } else {
        vec![fallback_category.to_string()]
    }
}

fn dedup_categories(categories: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    categories
        .into_iter()
        .filter(|category| !category.trim().is_empty())
        .filter(|category| seen.insert(category.clone()))
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "tests/normalizer_tests.rs"]
mod tests;
