use std::fmt::Write as _;

use shared::domain::{Issue, OptionSet, OptionSource};

pub const NO_ISSUES: &str = "No issues found. Try adjusting your filters or analyzing different text.";

pub fn confidence_label(confidence: f64) -> &'static str {
    if confidence >= 0.8 {
        "high"
    } else if confidence >= 0.6 {
        "medium"
    } else {
        "low"
    }
}

pub fn render_issues(issues: &[Issue]) -> String {
    if issues.is_empty() {
        return format!("{NO_ISSUES}\n");
    }

    let mut out = String::new();
    for (idx, issue) in issues.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", idx + 1, issue.title);
        if issue.description != issue.title {
            let _ = writeln!(out, "   {}", issue.description);
        }

        let mut meta = Vec::new();
        if !issue.group.is_empty() {
            meta.push(format!("group: {}", issue.group));
        }
        if !issue.categories.is_empty() {
            meta.push(format!("categories: {}", issue.categories.join(", ")));
        }
        if let Some(confidence) = issue.confidence {
            meta.push(format!(
                "confidence: {}% ({})",
                (confidence * 100.0).round() as u32,
                confidence_label(confidence)
            ));
        }
        if !meta.is_empty() {
            let _ = writeln!(out, "   {}", meta.join(" | "));
        }

        if let Some(evidence) = &issue.evidence {
            let _ = writeln!(out, "   evidence: \"{evidence}\"");
        }
        if let Some(impact) = &issue.impact {
            let _ = writeln!(out, "   impact: {impact}");
        }
        if let Some(source) = &issue.source {
            let _ = writeln!(out, "   source: {source}");
        }
        if let Some(timestamp) = issue.timestamp {
            let _ = writeln!(out, "   reported: {}", timestamp.to_rfc3339());
        }
    }
    out
}

pub fn render_options(options: &OptionSet, source: Option<OptionSource>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "User groups:");
    for group in &options.groups {
        let _ = writeln!(out, "  - {group}");
    }
    let _ = writeln!(out, "Problem categories:");
    for category in &options.categories {
        let _ = writeln!(out, "  - {category}");
    }
    if source == Some(OptionSource::Fallback) {
        let _ = writeln!(
            out,
            "(analysis service unavailable; showing built-in defaults)"
        );
    }
    out
}
