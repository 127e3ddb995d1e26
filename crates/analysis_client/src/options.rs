use std::sync::Arc;

use shared::{
    domain::{OptionSet, OptionSource},
    protocol::{CategoriesResponse, GroupsResponse, ServiceRequest},
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::transport::{Transport, TransportError};

pub const FALLBACK_GROUPS: [&str; 5] = [
    "People with disabilities",
    "Elderly",
    "Students",
    "Children",
    "Low-income individuals",
];

pub const FALLBACK_CATEGORIES: [&str; 6] = [
    "Accessibility",
    "Mobility",
    "Cognitive",
    "Mental health",
    "Education",
    "Healthcare",
];

pub fn fallback_options() -> OptionSet {
    OptionSet {
        groups: FALLBACK_GROUPS.iter().map(|group| group.to_string()).collect(),
        categories: FALLBACK_CATEGORIES
            .iter()
            .map(|category| category.to_string())
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedOptions {
    options: OptionSet,
    source: OptionSource,
}

/// Supplies the valid group and category selections.
///
/// Transport failures never reach the caller: the built-in lists are returned
/// instead and [`OptionProvider::source`] reports [`OptionSource::Fallback`].
/// The first result is kept until [`OptionProvider::refresh`] is called.
pub struct OptionProvider {
    transport: Arc<dyn Transport>,
    cached: RwLock<Option<ResolvedOptions>>,
}

impl OptionProvider {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cached: RwLock::new(None),
        }
    }

    pub async fn fetch_options(&self) -> OptionSet {
        if let Some(resolved) = self.cached.read().await.as_ref() {
            return resolved.options.clone();
        }

        let resolved = self.load().await;
        let mut cached = self.cached.write().await;
        // A concurrent first fetch may have landed while this one was loading.
        let resolved = cached.get_or_insert(resolved);
        resolved.options.clone()
    }

    pub async fn refresh(&self) -> OptionSet {
        let resolved = self.load().await;
        let options = resolved.options.clone();
        *self.cached.write().await = Some(resolved);
        options
    }

    /// Where the cached set came from; `None` before the first fetch.
    pub async fn source(&self) -> Option<OptionSource> {
        self.cached.read().await.as_ref().map(|resolved| resolved.source)
    }

    async fn load(&self) -> ResolvedOptions {
        let (groups, categories) = futures::join!(
            self.fetch_groups(),
            self.fetch_categories()
        );

        match (groups, categories) {
            (Ok(groups), Ok(categories)) if !groups.is_empty() && !categories.is_empty() => {
                info!(
                    groups = groups.len(),
                    categories = categories.len(),
                    "loaded filter options from analysis service"
                );
                ResolvedOptions {
                    options: OptionSet { groups, categories },
                    source: OptionSource::Remote,
                }
            }
            (groups, categories) => {
                warn!(
                    groups_error = ?groups.err(),
                    categories_error = ?categories.err(),
                    "filter options unavailable; using built-in fallback"
                );
                ResolvedOptions {
                    options: fallback_options(),
                    source: OptionSource::Fallback,
                }
            }
        }
    }

    async fn fetch_groups(&self) -> Result<Vec<String>, TransportError> {
        let response: GroupsResponse = self
            .transport
            .send(ServiceRequest::Groups)
            .await?
            .decode()?;
        Ok(clean_list(response.groups))
    }

    async fn fetch_categories(&self) -> Result<Vec<String>, TransportError> {
        let response: CategoriesResponse = self
            .transport
            .send(ServiceRequest::Categories)
            .await?
            .decode()?;
        Ok(clean_list(response.categories))
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !cleaned.iter().any(|existing| existing == value) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}

#[cfg(test)]
#[path = "tests/options_tests.rs"]
mod tests;
