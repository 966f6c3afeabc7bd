use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How Discovery enumerates a source's index (§4.5).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscoveryMode {
    Today,
    Date(NaiveDate),
    Range(NaiveDate, NaiveDate),
    Category {
        category: String,
        scope: Option<String>,
        status: Option<String>,
    },
    Search {
        query: String,
        filters: BTreeMap<String, String>,
    },
}

impl DiscoveryMode {
    pub fn name(&self) -> &'static str {
        match self {
            DiscoveryMode::Today => "today",
            DiscoveryMode::Date(_) => "date",
            DiscoveryMode::Range(_, _) => "range",
            DiscoveryMode::Category { .. } => "category",
            DiscoveryMode::Search { .. } => "search",
        }
    }
}
