// 🩺 Unmatched-name Diagnostics - suggestions for human review
//
// For every name a source failed to resolve, report the nearest registry
// name found at the (looser) suggestion threshold. Nothing here changes how
// names resolve; it only explains the misses.

use crate::resolver::CountryResolver;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of `UNMATCHED_COUNTRIES_suggestions.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedName {
    pub source: String,
    pub country_name: String,

    /// Canonical name of the nearest candidate, empty when none qualifies
    pub suggested_match: String,

    pub suggested_iso3: String,
    pub score: Option<f64>,
}

impl UnmatchedName {
    pub fn has_suggestion(&self) -> bool {
        !self.suggested_iso3.is_empty()
    }
}

/// Unmatched names across sources, one entry per (source, name).
#[derive(Debug, Clone, Default)]
pub struct UnmatchedReport {
    entries: BTreeMap<(String, String), UnmatchedName>,
}

impl UnmatchedReport {
    pub fn new() -> Self {
        UnmatchedReport::default()
    }

    /// Look up suggestions for a source's unresolved names.
    pub fn add_source<S: AsRef<str>>(
        &mut self,
        resolver: &CountryResolver,
        source: &str,
        names: &[S],
    ) {
        let cutoff = resolver.config().suggestion_threshold;

        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            let key = (source.to_string(), name.to_string());
            if self.entries.contains_key(&key) {
                continue;
            }

            let entry = match resolver.best_candidate(name, cutoff) {
                Some(candidate) => UnmatchedName {
                    source: source.to_string(),
                    country_name: name.to_string(),
                    suggested_match: candidate.canonical_name,
                    suggested_iso3: candidate.iso3,
                    score: Some(candidate.score),
                },
                None => UnmatchedName {
                    source: source.to_string(),
                    country_name: name.to_string(),
                    suggested_match: String::new(),
                    suggested_iso3: String::new(),
                    score: None,
                },
            };
            self.entries.insert(key, entry);
        }
    }

    /// Entries sorted by (source, name)
    pub fn entries(&self) -> Vec<UnmatchedName> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> String {
        let with_suggestion = self.entries.values().filter(|e| e.has_suggestion()).count();
        format!(
            "Unmatched names: {} ({} with a suggestion)",
            self.entries.len(),
            with_suggestion
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
