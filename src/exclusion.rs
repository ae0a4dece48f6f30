// 🚫 Exclusion Policy - identities removed regardless of match quality
//
// Applied twice: when the registry is built, and again by the harmonizer
// after every resolution (the resolver itself never filters).

use crate::fold::fold;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of ISO3 codes and folded name keywords that are never accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionPolicy {
    /// ISO3 codes, compared case-insensitively
    pub iso3: BTreeSet<String>,

    /// Keywords matched as substrings of the folded name
    pub name_keywords: Vec<String>,
}

impl ExclusionPolicy {
    /// Policy that excludes nothing.
    pub fn none() -> Self {
        ExclusionPolicy {
            iso3: BTreeSet::new(),
            name_keywords: Vec::new(),
        }
    }

    pub fn new<I, K>(iso3: I, name_keywords: K) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        ExclusionPolicy {
            iso3: iso3.into_iter().map(|c| c.as_ref().to_string()).collect(),
            name_keywords: name_keywords
                .into_iter()
                .map(|k| k.as_ref().to_string())
                .collect(),
        }
        .normalized()
    }

    /// Upper-case codes, fold keywords, drop blanks.
    pub fn normalized(self) -> Self {
        ExclusionPolicy {
            iso3: self
                .iso3
                .iter()
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
            name_keywords: self
                .name_keywords
                .iter()
                .map(|k| fold(k))
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn excludes_iso3(&self, iso3: &str) -> bool {
        let code = iso3.trim();
        !code.is_empty() && self.iso3.iter().any(|c| c.eq_ignore_ascii_case(code))
    }

    pub fn excludes_name(&self, name: &str) -> bool {
        let folded = fold(name);
        !folded.is_empty() && self.name_keywords.iter().any(|k| folded.contains(k.as_str()))
    }

    /// True when either the code or the name hits the policy.
    pub fn is_excluded(&self, name: &str, iso3: &str) -> bool {
        self.excludes_iso3(iso3) || self.excludes_name(name)
    }

    pub fn is_empty(&self) -> bool {
        self.iso3.is_empty() && self.name_keywords.is_empty()
    }
}

impl Default for ExclusionPolicy {
    /// The warehouse excludes Israel by code and by name.
    fn default() -> Self {
        ExclusionPolicy::new(["ISR"], ["israel"])
    }
}

// ============================================================================
// TESTS
// ============================================================================
