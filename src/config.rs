// ⚙️ Harmonization Config - naming quirks as data
//
// Alias table, qualifier words, thresholds and the exclusion policy are
// values handed to the resolver, so several pipelines with different
// conventions can run side by side.

use crate::error::{Error, Result};
use crate::exclusion::ExclusionPolicy;
use crate::fold::fold;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Fuzzy matches below this ratio are rejected.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.88;

/// Diagnostics report the nearest candidate down to this ratio.
pub const DEFAULT_SUGGESTION_THRESHOLD: f64 = 0.75;

const DEFAULT_QUALIFIERS: &[&str] = &[
    "republic",
    "state",
    "islamic",
    "federation",
    "democratic",
    "people s",
];

const DEFAULT_CONNECTORS: &[&str] = &["of", "the", "and"];

/// alias → canonical name, both sides folded on load
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("cote d ivoire", "cote d'ivoire"),
    ("ivory coast", "cote d'ivoire"),
    ("viet nam", "vietnam"),
    ("russian federation", "russia"),
    ("bolivia plurinational state of", "bolivia"),
    ("bolivia plurinational state", "bolivia"),
    ("brunei darussalam", "brunei"),
    ("congo democratic republic of the", "democratic republic of the congo"),
    ("congo dem rep", "democratic republic of the congo"),
    ("congo republic of the", "congo"),
    ("congo rep", "congo"),
    ("iran islamic republic of", "iran"),
    ("lao people s democratic republic", "laos"),
    ("micronesia federated states of", "micronesia"),
    ("moldova republic of", "moldova"),
    ("korea republic of", "south korea"),
    ("korea democratic people s republic of", "north korea"),
    ("syrian arab republic", "syria"),
    ("tanzania united republic of", "tanzania"),
    ("united states of america", "united states"),
    ("eswatini", "swaziland"),
    ("cabo verde", "cape verde"),
    ("holy see", "vatican city"),
    ("myanmar", "burma"),
    ("egypt arab rep", "egypt"),
    ("gambia the", "gambia"),
    ("kyrgyz republic", "kyrgyzstan"),
];

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonizeConfig {
    /// Alternate folded name → folded canonical name
    pub aliases: BTreeMap<String, String>,

    /// Generic words removed to build stripped variants
    pub qualifier_words: Vec<String>,

    /// Words trimmed from the edges of a stripped variant
    pub connector_words: Vec<String>,

    /// Minimum similarity for a fuzzy match to resolve
    pub fuzzy_threshold: f64,

    /// Minimum similarity for a diagnostics suggestion
    pub suggestion_threshold: f64,

    pub exclusion: ExclusionPolicy,
}

impl Default for HarmonizeConfig {
    fn default() -> Self {
        HarmonizeConfig {
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            qualifier_words: DEFAULT_QUALIFIERS.iter().map(|s| s.to_string()).collect(),
            connector_words: DEFAULT_CONNECTORS.iter().map(|s| s.to_string()).collect(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            suggestion_threshold: DEFAULT_SUGGESTION_THRESHOLD,
            exclusion: ExclusionPolicy::default(),
        }
        .normalized()
    }
}

impl HarmonizeConfig {
    /// Load config from a JSON file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: HarmonizeConfig = serde_json::from_str(content)?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Fold alias keys/targets and word lists so they compare against folded names.
    ///
    /// Hand-written entries like "cote d'ivoire" would otherwise never match.
    pub fn normalized(self) -> Self {
        let fold_words = |words: &[String]| -> Vec<String> {
            let mut out: Vec<String> = Vec::new();
            for w in words.iter().map(|w| fold(w)).filter(|w| !w.is_empty()) {
                if !out.contains(&w) {
                    out.push(w);
                }
            }
            out
        };

        HarmonizeConfig {
            aliases: fold_aliases(&self.aliases),
            qualifier_words: fold_words(&self.qualifier_words),
            connector_words: fold_words(&self.connector_words),
            fuzzy_threshold: self.fuzzy_threshold,
            suggestion_threshold: self.suggestion_threshold,
            exclusion: self.exclusion.normalized(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_threshold("fuzzy_threshold", self.fuzzy_threshold)?;
        check_threshold("suggestion_threshold", self.suggestion_threshold)?;
        Ok(())
    }

    /// Alias rewrite of an already folded key; unknown keys pass through.
    pub fn alias_for<'a>(&'a self, folded: &'a str) -> &'a str {
        self.aliases
            .get(folded)
            .map(String::as_str)
            .unwrap_or(folded)
    }

    /// Builder: replace the exclusion policy
    pub fn with_exclusion(mut self, exclusion: ExclusionPolicy) -> Self {
        self.exclusion = exclusion.normalized();
        self
    }

    /// Builder: add one alias entry
    pub fn with_alias(mut self, alias: &str, canonical: &str) -> Self {
        let (k, v) = (fold(alias), fold(canonical));
        if !k.is_empty() && !v.is_empty() {
            self.aliases.insert(k, v);
        }
        self
    }

    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }
}

/// Fold both sides of every alias. Keys that fold together keep the entry
/// that comes last in key order; a changed target is logged.
fn fold_aliases(aliases: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut folded: BTreeMap<String, String> = BTreeMap::new();
    for (alias, target) in aliases {
        let (key, value) = (fold(alias), fold(target));
        if key.is_empty() || value.is_empty() {
            continue;
        }
        if let Some(previous) = folded.insert(key.clone(), value.clone()) {
            if previous != value {
                warn!(
                    key = %key,
                    alias = %alias,
                    previous = %previous,
                    target = %value,
                    "alias keys fold together, later entry wins"
                );
            }
        }
    }
    folded
}

fn check_threshold(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidThreshold { name, value })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HarmonizeConfig::default();

        assert_eq!(config.fuzzy_threshold, 0.88);
        assert_eq!(config.suggestion_threshold, 0.75);
        assert!(config.qualifier_words.contains(&"people s".to_string()));
        assert!(config.exclusion.excludes_iso3("ISR"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_aliases_are_folded() {
        let config = HarmonizeConfig::default();

        assert_eq!(config.alias_for("russian federation"), "russia");
        // "cote d'ivoire" target is folded on load
        assert_eq!(config.alias_for("ivory coast"), "cote d ivoire");
        assert_eq!(config.alias_for("chad"), "chad");
    }

    #[test]
    fn test_from_json_partial_override() {
        let config = HarmonizeConfig::from_json(
            r#"{
                "aliases": {"Türkiye": "Turkey"},
                "fuzzy_threshold": 0.9
            }"#,
        )
        .unwrap();

        assert_eq!(config.aliases.len(), 1);
        assert_eq!(config.alias_for("turkiye"), "turkey");
        assert_eq!(config.fuzzy_threshold, 0.9);
        // untouched keys keep defaults
        assert_eq!(config.suggestion_threshold, 0.75);
        assert_eq!(config.qualifier_words.len(), 6);
    }

    #[test]
    fn test_alias_keys_folding_together_keep_one_entry() {
        let config = HarmonizeConfig::from_json(
            r#"{
                "aliases": {
                    "Côte d'Ivoire": "Ivory Coast",
                    "cote-d-ivoire": "Cote d'Ivoire",
                    "Burma": "Myanmar"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.aliases.len(), 2);
        // "cote-d-ivoire" sorts after "Côte d'Ivoire" and wins
        assert_eq!(config.alias_for("cote d ivoire"), "cote d ivoire");
        assert_eq!(config.alias_for("burma"), "myanmar");
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let result = HarmonizeConfig::from_json(r#"{"fuzzy_threshold": 1.2}"#);
        assert!(matches!(
            result,
            Err(Error::InvalidThreshold {
                name: "fuzzy_threshold",
                ..
            })
        ));

        let result = HarmonizeConfig::from_json(r#"{"fuzzy_threshold": "high"}"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"exclusion": {{"iso3": ["PRK"], "name_keywords": []}}}}"#
        )
        .unwrap();

        let config = HarmonizeConfig::from_file(file.path()).unwrap();
        assert!(config.exclusion.excludes_iso3("prk"));
        assert!(!config.exclusion.excludes_iso3("ISR"));
        assert!(!config.exclusion.excludes_name("Israel"));
    }

    #[test]
    fn test_builders() {
        let config = HarmonizeConfig::default()
            .with_alias("Burma, Union of", "Myanmar")
            .with_exclusion(ExclusionPolicy::none())
            .with_fuzzy_threshold(0.95);

        assert_eq!(config.alias_for("burma union of"), "myanmar");
        assert!(config.exclusion.is_empty());
        assert_eq!(config.fuzzy_threshold, 0.95);
    }
}
