// 🗂️ Lookup Table - folded name variants → country identity
//
// Built once from a registry + config, then only read:
//   1. canonical names, folded
//   2. stripped forms (qualifier words removed)
//   3. alias keys whose target is a canonical folded name
//
// A folded key maps to exactly one identity. Collisions are logged and kept
// in `collisions()` for review.

use crate::config::HarmonizeConfig;
use crate::entities::{CountryIdentity, CountryRegistry};
use crate::fold::{fold, strip_qualifiers};
use crate::similarity::{admissible_lengths, ratio, ratio_upper_bound};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

// ============================================================================
// NAME VARIANT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariantSource {
    /// The identity's own name, folded
    Canonical,

    /// Canonical name with qualifier words removed
    Stripped,

    /// Entry from the alias table
    Alias,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameVariant {
    pub folded_text: String,
    pub iso3: String,
    pub canonical_name: String,
    pub source: VariantSource,
}

impl NameVariant {
    fn new(folded_text: String, identity: &CountryIdentity, source: VariantSource) -> Self {
        NameVariant {
            folded_text,
            iso3: identity.iso3.clone(),
            canonical_name: identity.canonical_name.clone(),
            source,
        }
    }
}

// ============================================================================
// COLLISIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionOutcome {
    /// Incoming variant replaced the existing one (last write wins)
    Replaced,

    /// Derived stripped form would have shadowed a canonical name
    KeptExisting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantCollision {
    pub folded_text: String,
    pub existing_iso3: String,
    pub incoming_iso3: String,
    pub incoming_source: VariantSource,
    pub outcome: CollisionOutcome,
}

// ============================================================================
// LOOKUP TABLE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    index: HashMap<String, NameVariant>,

    /// Distinct keys bucketed by character count, sorted inside a bucket
    by_length: BTreeMap<usize, Vec<String>>,

    collisions: Vec<VariantCollision>,
}

impl LookupTable {
    pub fn build(registry: &CountryRegistry, config: &HarmonizeConfig) -> Self {
        let mut table = LookupTable::default();

        let canonical: Vec<(String, &CountryIdentity)> = registry
            .iter()
            .map(|c| (fold(&c.canonical_name), c))
            .filter(|(key, _)| !key.is_empty())
            .collect();

        // 1. canonical names
        for (key, identity) in &canonical {
            table.insert(key.clone(), identity, VariantSource::Canonical);
        }

        // 2. stripped forms; two identities stripping to the same form are
        //    settled by registry order like any other collision
        for (key, identity) in &canonical {
            let base = strip_qualifiers(key, &config.qualifier_words, &config.connector_words);
            if !base.is_empty() && base != *key {
                table.insert(base, identity, VariantSource::Stripped);
            }
        }

        // 3. aliases pointing at a canonical folded name
        for (key, identity) in &canonical {
            for (alias, target) in &config.aliases {
                if target == key {
                    table.insert(alias.clone(), identity, VariantSource::Alias);
                }
            }
        }

        table.index_lengths();
        info!(
            variants = table.len(),
            collisions = table.collisions.len(),
            "country lookup table built"
        );
        table
    }

    fn insert(&mut self, key: String, identity: &CountryIdentity, source: VariantSource) {
        if !self.index.contains_key(&key) {
            self.index
                .insert(key.clone(), NameVariant::new(key, identity, source));
            return;
        }
        let existing = &self.index[&key];

        // same (key, iso3) pair is registered once
        if existing.iso3 == identity.iso3 {
            return;
        }

        let outcome = if source == VariantSource::Stripped
            && existing.source == VariantSource::Canonical
        {
            CollisionOutcome::KeptExisting
        } else {
            CollisionOutcome::Replaced
        };

        let collision = VariantCollision {
            folded_text: key.clone(),
            existing_iso3: existing.iso3.clone(),
            incoming_iso3: identity.iso3.clone(),
            incoming_source: source,
            outcome,
        };
        self.record(collision);

        if outcome == CollisionOutcome::Replaced {
            self.index
                .insert(key.clone(), NameVariant::new(key, identity, source));
        }
    }

    fn record(&mut self, collision: VariantCollision) {
        warn!(
            key = %collision.folded_text,
            existing = %collision.existing_iso3,
            incoming = %collision.incoming_iso3,
            outcome = ?collision.outcome,
            "name variant collision"
        );
        self.collisions.push(collision);
    }

    fn index_lengths(&mut self) {
        let mut by_length: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for key in self.index.keys() {
            by_length
                .entry(key.chars().count())
                .or_default()
                .push(key.clone());
        }
        for keys in by_length.values_mut() {
            keys.sort();
        }
        self.by_length = by_length;
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Exact lookup of a folded key
    pub fn get(&self, folded: &str) -> Option<&NameVariant> {
        self.index.get(folded)
    }

    /// Closest key with similarity at or above `cutoff`.
    ///
    /// Only buckets whose length can reach the cutoff are scanned. Equal
    /// scores go to the lexicographically greater key.
    pub fn best_match(&self, folded: &str, cutoff: f64) -> Option<(&NameVariant, f64)> {
        let query_len = folded.chars().count();
        let (low, high) = admissible_lengths(query_len, cutoff);

        let mut best: Option<(&str, f64)> = None;
        for (len, keys) in self.by_length.range(low..=high) {
            if ratio_upper_bound(query_len, *len) < cutoff {
                continue;
            }
            for key in keys {
                let score = ratio(key, folded);
                if score < cutoff {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((best_key, best_score)) => {
                        score > best_score || (score == best_score && key.as_str() > best_key)
                    }
                };
                if better {
                    best = Some((key.as_str(), score));
                }
            }
        }

        best.and_then(|(key, score)| self.index.get(key).map(|v| (v, score)))
    }

    /// All variants, sorted by folded key
    pub fn variants(&self) -> Vec<&NameVariant> {
        let mut all: Vec<&NameVariant> = self.index.values().collect();
        all.sort_by(|a, b| a.folded_text.cmp(&b.folded_text));
        all
    }

    pub fn collisions(&self) -> &[VariantCollision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(pairs: &[(&str, &str)]) -> CountryRegistry {
        CountryRegistry::from_identities(
            pairs
                .iter()
                .map(|(iso3, name)| CountryIdentity::new(iso3, name)),
        )
    }

    #[test]
    fn test_canonical_and_stripped_variants() {
        let reg = registry(&[("IRN", "Iran, Islamic Republic of"), ("USA", "United States")]);
        let table = LookupTable::build(&reg, &HarmonizeConfig::default());

        let canonical = table.get("iran islamic republic of").unwrap();
        assert_eq!(canonical.iso3, "IRN");
        assert_eq!(canonical.source, VariantSource::Canonical);

        let stripped = table.get("iran").unwrap();
        assert_eq!(stripped.iso3, "IRN");
        assert_eq!(stripped.canonical_name, "Iran, Islamic Republic of");
        assert_eq!(stripped.source, VariantSource::Stripped);

        assert_eq!(table.get("united states").unwrap().iso3, "USA");
        assert!(table.collisions().is_empty());
    }

    #[test]
    fn test_alias_variants_only_for_registered_targets() {
        let reg = registry(&[("RUS", "Russia")]);
        let table = LookupTable::build(&reg, &HarmonizeConfig::default());

        let alias = table.get("russian federation").unwrap();
        assert_eq!(alias.iso3, "RUS");
        assert_eq!(alias.source, VariantSource::Alias);

        // target "vietnam" is not in the registry
        assert!(table.get("viet nam").is_none());
    }

    #[test]
    fn test_alias_overrides_stripped_form() {
        let reg = registry(&[("AAA", "Alpha Republic"), ("BBB", "Beta")]);
        let config = HarmonizeConfig::default().with_alias("alpha", "beta");
        let table = LookupTable::build(&reg, &config);

        let hit = table.get("alpha").unwrap();
        assert_eq!(hit.iso3, "BBB");
        assert_eq!(hit.source, VariantSource::Alias);

        let collision = &table.collisions()[0];
        assert_eq!(collision.existing_iso3, "AAA");
        assert_eq!(collision.incoming_iso3, "BBB");
        assert_eq!(collision.outcome, CollisionOutcome::Replaced);
    }

    #[test]
    fn test_stripped_form_never_shadows_canonical_name() {
        let reg = registry(&[
            ("COG", "Congo"),
            ("COD", "Democratic Republic of the Congo"),
        ]);
        let table = LookupTable::build(&reg, &HarmonizeConfig::default());

        assert_eq!(table.get("congo").unwrap().iso3, "COG");
        assert_eq!(table.collisions().len(), 1);
        assert_eq!(table.collisions()[0].outcome, CollisionOutcome::KeptExisting);
    }

    #[test]
    fn test_shared_stripped_form_goes_to_last_identity() {
        let reg = registry(&[
            ("KOR", "Korea, Republic of"),
            ("PRK", "Korea, Democratic People's Republic of"),
        ]);
        let table = LookupTable::build(&reg, &HarmonizeConfig::default());

        // registry order: "Korea, Democratic..." < "Korea, Republic of"
        let hit = table.get("korea").unwrap();
        assert_eq!(hit.iso3, "KOR");
        assert_eq!(hit.source, VariantSource::Stripped);

        assert_eq!(table.collisions().len(), 1);
        let collision = &table.collisions()[0];
        assert_eq!(collision.folded_text, "korea");
        assert_eq!(collision.existing_iso3, "PRK");
        assert_eq!(collision.incoming_iso3, "KOR");
        assert_eq!(collision.outcome, CollisionOutcome::Replaced);
    }

    #[test]
    fn test_canonical_collision_last_write_wins() {
        let reg = registry(&[("AAA", "Saint-Martin"), ("BBB", "Saint Martin")]);
        let table = LookupTable::build(&reg, &HarmonizeConfig::default());

        // registry order is by canonical name: "Saint Martin" < "Saint-Martin"
        assert_eq!(table.get("saint martin").unwrap().iso3, "AAA");
        assert_eq!(table.collisions().len(), 1);
    }

    #[test]
    fn test_best_match_threshold() {
        let reg = registry(&[("DEU", "Germany"), ("CHL", "Chile"), ("TCD", "Chad")]);
        let table = LookupTable::build(&reg, &HarmonizeConfig::default());

        let (variant, score) = table.best_match("germny", 0.88).unwrap();
        assert_eq!(variant.iso3, "DEU");
        assert!(score >= 0.88);

        assert!(table.best_match("chile", 0.88).is_some());
        assert!(table.best_match("chd", 0.88).is_none());
        assert!(table.best_match("chil", 0.95).is_none());
    }

    #[test]
    fn test_best_match_tie_goes_to_greater_key() {
        let reg = registry(&[("AAA", "abcx"), ("BBB", "abcy")]);
        let table = LookupTable::build(&reg, &HarmonizeConfig::default());

        let (variant, _) = table.best_match("abc", 0.5).unwrap();
        assert_eq!(variant.folded_text, "abcy");
    }

    #[test]
    fn test_empty_registry_gives_empty_table() {
        let table = LookupTable::build(&CountryRegistry::empty(), &HarmonizeConfig::default());
        assert!(table.is_empty());
        assert!(table.best_match("germany", 0.0).is_none());
    }

    #[test]
    fn test_variants_are_sorted() {
        let reg = registry(&[("USA", "United States"), ("CAN", "Canada")]);
        let table = LookupTable::build(&reg, &HarmonizeConfig::default());
        let keys: Vec<&str> = table
            .variants()
            .iter()
            .map(|v| v.folded_text.as_str())
            .collect();

        assert_eq!(keys, vec!["canada", "united states", "united states of america"]);
    }
}
