// 🔍 Country Resolver - free-text name → canonical ISO3 identity
//
// Precedence (first hit wins):
//   1. empty input          → unresolved
//   2. key = alias(fold(name))
//   3. exact key lookup     → Exact
//   4. best fuzzy key ≥ threshold → Fuzzy
//   5. otherwise            → unresolved
//
// Unresolved is a normal outcome, never an error. The resolver only reads
// its registry and lookup table, so one instance can be shared freely.

use crate::config::HarmonizeConfig;
use crate::entities::{CountryIdentity, CountryRegistry};
use crate::error::Result;
use crate::fold::fold;
use crate::lookup::LookupTable;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

// ============================================================================
// RESOLUTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMethod {
    /// Folded (alias-rewritten) name found in the lookup table
    Exact,

    /// Closest lookup key above the fuzzy threshold
    Fuzzy,

    /// Name failed, the caller's claimed ISO3 is a registered identity
    Iso3Hint,

    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Empty when unresolved
    pub iso3: String,

    /// Empty when unresolved
    pub canonical_name: String,

    pub method: MatchMethod,

    /// 1.0 for exact, similarity for fuzzy, 0.0 when unresolved
    pub score: f64,
}

impl Resolution {
    pub fn unresolved() -> Self {
        Resolution {
            iso3: String::new(),
            canonical_name: String::new(),
            method: MatchMethod::Unresolved,
            score: 0.0,
        }
    }

    fn matched(iso3: &str, canonical_name: &str, method: MatchMethod, score: f64) -> Self {
        Resolution {
            iso3: iso3.to_string(),
            canonical_name: canonical_name.to_string(),
            method,
            score,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.iso3.is_empty()
    }

    /// (iso3, canonical_name), both empty when unresolved
    pub fn as_pair(&self) -> (&str, &str) {
        (&self.iso3, &self.canonical_name)
    }
}

/// Nearest lookup key for a name, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub folded_text: String,
    pub iso3: String,
    pub canonical_name: String,
    pub score: f64,
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Debug, Clone)]
pub struct CountryResolver {
    registry: CountryRegistry,
    lookup: LookupTable,
    config: HarmonizeConfig,
}

impl CountryResolver {
    /// Build the lookup table for a registry. Done once per run.
    pub fn new(registry: CountryRegistry, config: HarmonizeConfig) -> Self {
        let lookup = LookupTable::build(&registry, &config);
        CountryResolver {
            registry,
            lookup,
            config,
        }
    }

    /// Registry + lookup straight from the reference CSV.
    pub fn from_reference<P: AsRef<Path>>(path: P, config: HarmonizeConfig) -> Result<Self> {
        let registry = CountryRegistry::load(path, &config.exclusion)?;
        Ok(CountryResolver::new(registry, config))
    }

    /// Comparison key for a raw name: folded, then alias-rewritten.
    pub fn lookup_key(&self, raw: &str) -> String {
        let folded = fold(raw);
        self.config.alias_for(&folded).to_string()
    }

    pub fn resolve(&self, raw: &str) -> Resolution {
        let key = self.lookup_key(raw);
        if key.is_empty() {
            return Resolution::unresolved();
        }

        if let Some(variant) = self.lookup.get(&key) {
            return Resolution::matched(
                &variant.iso3,
                &variant.canonical_name,
                MatchMethod::Exact,
                1.0,
            );
        }

        match self.lookup.best_match(&key, self.config.fuzzy_threshold) {
            Some((variant, score)) => {
                debug!(
                    raw,
                    key = %key,
                    matched = %variant.folded_text,
                    score,
                    "fuzzy country match"
                );
                Resolution::matched(
                    &variant.iso3,
                    &variant.canonical_name,
                    MatchMethod::Fuzzy,
                    score,
                )
            }
            None => Resolution::unresolved(),
        }
    }

    /// `None` behaves like an empty name.
    pub fn resolve_opt(&self, raw: Option<&str>) -> Resolution {
        raw.map(|name| self.resolve(name))
            .unwrap_or_else(Resolution::unresolved)
    }

    /// Resolve by name; fall back to a claimed ISO3 only if it is registered.
    pub fn resolve_with_hint(&self, raw: &str, claimed_iso3: Option<&str>) -> Resolution {
        let by_name = self.resolve(raw);
        if by_name.is_resolved() {
            return by_name;
        }

        claimed_iso3
            .and_then(|code| self.registry.get(code))
            .map(|identity| {
                Resolution::matched(
                    &identity.iso3,
                    &identity.canonical_name,
                    MatchMethod::Iso3Hint,
                    0.0,
                )
            })
            .unwrap_or(by_name)
    }

    /// Nearest candidate at or above `cutoff`, even if the resolver itself
    /// would reject it. Feeds the unmatched-name diagnostics.
    pub fn best_candidate(&self, raw: &str, cutoff: f64) -> Option<Candidate> {
        let key = self.lookup_key(raw);
        if key.is_empty() {
            return None;
        }

        if let Some(variant) = self.lookup.get(&key) {
            return Some(Candidate {
                folded_text: variant.folded_text.clone(),
                iso3: variant.iso3.clone(),
                canonical_name: variant.canonical_name.clone(),
                score: 1.0,
            });
        }

        self.lookup
            .best_match(&key, cutoff)
            .map(|(variant, score)| Candidate {
                folded_text: variant.folded_text.clone(),
                iso3: variant.iso3.clone(),
                canonical_name: variant.canonical_name.clone(),
                score,
            })
    }

    pub fn identity(&self, iso3: &str) -> Option<&CountryIdentity> {
        self.registry.get(iso3)
    }

    pub fn registry(&self) -> &CountryRegistry {
        &self.registry
    }

    pub fn lookup(&self) -> &LookupTable {
        &self.lookup
    }

    pub fn config(&self) -> &HarmonizeConfig {
        &self.config
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ReferenceRow;
    use crate::exclusion::ExclusionPolicy;

    fn reference_rows() -> Vec<ReferenceRow> {
        vec![
            ReferenceRow::new("United States", "USA", Some(2021)),
            ReferenceRow::new("Russia", "RUS", Some(2021)),
            ReferenceRow::new("Iran, Islamic Republic of", "IRN", Some(2020)),
            ReferenceRow::new("Germany", "DEU", Some(2021)),
            ReferenceRow::new("Chad", "TCD", Some(2019)),
            ReferenceRow::new("Viet Nam", "VNM", Some(2020)),
            ReferenceRow::new("Vietnam", "VNM", Some(2019)),
            ReferenceRow::new("Israel", "ISR", Some(2021)),
            ReferenceRow::new("Cote d'Ivoire", "CIV", Some(2021)),
        ]
    }

    fn resolver() -> CountryResolver {
        let config = HarmonizeConfig::default();
        let registry = CountryRegistry::build(&reference_rows(), &config.exclusion);
        CountryResolver::new(registry, config)
    }

    #[test]
    fn test_exact_match() {
        let r = resolver().resolve("United States");

        assert_eq!(r.as_pair(), ("USA", "United States"));
        assert_eq!(r.method, MatchMethod::Exact);
        assert_eq!(r.score, 1.0);
    }

    #[test]
    fn test_exact_match_ignores_case_and_punctuation() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("  UNITED STATES ").iso3, "USA");
        assert_eq!(resolver.resolve("Côte d’Ivoire").iso3, "CIV");
        assert_eq!(resolver.resolve("Cote-d-Ivoire").iso3, "CIV");
    }

    #[test]
    fn test_alias_resolution() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("Russian Federation").as_pair(), ("RUS", "Russia"));
        assert_eq!(
            resolver.resolve("United States of America").as_pair(),
            ("USA", "United States")
        );
        assert_eq!(resolver.resolve("Ivory Coast").iso3, "CIV");
    }

    #[test]
    fn test_stripped_qualifier_match() {
        let resolver = resolver();
        let short = resolver.resolve("Iran");
        let formal = resolver.resolve("Iran, Islamic Republic of");

        assert_eq!(short.iso3, "IRN");
        assert_eq!(short.iso3, formal.iso3);
        assert_eq!(short.canonical_name, "Iran, Islamic Republic of");
        assert_eq!(short.method, MatchMethod::Exact);
    }

    #[test]
    fn test_fuzzy_acceptance_boundary() {
        let resolver = resolver();

        let typo = resolver.resolve("Germny");
        assert_eq!(typo.as_pair(), ("DEU", "Germany"));
        assert_eq!(typo.method, MatchMethod::Fuzzy);
        assert!(typo.score >= 0.88 && typo.score < 1.0);

        // Chad is registered, Chile is not: no cross-resolution
        assert!(!resolver.resolve("Chile").is_resolved());
        assert_eq!(resolver.resolve("Chad").iso3, "TCD");
    }

    #[test]
    fn test_chad_does_not_resolve_to_chile() {
        let registry = CountryRegistry::from_identities(vec![CountryIdentity::new("CHL", "Chile")]);
        let resolver = CountryResolver::new(registry, HarmonizeConfig::default());

        assert_eq!(resolver.resolve("Chad"), Resolution::unresolved());
    }

    #[test]
    fn test_threshold_is_configurable() {
        let config = HarmonizeConfig::default().with_fuzzy_threshold(0.95);
        let registry = CountryRegistry::build(&reference_rows(), &config.exclusion);
        let strict = CountryResolver::new(registry, config);

        assert!(!strict.resolve("Germny").is_resolved());
    }

    #[test]
    fn test_excluded_identity_never_resolves() {
        let resolver = resolver();

        assert!(resolver.registry().get("ISR").is_none());
        assert_eq!(resolver.resolve("Israel"), Resolution::unresolved());
        assert_eq!(resolver.resolve("ISRAEL"), Resolution::unresolved());
    }

    #[test]
    fn test_empty_input() {
        let resolver = resolver();

        assert_eq!(resolver.resolve(""), Resolution::unresolved());
        assert_eq!(resolver.resolve("   "), Resolution::unresolved());
        assert_eq!(resolver.resolve("..."), Resolution::unresolved());
        assert_eq!(resolver.resolve_opt(None), Resolution::unresolved());
        assert_eq!(resolver.resolve_opt(Some("Chad")).iso3, "TCD");
    }

    #[test]
    fn test_viet_nam_end_to_end() {
        let rows = vec![
            ReferenceRow::new("Viet Nam", "VNM", Some(2020)),
            ReferenceRow::new("Vietnam", "VNM", Some(2019)),
        ];
        let config = HarmonizeConfig::default();
        let registry = CountryRegistry::build(&rows, &config.exclusion);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("VNM").unwrap().canonical_name, "Viet Nam");

        let resolver = CountryResolver::new(registry, config);
        assert_eq!(resolver.resolve("vietnam").as_pair(), ("VNM", "Viet Nam"));
        assert_eq!(resolver.resolve("Viet Nam").as_pair(), ("VNM", "Viet Nam"));
    }

    #[test]
    fn test_empty_registry_resolves_nothing() {
        let resolver = CountryResolver::new(CountryRegistry::empty(), HarmonizeConfig::default());

        assert_eq!(resolver.resolve("United States"), Resolution::unresolved());
        assert!(resolver.best_candidate("United States", 0.0).is_none());
    }

    #[test]
    fn test_resolve_with_hint() {
        let resolver = resolver();

        // name wins when it resolves
        let r = resolver.resolve_with_hint("Germany", Some("USA"));
        assert_eq!(r.iso3, "DEU");

        // unknown name, registered hint
        let r = resolver.resolve_with_hint("Federal Republic of Nowhere", Some("usa"));
        assert_eq!(r.as_pair(), ("USA", "United States"));
        assert_eq!(r.method, MatchMethod::Iso3Hint);

        // excluded or unknown hints do not help
        assert!(!resolver.resolve_with_hint("Nowhere", Some("ISR")).is_resolved());
        assert!(!resolver.resolve_with_hint("Nowhere", None).is_resolved());
    }

    #[test]
    fn test_best_candidate_below_threshold() {
        let resolver = resolver();

        // too far for resolution, close enough for a suggestion
        let name = "Germania";
        assert!(!resolver.resolve(name).is_resolved());
        let candidate = resolver.best_candidate(name, 0.75).unwrap();
        assert_eq!(candidate.iso3, "DEU");
        assert!(candidate.score >= 0.75 && candidate.score < 0.88);

        assert!(resolver.best_candidate("Atlantis", 0.75).is_none());
        assert_eq!(resolver.best_candidate("Chad", 0.75).unwrap().score, 1.0);
    }

    #[test]
    fn test_resolution_is_read_only_and_repeatable() {
        let resolver = resolver();
        let before = resolver.lookup().len();

        let first = resolver.resolve("Germny");
        let second = resolver.resolve("Germny");

        assert_eq!(first, second);
        assert_eq!(resolver.lookup().len(), before);
    }

    #[test]
    fn test_resolver_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CountryResolver>();
    }

    #[test]
    fn test_custom_exclusion_policy() {
        let config = HarmonizeConfig::default().with_exclusion(ExclusionPolicy::none());
        let registry = CountryRegistry::build(&reference_rows(), &config.exclusion);
        let resolver = CountryResolver::new(registry, config);

        assert_eq!(resolver.resolve("Israel").iso3, "ISR");
    }

    #[test]
    fn test_shared_stripped_form_still_resolves() {
        let registry = CountryRegistry::from_identities(vec![
            CountryIdentity::new("KOR", "Korea, Republic of"),
            CountryIdentity::new("PRK", "Korea, Democratic People's Republic of"),
        ]);
        let resolver = CountryResolver::new(registry, HarmonizeConfig::default());

        let r = resolver.resolve("Korea");
        assert_eq!(r.as_pair(), ("KOR", "Korea, Republic of"));
        assert_eq!(r.method, MatchMethod::Exact);
        assert_eq!(resolver.lookup().collisions().len(), 1);
    }
}
