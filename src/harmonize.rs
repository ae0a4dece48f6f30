// 🔗 Harmonizer - attach ISO3 to source rows
//
// What every loader needs after resolution:
// - resolve each distinct raw name once (fuzzy scans are the expensive part)
// - re-check the exclusion policy on raw name, claimed code and result
// - rewrite the name column to the canonical name, append iso3
// - hand unresolved names to diagnostics

use crate::dataset::Table;
use crate::error::Result;
use crate::exclusion::ExclusionPolicy;
use crate::resolver::{CountryResolver, MatchMethod, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

pub const ISO3_COLUMN: &str = "iso3";

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarmonizeSummary {
    pub source: String,
    pub rows_in: usize,
    pub rows_out: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub excluded: usize,
    pub distinct_names: usize,
    pub fuzzy_matches: usize,
    pub hint_matches: usize,
}

impl HarmonizeSummary {
    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows in, {} out ({} resolved, {} unresolved, {} excluded), {} distinct names",
            self.source,
            self.rows_in,
            self.rows_out,
            self.resolved,
            self.unresolved,
            self.excluded,
            self.distinct_names
        )
    }

    /// Share of kept rows that carry an ISO3
    pub fn match_rate(&self) -> f64 {
        let considered = self.resolved + self.unresolved;
        if considered == 0 {
            return 0.0;
        }
        self.resolved as f64 / considered as f64
    }
}

#[derive(Debug, Clone)]
pub struct HarmonizedTable {
    pub table: Table,
    pub summary: HarmonizeSummary,

    /// Distinct raw names that did not resolve (excluded names left out)
    pub unresolved_names: Vec<String>,
}

// ============================================================================
// HARMONIZER
// ============================================================================

pub struct Harmonizer<'a> {
    resolver: &'a CountryResolver,
    policy: ExclusionPolicy,
    drop_unresolved: bool,
}

impl<'a> Harmonizer<'a> {
    /// Harmonizer using the resolver's configured exclusion policy.
    pub fn new(resolver: &'a CountryResolver) -> Self {
        Harmonizer {
            resolver,
            policy: resolver.config().exclusion.clone(),
            drop_unresolved: false,
        }
    }

    /// Swap the post-resolution exclusion policy for this caller only.
    pub fn with_policy(mut self, policy: ExclusionPolicy) -> Self {
        self.policy = policy.normalized();
        self
    }

    /// Drop rows whose name does not resolve instead of keeping them without iso3.
    pub fn drop_unresolved(mut self, drop: bool) -> Self {
        self.drop_unresolved = drop;
        self
    }

    pub fn policy(&self) -> &ExclusionPolicy {
        &self.policy
    }

    /// Resolve each distinct name once.
    pub fn resolve_distinct<'n, I>(&self, names: I) -> HashMap<String, Resolution>
    where
        I: IntoIterator<Item = &'n str>,
    {
        let mut cache: HashMap<String, Resolution> = HashMap::new();
        for name in names {
            if !cache.contains_key(name) {
                cache.insert(name.to_string(), self.resolver.resolve(name));
            }
        }
        cache
    }

    /// Post-resolution filter: false when the raw name, the claimed code or
    /// the resolved identity is excluded.
    pub fn accepts(&self, raw: &str, claimed_iso3: Option<&str>, resolution: &Resolution) -> bool {
        if self.policy.excludes_name(raw) {
            return false;
        }
        if claimed_iso3.map_or(false, |code| self.policy.excludes_iso3(code)) {
            return false;
        }
        !self
            .policy
            .is_excluded(&resolution.canonical_name, &resolution.iso3)
    }

    /// Harmonize a source table.
    ///
    /// `name_column` holds the raw country name; `iso3_column`, when given,
    /// holds a claimed code used only as a fallback. The output keeps every
    /// input column, rewrites the name to its canonical form and sets `iso3`.
    pub fn harmonize_table(
        &self,
        source: &str,
        table: &Table,
        name_column: &str,
        iso3_column: Option<&str>,
    ) -> Result<HarmonizedTable> {
        let name_idx = table.require_column(name_column, source)?;
        let hint_idx = iso3_column
            .map(|column| table.require_column(column, source))
            .transpose()?;

        let mut headers = table.headers.clone();
        let iso3_idx = match table.column_index(ISO3_COLUMN) {
            Some(idx) => idx,
            None => {
                headers.push(ISO3_COLUMN.to_string());
                headers.len() - 1
            }
        };

        let mut cache: HashMap<(String, Option<String>), Resolution> = HashMap::new();
        let mut distinct: BTreeSet<&str> = BTreeSet::new();
        let mut unresolved_names: BTreeSet<String> = BTreeSet::new();
        let mut summary = HarmonizeSummary {
            source: source.to_string(),
            rows_in: table.len(),
            ..Default::default()
        };
        let mut output = Table::new(headers);

        for record in &table.records {
            let raw = record.get(name_idx).map(String::as_str).unwrap_or("");
            let hint = hint_idx
                .and_then(|idx| record.get(idx))
                .map(|c| c.trim())
                .filter(|c| !c.is_empty());
            distinct.insert(raw);

            let resolution = cache
                .entry((raw.to_string(), hint.map(str::to_string)))
                .or_insert_with(|| self.resolver.resolve_with_hint(raw, hint));

            if !self.accepts(raw, hint, resolution) {
                summary.excluded += 1;
                continue;
            }

            if !resolution.is_resolved() {
                summary.unresolved += 1;
                if !raw.trim().is_empty() {
                    unresolved_names.insert(raw.to_string());
                }
                if self.drop_unresolved {
                    continue;
                }
            } else {
                summary.resolved += 1;
                match resolution.method {
                    MatchMethod::Fuzzy => summary.fuzzy_matches += 1,
                    MatchMethod::Iso3Hint => summary.hint_matches += 1,
                    _ => {}
                }
            }

            let mut row = record.clone();
            row.resize(output.headers.len().max(row.len()), String::new());
            if resolution.is_resolved() {
                row[name_idx] = resolution.canonical_name.clone();
            }
            row[iso3_idx] = resolution.iso3.clone();
            output.records.push(row);
        }

        summary.rows_out = output.len();
        summary.distinct_names = distinct.len();
        info!(
            source,
            rows_in = summary.rows_in,
            rows_out = summary.rows_out,
            resolved = summary.resolved,
            unresolved = summary.unresolved,
            excluded = summary.excluded,
            "source harmonized"
        );

        Ok(HarmonizedTable {
            table: output,
            summary,
            unresolved_names: unresolved_names.into_iter().collect(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
