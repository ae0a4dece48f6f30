// 🌍 Country Entity - one canonical identity per ISO3
//
// "ISO3 is IDENTITY (never changes), the display name is a VALUE"
//
// Problem solved:
// - The reference dataset repeats each country once per year
// - The same ISO3 can appear under several spellings over time
// - Some jurisdictions are excluded by policy before anything else sees them

use crate::dataset::load_reference;
use crate::error::Result;
use crate::exclusion::ExclusionPolicy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

// ============================================================================
// REFERENCE ROW
// ============================================================================

/// One row of the reference dataset (population/region metadata by year).
///
/// Headers are matched case-insensitively; numeric cells that do not parse
/// read as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    #[serde(default)]
    pub country: Option<String>,

    #[serde(default)]
    pub c3: Option<String>,

    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub year: Option<f64>,

    #[serde(default)]
    pub region_wb: Option<String>,

    #[serde(default)]
    pub region_un: Option<String>,

    #[serde(default)]
    pub region_un_sub: Option<String>,

    #[serde(default)]
    pub incomegroup: Option<String>,

    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub population: Option<f64>,

    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub gdp: Option<f64>,
}

impl ReferenceRow {
    pub fn new(country: &str, c3: &str, year: Option<i32>) -> Self {
        ReferenceRow {
            country: Some(country.to_string()),
            c3: Some(c3.to_string()),
            year: year.map(f64::from),
            ..Default::default()
        }
    }

    /// Builder: attach World Bank region and population
    pub fn with_region(mut self, region_wb: &str, population: Option<f64>) -> Self {
        self.region_wb = Some(region_wb.to_string());
        self.population = population;
        self
    }

    fn name(&self) -> Option<&str> {
        non_blank(self.country.as_deref())
    }

    fn iso3(&self) -> Option<String> {
        non_blank(self.c3.as_deref()).map(|c| c.to_uppercase())
    }

    fn year_key(&self) -> Option<i64> {
        self.year.filter(|y| y.is_finite()).map(|y| y as i64)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn text(value: &Option<String>) -> Option<String> {
    non_blank(value.as_deref()).map(str::to_string)
}

// ============================================================================
// COUNTRY IDENTITY
// ============================================================================

/// Canonical country identity. Serialized as a `Dim_Country` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryIdentity {
    pub iso3: String,

    #[serde(rename = "country_name")]
    pub canonical_name: String,

    pub world_bank_region: Option<String>,
    pub un_region: Option<String>,
    pub un_subregion: Option<String>,
    pub income_group: Option<String>,
    pub population_latest: Option<f64>,
    pub gdp_latest: Option<f64>,

    /// Year of the record the identity was taken from
    #[serde(skip)]
    pub reference_year: Option<i64>,
}

impl CountryIdentity {
    pub fn new(iso3: &str, canonical_name: &str) -> Self {
        CountryIdentity {
            iso3: iso3.trim().to_uppercase(),
            canonical_name: canonical_name.trim().to_string(),
            world_bank_region: None,
            un_region: None,
            un_subregion: None,
            income_group: None,
            population_latest: None,
            gdp_latest: None,
            reference_year: None,
        }
    }

    fn from_row(row: &ReferenceRow, iso3: String, name: &str) -> Self {
        CountryIdentity {
            iso3,
            canonical_name: name.to_string(),
            world_bank_region: text(&row.region_wb),
            un_region: text(&row.region_un),
            un_subregion: text(&row.region_un_sub),
            income_group: text(&row.incomegroup),
            population_latest: row.population,
            gdp_latest: row.gdp,
            reference_year: row.year_key(),
        }
    }
}

// ============================================================================
// COUNTRY REGISTRY
// ============================================================================

/// Registry of canonical identities, sorted by canonical name.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct CountryRegistry {
    identities: Vec<CountryIdentity>,
    by_iso3: HashMap<String, usize>,
}

impl CountryRegistry {
    /// Empty registry: every resolution against it is unresolved.
    pub fn empty() -> Self {
        CountryRegistry::default()
    }

    /// Build from reference rows.
    ///
    /// 1. Keep the latest-year row per (name, ISO3); ties keep input order
    /// 2. Drop rows without ISO3
    /// 3. Drop excluded identities
    /// 4. One identity per ISO3 (latest year, then name order)
    /// 5. Sort by canonical name
    pub fn build(rows: &[ReferenceRow], policy: &ExclusionPolicy) -> Self {
        // 1-2. latest row per (name, iso3)
        let mut latest: HashMap<(String, String), usize> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            let (Some(name), Some(iso3)) = (row.name(), row.iso3()) else {
                continue;
            };
            latest
                .entry((name.to_string(), iso3))
                .and_modify(|kept| {
                    if row.year_key() > rows[*kept].year_key() {
                        *kept = idx;
                    }
                })
                .or_insert(idx);
        }

        // 3. exclusion policy
        let mut excluded = 0usize;
        let mut candidates: Vec<CountryIdentity> = Vec::with_capacity(latest.len());
        for ((name, iso3), idx) in latest {
            if policy.is_excluded(&name, &iso3) {
                excluded += 1;
                continue;
            }
            candidates.push(CountryIdentity::from_row(&rows[idx], iso3, &name));
        }

        // 4. one per iso3: latest year first, then name order
        candidates.sort_by(|a, b| {
            a.iso3
                .cmp(&b.iso3)
                .then_with(|| b.reference_year.cmp(&a.reference_year))
                .then_with(|| a.canonical_name.cmp(&b.canonical_name))
        });
        candidates.dedup_by(|later, first| later.iso3 == first.iso3);

        // 5. deterministic output order
        candidates.sort_by(by_name);

        let registry = CountryRegistry::from_sorted(candidates);
        info!(
            countries = registry.len(),
            excluded,
            rows = rows.len(),
            "country registry built"
        );
        registry
    }

    /// Load the reference CSV and build the registry.
    ///
    /// A missing file is an error; a file without usable rows is not.
    pub fn load<P: AsRef<Path>>(path: P, policy: &ExclusionPolicy) -> Result<Self> {
        let rows = load_reference(path.as_ref())?;
        debug!(rows = rows.len(), path = %path.as_ref().display(), "reference rows loaded");
        Ok(CountryRegistry::build(&rows, policy))
    }

    /// Registry straight from identities (first occurrence of an ISO3 wins).
    pub fn from_identities<I>(identities: I) -> Self
    where
        I: IntoIterator<Item = CountryIdentity>,
    {
        let mut seen = BTreeSet::new();
        let mut unique: Vec<CountryIdentity> = identities
            .into_iter()
            .filter(|c| !c.iso3.is_empty() && seen.insert(c.iso3.clone()))
            .collect();
        unique.sort_by(by_name);
        CountryRegistry::from_sorted(unique)
    }

    fn from_sorted(identities: Vec<CountryIdentity>) -> Self {
        let by_iso3 = identities
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.iso3.clone(), idx))
            .collect();
        CountryRegistry {
            identities,
            by_iso3,
        }
    }

    pub fn get(&self, iso3: &str) -> Option<&CountryIdentity> {
        self.by_iso3
            .get(&iso3.trim().to_uppercase())
            .map(|idx| &self.identities[*idx])
    }

    pub fn contains(&self, iso3: &str) -> bool {
        self.get(iso3).is_some()
    }

    /// All identities in canonical-name order
    pub fn identities(&self) -> &[CountryIdentity] {
        &self.identities
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryIdentity> {
        self.identities.iter()
    }

    pub fn iso3_codes(&self) -> BTreeSet<String> {
        self.by_iso3.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

fn by_name(a: &CountryIdentity, b: &CountryIdentity) -> Ordering {
    a.canonical_name
        .cmp(&b.canonical_name)
        .then_with(|| a.iso3.cmp(&b.iso3))
}

// ============================================================================
// TESTS
// ============================================================================
