// 📂 Dataset I/O - reference CSV in, warehouse CSVs out
//
// Reference dataset → Vec<ReferenceRow>
// Registry          → Dim_Country.csv
// Source files      → Table (headers + records) → staging CSV
// Diagnostics       → UNMATCHED_COUNTRIES_suggestions.csv

use crate::diagnostics::UnmatchedName;
use crate::entities::{CountryRegistry, ReferenceRow};
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DIM_COUNTRY_FILE: &str = "Dim_Country.csv";
pub const UNMATCHED_FILE: &str = "UNMATCHED_COUNTRIES_suggestions.csv";

/// Column order of `CountryIdentity` rows
pub const DIM_COUNTRY_COLUMNS: [&str; 8] = [
    "iso3",
    "country_name",
    "world_bank_region",
    "un_region",
    "un_subregion",
    "income_group",
    "population_latest",
    "gdp_latest",
];

/// Column order of `UnmatchedName` rows
pub const UNMATCHED_COLUMNS: [&str; 5] = [
    "source",
    "country_name",
    "suggested_match",
    "suggested_iso3",
    "score",
];

// ============================================================================
// REFERENCE DATASET
// ============================================================================

/// Load the reference dataset.
///
/// Header names are trimmed and lowercased before matching. Rows that fail
/// to deserialize are skipped with a warning; a missing file is an error.
pub fn load_reference(path: &Path) -> Result<Vec<ReferenceRow>> {
    if !path.exists() {
        return Err(Error::ReferenceNotFound(path.to_path_buf()));
    }

    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: csv::StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    rdr.set_headers(headers);

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.deserialize::<ReferenceRow>() {
        match result {
            Ok(row) => rows.push(row),
            Err(err) => {
                skipped += 1;
                warn!(error = %err, "skipping malformed reference row");
            }
        }
    }

    if rows.is_empty() {
        warn!(path = %path.display(), "reference dataset has no usable rows");
    }
    info!(rows = rows.len(), skipped, "reference dataset loaded");
    Ok(rows)
}

/// Write the conformed country dimension. Returns the row count.
///
/// The header row is written even when the registry is empty.
pub fn write_dim_country(path: &Path, registry: &CountryRegistry) -> Result<usize> {
    let mut wtr = headed_writer(path, &DIM_COUNTRY_COLUMNS)?;
    for identity in registry.iter() {
        wtr.serialize(identity)?;
    }
    wtr.flush()?;

    info!(countries = registry.len(), path = %path.display(), "Dim_Country written");
    Ok(registry.len())
}

// ============================================================================
// GENERIC TABLES
// ============================================================================

/// CSV-shaped table: one header row, string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Table {
            headers,
            records: Vec::new(),
        }
    }

    /// Column position, matched case-insensitively after trimming
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
    }

    pub fn require_column(&self, name: &str, source: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| Error::MissingColumn {
            column: name.to_string(),
            source_name: source.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn read_table(path: &Path) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let width = headers.len();

    let mut table = Table::new(headers);
    for result in rdr.records() {
        let record = result?;
        let mut cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
        cells.resize(width.max(cells.len()), String::new());
        table.records.push(cells);
    }

    Ok(table)
}

pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    wtr.write_record(&table.headers)?;
    for record in &table.records {
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_unmatched(path: &Path, rows: &[UnmatchedName]) -> Result<()> {
    let mut wtr = headed_writer(path, &UNMATCHED_COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writer with the header row already out; records are serialized without
/// headers so an empty file still carries its columns.
fn headed_writer(path: &Path, columns: &[&str]) -> Result<csv::Writer<fs::File>> {
    ensure_parent(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    wtr.write_record(columns)?;
    Ok(wtr)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
