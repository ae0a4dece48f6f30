// DW Harmonize - Core Library
// Country-name resolution for the warehouse ETL: one conformed country
// dimension, every source name mapped onto it.

pub mod config;      // Aliases, qualifiers, thresholds (JSON)
pub mod dataset;     // CSV in/out
pub mod diagnostics; // Unmatched-name suggestions
pub mod entities;    // Country registry
pub mod error;
pub mod exclusion;   // Excluded identities
pub mod fold;        // Name folding
pub mod harmonize;   // Source table harmonization
pub mod lookup;      // Folded name → identity index
pub mod resolver;    // resolve(raw) → (iso3, canonical name)
pub mod similarity;  // Ratcliff/Obershelp ratio

// Re-export commonly used types
pub use config::{HarmonizeConfig, DEFAULT_FUZZY_THRESHOLD, DEFAULT_SUGGESTION_THRESHOLD};
pub use dataset::{
    load_reference, read_table, write_dim_country, write_table, write_unmatched,
    Table, DIM_COUNTRY_FILE, UNMATCHED_FILE,
};
pub use diagnostics::{UnmatchedName, UnmatchedReport};
pub use entities::{CountryIdentity, CountryRegistry, ReferenceRow};
pub use error::{Error, Result};
pub use exclusion::ExclusionPolicy;
pub use fold::{fold, strip_qualifiers};
pub use harmonize::{HarmonizeSummary, HarmonizedTable, Harmonizer, ISO3_COLUMN};
pub use lookup::{CollisionOutcome, LookupTable, NameVariant, VariantCollision, VariantSource};
pub use resolver::{Candidate, CountryResolver, MatchMethod, Resolution};
pub use similarity::ratio;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
