// Entity Models
//
// Each entity has:
// - Stable identity (ISO3) that never changes
// - Values (display name, region metadata) chosen from the reference data
// - Registry for lookups

pub mod country;

pub use country::{CountryIdentity, CountryRegistry, ReferenceRow};
