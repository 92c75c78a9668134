//! Trip catalog: entry types, YAML parsing and the memoized loader.

pub mod loader;
pub mod models;

pub use loader::{CatalogLoader, CatalogSource, HttpCatalogSource};
pub use models::{
    find_all_by_id, find_by_id, Addon, BaseEntry, CatalogItem, CatalogSnapshot, Flight, Hotel,
    Insurance, Resort, Room, Skipass, Transfer, TripDefaults, UserPreferences, UserProfile,
};
