//! Catalog entry types.
//!
//! These mirror the YAML catalog document and deserialize directly with serde.
//! Every entry kind embeds [`BaseEntry`] and exposes it through [`CatalogItem`].

use serde::{Deserialize, Serialize};

/// Fields shared by every catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Common view over all catalog entry kinds
pub trait CatalogItem {
    fn base(&self) -> &BaseEntry;

    fn id(&self) -> &str {
        &self.base().id
    }

    fn base_price(&self) -> u64 {
        self.base().base_price
    }
}

impl CatalogItem for BaseEntry {
    fn base(&self) -> &BaseEntry {
        self
    }
}

macro_rules! impl_catalog_item {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl CatalogItem for $ty {
                fn base(&self) -> &BaseEntry {
                    &self.base
                }
            }
        )+
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resort {
    #[serde(flatten)]
    pub base: BaseEntry,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub vibe: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotel {
    #[serde(flatten)]
    pub base: BaseEntry,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    #[serde(flatten)]
    pub base: BaseEntry,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub occupancy: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skipass {
    #[serde(flatten)]
    pub base: BaseEntry,
    #[serde(default)]
    pub days: u32,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    #[serde(flatten)]
    pub base: BaseEntry,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    #[serde(flatten)]
    pub base: BaseEntry,
    #[serde(default)]
    pub airline: String,
    #[serde(default, rename = "class")]
    pub cabin_class: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insurance {
    #[serde(flatten)]
    pub base: BaseEntry,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub coverage: Vec<String>,
}

/// Add-ons carry only the base fields
pub type Addon = BaseEntry;

impl_catalog_item!(Resort, Hotel, Room, Skipass, Transfer, Flight, Insurance);

/// Default selection shipped with the catalog (identifiers only)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripDefaults {
    pub id: String,
    pub name: String,
    pub resort: Option<String>,
    pub hotel: Option<String>,
    pub room: Option<String>,
    pub skipass: Option<String>,
    pub transfer: Option<String>,
    pub flight: Option<String>,
    pub insurance: Option<String>,
    pub addons: Vec<String>,
}

/// Free-form preference hints used by presentation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub vibe: Option<String>,
    pub budget: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub preferences: UserPreferences,
}

/// Immutable catalog document. Missing lists parse as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub trip: TripDefaults,
    pub available_resorts: Vec<Resort>,
    pub available_hotels: Vec<Hotel>,
    pub available_rooms: Vec<Room>,
    pub available_skipasses: Vec<Skipass>,
    pub available_transfers: Vec<Transfer>,
    pub available_flights: Vec<Flight>,
    pub available_insurance: Vec<Insurance>,
    pub available_addons: Vec<Addon>,
    pub user: UserProfile,
}

impl CatalogSnapshot {
    /// Parse a YAML catalog document
    pub fn from_yaml_str(input: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(input)
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.user.preferences
    }
}

/// Find an entry by identifier.
///
/// Returns `None` for unknown identifiers; callers treat that as "not selected".
pub fn find_by_id<'a, T: CatalogItem>(items: &'a [T], id: &str) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

/// Resolve a list of identifiers, silently dropping unknown ones.
///
/// Order follows `ids`; a repeated identifier resolves once.
pub fn find_all_by_id<T: CatalogItem + Clone>(items: &[T], ids: &[String]) -> Vec<T> {
    let mut resolved: Vec<T> = Vec::with_capacity(ids.len());
    for id in ids {
        if resolved.iter().any(|item| item.id() == id) {
            continue;
        }
        if let Some(item) = find_by_id(items, id) {
            resolved.push(item.clone());
        }
    }
    resolved
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub const SAMPLE_YAML: &str = r#"
trip:
  id: trip-1
  name: Alpine Week
  resort: R1
  hotel: H1
  room: missing-room
  addons: [A1, ghost]
availableResorts:
  - id: R1
    name: Zermatt
    description: Matterhorn views
    basePrice: 500
    image: zermatt.jpg
    region: Valais
    difficulty: advanced
    vibe: luxury
availableHotels:
  - id: H1
    name: Chalet Alpina
    description: Cosy chalet
    basePrice: 300
    type: chalet
  - id: H2
    name: Grand Hotel
    description: Five stars
    basePrice: 900
    type: hotel
availableRooms:
  - id: RM1
    name: Double
    description: Two guests
    basePrice: 120
    type: double
    occupancy: 2
    amenities: [balcony, sauna]
availableAddons:
  - id: A1
    name: Ski school
    description: Three lessons
    basePrice: 50
  - id: A2
    name: Spa pass
    description: Unlimited spa
    basePrice: 30
user:
  preferences:
    vibe: luxury
    budget: high
"#;

    pub fn base(id: &str, price: u64) -> BaseEntry {
        BaseEntry {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            base_price: price,
            image: None,
        }
    }

    pub fn resort(id: &str, price: u64) -> Resort {
        Resort {
            base: base(id, price),
            region: String::new(),
            difficulty: String::new(),
            vibe: String::new(),
        }
    }

    pub fn hotel(id: &str, price: u64) -> Hotel {
        Hotel {
            base: base(id, price),
            kind: String::new(),
        }
    }

    pub fn flight(id: &str, price: u64) -> Flight {
        Flight {
            base: base(id, price),
            airline: String::new(),
            cabin_class: String::new(),
            date: String::new(),
            time: String::new(),
        }
    }

    pub fn addon(id: &str, price: u64) -> Addon {
        base(id, price)
    }

    pub fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::from_yaml_str(SAMPLE_YAML).expect("sample catalog parses")
    }
}
