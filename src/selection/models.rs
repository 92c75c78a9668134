//! Selection state types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::{
    find_all_by_id, find_by_id, Addon, CatalogItem, CatalogSnapshot, Flight, Hotel, Insurance,
    Resort, Room, Skipass, Transfer,
};

/// One of the eight selection categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Resort,
    Hotel,
    Room,
    Skipass,
    Transfer,
    Flight,
    Insurance,
    Addons,
}

impl Slot {
    pub const ALL: [Slot; 8] = [
        Slot::Resort,
        Slot::Hotel,
        Slot::Room,
        Slot::Skipass,
        Slot::Transfer,
        Slot::Flight,
        Slot::Insurance,
        Slot::Addons,
    ];

    /// The seven slots that hold at most one entry
    pub const SINGLE: [Slot; 7] = [
        Slot::Resort,
        Slot::Hotel,
        Slot::Room,
        Slot::Skipass,
        Slot::Transfer,
        Slot::Flight,
        Slot::Insurance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Resort => "resort",
            Slot::Hotel => "hotel",
            Slot::Room => "room",
            Slot::Skipass => "skipass",
            Slot::Transfer => "transfer",
            Slot::Flight => "flight",
            Slot::Insurance => "insurance",
            Slot::Addons => "addons",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Slot::ALL.iter().copied().find(|slot| slot.as_str() == s)
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, Slot::Addons)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current choice for every slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub resort: Option<Resort>,
    pub hotel: Option<Hotel>,
    pub room: Option<Room>,
    pub skipass: Option<Skipass>,
    pub transfer: Option<Transfer>,
    pub flight: Option<Flight>,
    pub insurance: Option<Insurance>,
    /// Ordered, unique by id
    pub addons: Vec<Addon>,
}

impl SelectionState {
    /// Hydrate the catalog's default trip.
    ///
    /// Identifiers missing from the catalog resolve to "not selected".
    pub fn from_catalog_defaults(catalog: &CatalogSnapshot) -> Self {
        let trip = &catalog.trip;
        Self {
            resort: lookup(&catalog.available_resorts, trip.resort.as_deref()),
            hotel: lookup(&catalog.available_hotels, trip.hotel.as_deref()),
            room: lookup(&catalog.available_rooms, trip.room.as_deref()),
            skipass: lookup(&catalog.available_skipasses, trip.skipass.as_deref()),
            transfer: lookup(&catalog.available_transfers, trip.transfer.as_deref()),
            flight: lookup(&catalog.available_flights, trip.flight.as_deref()),
            insurance: lookup(&catalog.available_insurance, trip.insurance.as_deref()),
            addons: find_all_by_id(&catalog.available_addons, &trip.addons),
        }
    }

    /// The entry held by a single-valued slot, as its common view
    pub fn entry(&self, slot: Slot) -> Option<&dyn CatalogItem> {
        match slot {
            Slot::Resort => self.resort.as_ref().map(|e| e as &dyn CatalogItem),
            Slot::Hotel => self.hotel.as_ref().map(|e| e as &dyn CatalogItem),
            Slot::Room => self.room.as_ref().map(|e| e as &dyn CatalogItem),
            Slot::Skipass => self.skipass.as_ref().map(|e| e as &dyn CatalogItem),
            Slot::Transfer => self.transfer.as_ref().map(|e| e as &dyn CatalogItem),
            Slot::Flight => self.flight.as_ref().map(|e| e as &dyn CatalogItem),
            Slot::Insurance => self.insurance.as_ref().map(|e| e as &dyn CatalogItem),
            Slot::Addons => None,
        }
    }

    pub fn is_selected(&self, slot: Slot) -> bool {
        match slot {
            Slot::Addons => !self.addons.is_empty(),
            single => self.entry(single).is_some(),
        }
    }

    pub fn addon_ids(&self) -> Vec<String> {
        self.addons.iter().map(|a| a.id.clone()).collect()
    }

    pub fn has_addon(&self, id: &str) -> bool {
        self.addons.iter().any(|a| a.id == id)
    }

    /// Apply a wholesale slot replacement
    pub(crate) fn apply(&mut self, change: ComponentChange) {
        match change {
            ComponentChange::Resort(v) => self.resort = v,
            ComponentChange::Hotel(v) => self.hotel = v,
            ComponentChange::Room(v) => self.room = v,
            ComponentChange::Skipass(v) => self.skipass = v,
            ComponentChange::Transfer(v) => self.transfer = v,
            ComponentChange::Flight(v) => self.flight = v,
            ComponentChange::Insurance(v) => self.insurance = v,
            ComponentChange::Addons(list) => self.addons = dedup_by_id(list),
        }
    }
}

fn lookup<T: CatalogItem + Clone>(items: &[T], id: Option<&str>) -> Option<T> {
    id.and_then(|id| find_by_id(items, id)).cloned()
}

fn dedup_by_id(list: Vec<Addon>) -> Vec<Addon> {
    let mut unique: Vec<Addon> = Vec::with_capacity(list.len());
    for addon in list {
        if !unique.iter().any(|existing| existing.id == addon.id) {
            unique.push(addon);
        }
    }
    unique
}

/// Replacement value for one slot.
///
/// `None` clears a single-valued slot; `Addons` replaces the whole list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentChange {
    Resort(Option<Resort>),
    Hotel(Option<Hotel>),
    Room(Option<Room>),
    Skipass(Option<Skipass>),
    Transfer(Option<Transfer>),
    Flight(Option<Flight>),
    Insurance(Option<Insurance>),
    Addons(Vec<Addon>),
}

impl ComponentChange {
    pub fn slot(&self) -> Slot {
        match self {
            ComponentChange::Resort(_) => Slot::Resort,
            ComponentChange::Hotel(_) => Slot::Hotel,
            ComponentChange::Room(_) => Slot::Room,
            ComponentChange::Skipass(_) => Slot::Skipass,
            ComponentChange::Transfer(_) => Slot::Transfer,
            ComponentChange::Flight(_) => Slot::Flight,
            ComponentChange::Insurance(_) => Slot::Insurance,
            ComponentChange::Addons(_) => Slot::Addons,
        }
    }

    /// Base price of the new value for single-valued slots
    pub fn base_price(&self) -> Option<u64> {
        match self {
            ComponentChange::Resort(v) => v.as_ref().map(|e| e.base_price()),
            ComponentChange::Hotel(v) => v.as_ref().map(|e| e.base_price()),
            ComponentChange::Room(v) => v.as_ref().map(|e| e.base_price()),
            ComponentChange::Skipass(v) => v.as_ref().map(|e| e.base_price()),
            ComponentChange::Transfer(v) => v.as_ref().map(|e| e.base_price()),
            ComponentChange::Flight(v) => v.as_ref().map(|e| e.base_price()),
            ComponentChange::Insurance(v) => v.as_ref().map(|e| e.base_price()),
            ComponentChange::Addons(_) => None,
        }
    }
}
