//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no I/O, no engine state.
//! All prices are whole currency units; sums are exact integer additions.

use crate::catalog::{Addon, CatalogItem};
use crate::error::CalculationError;
use crate::selection::{ComponentChange, SelectionState, Slot};

use super::models::{ComponentPrices, PriceBreakdown};

/// Price of a single-slot entry, 0 when nothing is selected
pub fn component_price<T: CatalogItem>(entry: Option<&T>) -> u64 {
    entry.map(|e| e.base_price()).unwrap_or(0)
}

/// Prices for the seven single-valued slots of a selection
pub fn component_prices(selection: &SelectionState) -> ComponentPrices {
    ComponentPrices {
        resort: component_price(selection.resort.as_ref()),
        hotel: component_price(selection.hotel.as_ref()),
        room: component_price(selection.room.as_ref()),
        skipass: component_price(selection.skipass.as_ref()),
        transfer: component_price(selection.transfer.as_ref()),
        flight: component_price(selection.flight.as_ref()),
        insurance: component_price(selection.insurance.as_ref()),
    }
}

/// Full breakdown for a selection given an already computed add-on total
///
/// # Errors
/// `CalculationError::Overflow` if the total does not fit in a `u64`.
pub fn price_breakdown(
    selection: &SelectionState,
    addons_price: u64,
) -> Result<PriceBreakdown, CalculationError> {
    PriceBreakdown::new(component_prices(selection), addons_price)
}

/// Sum the catalog price of every catalog add-on whose id is selected.
///
/// Unknown ids contribute nothing and repeated ids count once, since the
/// catalog list drives the sum.
///
/// # Errors
/// `CalculationError::Overflow` if the sum does not fit in a `u64`.
pub fn addons_total(catalog_addons: &[Addon], selected_ids: &[String]) -> Result<u64, CalculationError> {
    catalog_addons
        .iter()
        .filter(|addon| selected_ids.iter().any(|id| *id == addon.id))
        .try_fold(0u64, |total, addon| {
            total
                .checked_add(addon.base_price())
                .ok_or(CalculationError::Overflow)
        })
}

/// Price change of applying `change` to `selection`.
///
/// Add-on changes report 0; their price is recomputed asynchronously.
/// Differences beyond the `i64` range saturate.
pub fn price_difference(selection: &SelectionState, change: &ComponentChange) -> i64 {
    let slot = change.slot();
    if slot == Slot::Addons {
        return 0;
    }

    let current = selection.entry(slot).map(|e| e.base_price()).unwrap_or(0);
    let next = change.base_price().unwrap_or(0);
    let delta = i128::from(next) - i128::from(current);
    i64::try_from(delta).unwrap_or(if delta < 0 { i64::MIN } else { i64::MAX })
}

/// Display a price, e.g. `€1250`
pub fn format_price(amount: u64) -> String {
    format!("€{}", amount)
}

/// Signed display for differences, e.g. `+€50` / `-€120`
pub fn format_difference(delta: i64) -> String {
    if delta < 0 {
        format!("-€{}", delta.unsigned_abs())
    } else {
        format!("+€{}", delta)
    }
}
