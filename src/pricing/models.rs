//! Price breakdown and engine state types.

use serde::Serialize;
use std::sync::Arc;

use crate::error::CalculationError;
use crate::selection::Slot;

/// Prices of the seven single-valued slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComponentPrices {
    pub resort: u64,
    pub hotel: u64,
    pub room: u64,
    pub skipass: u64,
    pub transfer: u64,
    pub flight: u64,
    pub insurance: u64,
}

impl ComponentPrices {
    /// Price for a single-valued slot; `None` for add-ons
    pub fn get(&self, slot: Slot) -> Option<u64> {
        match slot {
            Slot::Resort => Some(self.resort),
            Slot::Hotel => Some(self.hotel),
            Slot::Room => Some(self.room),
            Slot::Skipass => Some(self.skipass),
            Slot::Transfer => Some(self.transfer),
            Slot::Flight => Some(self.flight),
            Slot::Insurance => Some(self.insurance),
            Slot::Addons => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, u64)> + '_ {
        Slot::SINGLE
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|price| (slot, price)))
    }

    /// Sum of the slot prices; `None` if it does not fit in a `u64`
    pub fn checked_sum(&self) -> Option<u64> {
        self.iter()
            .try_fold(0u64, |total, (_, price)| total.checked_add(price))
    }
}

/// Immutable price summary for one selection.
///
/// Built only through [`PriceBreakdown::new`], which keeps
/// `total == subtotal == sum(components) + addons`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    components: ComponentPrices,
    addons: u64,
    subtotal: u64,
    total: u64,
}

impl PriceBreakdown {
    /// # Errors
    /// `CalculationError::Overflow` if the subtotal does not fit in a `u64`.
    pub fn new(components: ComponentPrices, addons: u64) -> Result<Self, CalculationError> {
        let subtotal = components
            .checked_sum()
            .and_then(|sum| sum.checked_add(addons))
            .ok_or(CalculationError::Overflow)?;
        Ok(Self {
            components,
            addons,
            subtotal,
            // No adjustments layer
            total: subtotal,
        })
    }

    pub fn components(&self) -> &ComponentPrices {
        &self.components
    }

    pub fn addons(&self) -> u64 {
        self.addons
    }

    pub fn subtotal(&self) -> u64 {
        self.subtotal
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceStatus {
    Idle,
    Calculating,
    Error,
}

/// Published state of the price engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceState {
    pub breakdown: Arc<PriceBreakdown>,
    pub calculating: bool,
    /// User-facing message from the last failed recomputation
    pub error: Option<String>,
}

impl PriceState {
    pub fn status(&self) -> PriceStatus {
        if self.calculating {
            PriceStatus::Calculating
        } else if self.error.is_some() {
            PriceStatus::Error
        } else {
            PriceStatus::Idle
        }
    }
}

impl Default for PriceState {
    fn default() -> Self {
        Self {
            breakdown: Arc::new(PriceBreakdown::default()),
            calculating: false,
            error: None,
        }
    }
}

/// Counters for the add-on recomputation pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Schedule requests (each may replace a pending timer)
    pub scheduled: u64,
    /// Timers that fired and started a computation
    pub fired: u64,
    pub committed: u64,
    /// Results (success or failure) dropped by the sequence fence
    pub discarded: u64,
    pub failed: u64,
}
