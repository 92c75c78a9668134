//! Pricing engine module.
//!
//! Derives a live, consistent price breakdown from the current trip selection.
//! Slot prices update synchronously; the add-on total is recomputed through a
//! debounced, sequence-fenced asynchronous pipeline.

pub mod calculators;
pub mod engine;
pub mod models;
pub mod services;

// Re-export commonly used items
pub use calculators::{format_price, price_breakdown, price_difference};
pub use engine::{PriceEngine, CALCULATION_ERROR_MESSAGE, PRICE_OVERFLOW_MESSAGE};
pub use models::{ComponentPrices, EngineStats, PriceBreakdown, PriceState, PriceStatus};
pub use services::{AddonPricer, CatalogAddonPricer};
