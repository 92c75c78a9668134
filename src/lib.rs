//! Selection and live pricing engine for ski trip packages.
//!
//! - **Catalog**: YAML trip catalog, fetched once and cached
//! - **Selection**: the current choice per slot, with synchronous notifications
//! - **Pricing**: price breakdown with debounced, sequence-fenced add-on pricing
//! - **Session**: the facade presentation code drives
//!
//! # Example
//!
//! ```rust,ignore
//! use trip_pricing::{Config, TripSession};
//!
//! let session = TripSession::new(&Config::from_env())?;
//! let catalog = session.load_catalog().await?;
//! session.toggle_addon(catalog.available_addons[0].clone(), true);
//! println!("Total: {}", trip_pricing::pricing::format_price(session.breakdown().total()));
//! session.dispose();
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod listeners;
pub mod pricing;
pub mod selection;
pub mod session;

pub use config::Config;
pub use error::{CalculationError, CatalogError, Result, TripError};
pub use listeners::SubscriptionId;
pub use session::{LoadStatus, TripSession};
