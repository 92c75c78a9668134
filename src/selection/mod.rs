//! Trip selection: slot types and the synchronous selection store.

pub mod models;
pub mod store;

pub use models::{ComponentChange, SelectionState, Slot};
pub use store::SelectionStore;
