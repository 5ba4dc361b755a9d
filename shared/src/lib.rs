//! Shared types and domain logic for the BizTally platform
//!
//! This crate contains the models, payload coercion rules, and the pure
//! sale-inventory reconciliation planning shared between the backend and
//! any other components of the system.

pub mod coerce;
pub mod currency;
pub mod models;
pub mod reconcile;

pub use coerce::*;
pub use models::*;
pub use reconcile::*;
