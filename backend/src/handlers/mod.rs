//! HTTP handlers for the BizTally API

pub mod auth;
pub mod customers;
pub mod cycles;
pub mod expenses;
pub mod health;
pub mod inventory;
pub mod products;
pub mod projects;
pub mod sales;

pub use auth::*;
pub use customers::*;
pub use cycles::*;
pub use expenses::*;
pub use health::*;
pub use inventory::*;
pub use products::*;
pub use projects::*;
pub use sales::*;
