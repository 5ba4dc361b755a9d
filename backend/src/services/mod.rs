//! Business logic services for the BizTally platform

pub mod access;
pub mod auth;
pub mod currency;
pub mod customers;
pub mod cycles;
pub mod expenses;
pub mod inventory;
pub mod products;
pub mod projects;
pub mod sales;

pub use access::AccessService;
pub use auth::AuthService;
pub use currency::CurrencyService;
pub use customers::CustomerService;
pub use cycles::CycleService;
pub use expenses::ExpenseService;
pub use inventory::InventoryService;
pub use products::ProductService;
pub use projects::ProjectService;
pub use sales::SalesService;
