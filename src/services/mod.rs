pub mod categories;
pub mod departments;
pub mod events;
pub mod items;
pub mod reports;
pub mod requests;
pub mod stock_ledger;
pub mod subcategories;
pub mod suppliers;
