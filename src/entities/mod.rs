pub mod category;
pub mod department;
pub mod event;
pub mod item;
pub mod item_request;
pub mod requested_item;
pub mod stock_transaction;
pub mod subcategory;
pub mod supplier;
pub mod user;
