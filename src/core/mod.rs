pub mod error;
pub mod inventory;
pub mod role;
pub mod sku;
pub mod store;
pub mod transfer;
