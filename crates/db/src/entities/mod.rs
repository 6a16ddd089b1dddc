//! `SeaORM` entities for the receipt tables.

pub mod prelude;

pub mod receipt_items;
pub mod receipt_user_items;
pub mod receipt_users;
pub mod receipts;
