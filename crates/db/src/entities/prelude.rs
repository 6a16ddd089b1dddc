//! Entity re-exports.

pub use super::receipt_items::Entity as ReceiptItems;
pub use super::receipt_user_items::Entity as ReceiptUserItems;
pub use super::receipt_users::Entity as ReceiptUsers;
pub use super::receipts::Entity as Receipts;
