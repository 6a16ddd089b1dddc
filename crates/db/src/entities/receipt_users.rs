//! `SeaORM` Entity for receipt_users table (receipt participants).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub receipt_id: Uuid,
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::receipts::Entity",
        from = "Column::ReceiptId",
        to = "super::receipts::Column::Id",
        on_delete = "Cascade"
    )]
    Receipts,
    #[sea_orm(has_many = "super::receipt_user_items::Entity")]
    ReceiptUserItems,
}

impl Related<super::receipts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl Related<super::receipt_user_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptUserItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
