//! `SeaORM` Entity for receipt_user_items table (item assignments).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_user_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub receipt_user_id: Uuid,
    pub receipt_item_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((14, 4)))", nullable)]
    pub amount_paid: Option<Decimal>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::receipt_users::Entity",
        from = "Column::ReceiptUserId",
        to = "super::receipt_users::Column::Id",
        on_delete = "Cascade"
    )]
    ReceiptUsers,
    #[sea_orm(
        belongs_to = "super::receipt_items::Entity",
        from = "Column::ReceiptItemId",
        to = "super::receipt_items::Column::Id",
        on_delete = "Cascade"
    )]
    ReceiptItems,
}

impl Related<super::receipt_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptUsers.def()
    }
}

impl Related<super::receipt_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
