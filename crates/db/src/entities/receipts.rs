//! `SeaORM` Entity for receipts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub image_url: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub ocr_text: Option<Json>,
    pub currency: Option<String>,
    pub receipt_date: Option<Date>,
    pub title: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((14, 4)))", nullable)]
    pub tax: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((14, 4)))", nullable)]
    pub tip: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::receipt_items::Entity")]
    ReceiptItems,
    #[sea_orm(has_many = "super::receipt_users::Entity")]
    ReceiptUsers,
}

impl Related<super::receipt_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptItems.def()
    }
}

impl Related<super::receipt_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
