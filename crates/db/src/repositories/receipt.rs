//! Receipt repository for database operations.
//!
//! Implements the receipt aggregate persistence using SeaORM. Multi-row
//! writes run in a single database transaction.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde_json::{Value, json};
use splitzies_core::receipt::{
    Assignment, Item, NewReceipt, Participant, Receipt, ReceiptDetailsPatch, ReceiptError,
    ReceiptRepository as ReceiptRepoTrait,
};
use splitzies_shared::types::{AssignmentId, CurrencyCode, ItemId, ParticipantId, ReceiptId};
use tracing::debug;

use crate::entities::{receipt_items, receipt_user_items, receipt_users, receipts};

/// Receipt repository implementation.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    db: DatabaseConnection,
}

impl ReceiptRepository {
    /// Create a new receipt repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl ReceiptRepoTrait for ReceiptRepository {
    async fn create_receipt(
        &self,
        receipt: NewReceipt,
    ) -> Result<(Receipt, Vec<Item>), ReceiptError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now().into();

        let receipt_model = receipts::ActiveModel {
            id: Set(receipt.id.into_inner()),
            created_at: Set(now),
            image_url: Set(receipt.image_url),
            ocr_text: Set(receipt.ocr_text.map(|text| json!({ "text": text }))),
            currency: Set(receipt.currency.map(|c| c.as_str().to_string())),
            receipt_date: Set(receipt.receipt_date),
            title: Set(receipt.title),
            tax: Set(receipt.tax),
            tip: Set(receipt.tip),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let mut items = Vec::with_capacity(receipt.items.len());
        for draft in receipt.items {
            let item = receipt_items::ActiveModel {
                id: Set(ItemId::new().into_inner()),
                receipt_id: Set(receipt_model.id),
                name: Set(draft.name),
                quantity: Set(draft.quantity),
                total_price: Set(draft.total_price),
                price_per_item: Set(draft.price_per_item),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
            items.push(to_item(item));
        }

        txn.commit().await.map_err(db_err)?;
        debug!(receipt_id = %receipt_model.id, items = items.len(), "Receipt rows inserted");

        Ok((to_receipt(receipt_model), items))
    }

    async fn find_receipt(&self, id: ReceiptId) -> Result<Option<Receipt>, ReceiptError> {
        let model = receipts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(to_receipt))
    }

    async fn receipt_exists(&self, id: ReceiptId) -> Result<bool, ReceiptError> {
        let count: u64 = receipts::Entity::find_by_id(id.into_inner())
            .count(&self.db)
            .await
            .map_err(db_err)?;

        Ok(count > 0)
    }

    async fn update_receipt(
        &self,
        id: ReceiptId,
        patch: ReceiptDetailsPatch,
    ) -> Result<Option<Receipt>, ReceiptError> {
        let Some(model) = receipts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let mut active: receipts::ActiveModel = model.into();
        if let Some(currency) = patch.currency {
            active.currency = Set(Some(currency.as_str().to_string()));
        }
        if let Some(date) = patch.receipt_date {
            active.receipt_date = Set(Some(date));
        }
        if let Some(title) = patch.title {
            active.title = Set(Some(title));
        }
        if let Some(tax) = patch.tax {
            active.tax = Set(Some(tax));
        }
        if let Some(tip) = patch.tip {
            active.tip = Set(Some(tip));
        }

        let updated = active.update(&self.db).await.map_err(db_err)?;
        Ok(Some(to_receipt(updated)))
    }

    async fn list_items(&self, receipt_id: ReceiptId) -> Result<Vec<Item>, ReceiptError> {
        let models = receipt_items::Entity::find()
            .filter(receipt_items::Column::ReceiptId.eq(receipt_id.into_inner()))
            .order_by_asc(receipt_items::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(to_item).collect())
    }

    async fn find_items(&self, ids: Vec<ItemId>) -> Result<Vec<Item>, ReceiptError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = receipt_items::Entity::find()
            .filter(receipt_items::Column::Id.is_in(ids.into_iter().map(ItemId::into_inner)))
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(to_item).collect())
    }

    async fn create_participant(
        &self,
        receipt_id: ReceiptId,
        name: String,
    ) -> Result<Participant, ReceiptError> {
        let model = receipt_users::ActiveModel {
            id: Set(ParticipantId::new().into_inner()),
            receipt_id: Set(receipt_id.into_inner()),
            name: Set(name),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        Ok(to_participant(model))
    }

    async fn find_participant(
        &self,
        id: ParticipantId,
    ) -> Result<Option<Participant>, ReceiptError> {
        let model = receipt_users::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(to_participant))
    }

    async fn list_participants(
        &self,
        receipt_id: ReceiptId,
    ) -> Result<Vec<Participant>, ReceiptError> {
        let models = receipt_users::Entity::find()
            .filter(receipt_users::Column::ReceiptId.eq(receipt_id.into_inner()))
            .order_by_asc(receipt_users::Column::CreatedAt)
            .order_by_asc(receipt_users::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(to_participant).collect())
    }

    async fn upsert_assignments(
        &self,
        participant_id: ParticipantId,
        item_ids: Vec<ItemId>,
        custom_amount: Option<Decimal>,
    ) -> Result<Vec<Assignment>, ReceiptError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now().into();

        // Existing pairs keep id and created_at; only amount_paid changes.
        let on_conflict = OnConflict::columns([
            receipt_user_items::Column::ReceiptUserId,
            receipt_user_items::Column::ReceiptItemId,
        ])
        .update_column(receipt_user_items::Column::AmountPaid)
        .to_owned();

        let mut assignments = Vec::with_capacity(item_ids.len());
        for item_id in item_ids {
            let row = receipt_user_items::ActiveModel {
                id: Set(AssignmentId::new().into_inner()),
                receipt_user_id: Set(participant_id.into_inner()),
                receipt_item_id: Set(item_id.into_inner()),
                amount_paid: Set(custom_amount),
                created_at: Set(now),
            };
            let model = receipt_user_items::Entity::insert(row)
                .on_conflict(on_conflict.clone())
                .exec_with_returning(&txn)
                .await
                .map_err(db_err)?;
            assignments.push(to_assignment(model));
        }

        txn.commit().await.map_err(db_err)?;
        Ok(assignments)
    }

    async fn list_assignments(
        &self,
        receipt_id: ReceiptId,
    ) -> Result<Vec<Assignment>, ReceiptError> {
        let models = receipt_user_items::Entity::find()
            .join(
                JoinType::InnerJoin,
                receipt_user_items::Relation::ReceiptItems.def(),
            )
            .filter(receipt_items::Column::ReceiptId.eq(receipt_id.into_inner()))
            .order_by_asc(receipt_user_items::Column::CreatedAt)
            .order_by_asc(receipt_user_items::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(to_assignment).collect())
    }
}

fn db_err(err: DbErr) -> ReceiptError {
    ReceiptError::repository(err.to_string())
}

fn utc(ts: DateTime<FixedOffset>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

/// Reads the `{"text": …}` column shape; a bare JSON string is accepted too.
fn ocr_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text),
        Value::Object(mut map) => match map.remove("text") {
            Some(Value::String(text)) => Some(text),
            _ => None,
        },
        _ => None,
    }
}

fn to_receipt(model: receipts::Model) -> Receipt {
    Receipt {
        id: ReceiptId::from_uuid(model.id),
        created_at: utc(model.created_at),
        image_url: model.image_url,
        ocr_text: ocr_text(model.ocr_text),
        currency: model.currency.as_deref().and_then(CurrencyCode::parse),
        receipt_date: model.receipt_date,
        title: model.title,
        tax: model.tax,
        tip: model.tip,
    }
}

fn to_item(model: receipt_items::Model) -> Item {
    Item {
        id: ItemId::from_uuid(model.id),
        receipt_id: ReceiptId::from_uuid(model.receipt_id),
        name: model.name,
        quantity: model.quantity,
        total_price: model.total_price,
        price_per_item: model.price_per_item,
    }
}

fn to_participant(model: receipt_users::Model) -> Participant {
    Participant {
        id: ParticipantId::from_uuid(model.id),
        receipt_id: ReceiptId::from_uuid(model.receipt_id),
        name: model.name,
        created_at: utc(model.created_at),
    }
}

fn to_assignment(model: receipt_user_items::Model) -> Assignment {
    Assignment {
        id: AssignmentId::from_uuid(model.id),
        participant_id: ParticipantId::from_uuid(model.receipt_user_id),
        item_id: ItemId::from_uuid(model.receipt_item_id),
        custom_amount: model.amount_paid,
        created_at: utc(model.created_at),
    }
}
