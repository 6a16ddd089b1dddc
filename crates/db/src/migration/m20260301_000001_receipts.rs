//! Receipt tables: receipts, items, participants and item assignments.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(RECEIPTS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS receipt_user_items, receipt_users, receipt_items, receipts CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const RECEIPTS_SQL: &str = r"
CREATE TABLE receipts (
    id UUID PRIMARY KEY,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    image_url TEXT,
    ocr_text JSONB,
    currency VARCHAR(8),
    receipt_date DATE,
    title TEXT,
    tax NUMERIC(14,4) CHECK (tax >= 0),
    tip NUMERIC(14,4) CHECK (tip >= 0)
);

CREATE TABLE receipt_items (
    id UUID PRIMARY KEY,
    receipt_id UUID NOT NULL REFERENCES receipts(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    total_price NUMERIC(14,4) NOT NULL CHECK (total_price >= 0),
    price_per_item NUMERIC(14,4) NOT NULL CHECK (price_per_item >= 0)
);

CREATE INDEX idx_receipt_items_receipt ON receipt_items(receipt_id);

-- Participants of a receipt
CREATE TABLE receipt_users (
    id UUID PRIMARY KEY,
    receipt_id UUID NOT NULL REFERENCES receipts(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_receipt_users_receipt ON receipt_users(receipt_id, created_at);

-- Item assignments; created_at orders the split
CREATE TABLE receipt_user_items (
    id UUID PRIMARY KEY,
    receipt_user_id UUID NOT NULL REFERENCES receipt_users(id) ON DELETE CASCADE,
    receipt_item_id UUID NOT NULL REFERENCES receipt_items(id) ON DELETE CASCADE,
    amount_paid NUMERIC(14,4) CHECK (amount_paid >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_receipt_user_items_pair UNIQUE (receipt_user_id, receipt_item_id)
);

CREATE INDEX idx_receipt_user_items_item ON receipt_user_items(receipt_item_id, created_at);
";
