//! Receipt service: aggregate operations on receipts, participants and
//! assignments.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use splitzies_shared::types::{ItemId, ParticipantId, ReceiptId};
use tracing::{debug, info};

use super::error::ReceiptError;
use super::types::{
    Assignment, Item, NewReceipt, Participant, Receipt, ReceiptDetailsPatch, ReceiptSummary,
};
use super::validation::{validate_non_negative, validate_participant_name};
use crate::split::BillSplitter;

/// Repository trait for receipt persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait ReceiptRepository: Send + Sync {
    /// Insert a receipt and all of its items atomically.
    fn create_receipt(
        &self,
        receipt: NewReceipt,
    ) -> impl Future<Output = Result<(Receipt, Vec<Item>), ReceiptError>> + Send;

    /// Find a receipt by ID.
    fn find_receipt(
        &self,
        id: ReceiptId,
    ) -> impl Future<Output = Result<Option<Receipt>, ReceiptError>> + Send;

    /// Check if a receipt exists.
    fn receipt_exists(&self, id: ReceiptId)
    -> impl Future<Output = Result<bool, ReceiptError>> + Send;

    /// Apply a metadata patch, returning the updated receipt or `None` when absent.
    fn update_receipt(
        &self,
        id: ReceiptId,
        patch: ReceiptDetailsPatch,
    ) -> impl Future<Output = Result<Option<Receipt>, ReceiptError>> + Send;

    /// List a receipt's items ordered by ID.
    fn list_items(
        &self,
        receipt_id: ReceiptId,
    ) -> impl Future<Output = Result<Vec<Item>, ReceiptError>> + Send;

    /// Fetch items by ID. Missing IDs are simply absent from the result.
    fn find_items(
        &self,
        ids: Vec<ItemId>,
    ) -> impl Future<Output = Result<Vec<Item>, ReceiptError>> + Send;

    /// Add a participant to a receipt.
    fn create_participant(
        &self,
        receipt_id: ReceiptId,
        name: String,
    ) -> impl Future<Output = Result<Participant, ReceiptError>> + Send;

    /// Find a participant by ID.
    fn find_participant(
        &self,
        id: ParticipantId,
    ) -> impl Future<Output = Result<Option<Participant>, ReceiptError>> + Send;

    /// List a receipt's participants in creation order.
    fn list_participants(
        &self,
        receipt_id: ReceiptId,
    ) -> impl Future<Output = Result<Vec<Participant>, ReceiptError>> + Send;

    /// Insert or replace the (participant, item) assignments in one transaction.
    ///
    /// An existing pair keeps its ID and creation time; only the custom amount
    /// is replaced.
    fn upsert_assignments(
        &self,
        participant_id: ParticipantId,
        item_ids: Vec<ItemId>,
        custom_amount: Option<Decimal>,
    ) -> impl Future<Output = Result<Vec<Assignment>, ReceiptError>> + Send;

    /// List every assignment on a receipt's items in split order.
    fn list_assignments(
        &self,
        receipt_id: ReceiptId,
    ) -> impl Future<Output = Result<Vec<Assignment>, ReceiptError>> + Send;
}

/// Receipt service for aggregate operations.
///
/// Every check runs before the first write, so a rejected request never
/// leaves partial state behind.
pub struct ReceiptService<R: ReceiptRepository> {
    repo: Arc<R>,
}

impl<R: ReceiptRepository> Clone for ReceiptService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: ReceiptRepository> ReceiptService<R> {
    /// Create a new receipt service.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Persist a receipt and its already validated items.
    ///
    /// # Errors
    ///
    /// Returns a validation error for negative tax or tip, or a repository
    /// error when the insert fails (nothing is persisted in that case).
    pub async fn create_receipt(
        &self,
        input: NewReceipt,
    ) -> Result<(Receipt, Vec<Item>), ReceiptError> {
        validate_non_negative("tax", input.tax)?;
        validate_non_negative("tip", input.tip)?;

        let item_count = input.items.len();
        let (receipt, items) = self.repo.create_receipt(input).await?;
        info!(receipt_id = %receipt.id, item_count, "Receipt created");
        Ok((receipt, items))
    }

    /// Fetch a receipt.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptNotFound` if the receipt does not exist.
    pub async fn get_receipt(&self, receipt_id: ReceiptId) -> Result<Receipt, ReceiptError> {
        self.repo
            .find_receipt(receipt_id)
            .await?
            .ok_or(ReceiptError::ReceiptNotFound(receipt_id))
    }

    /// Add a participant to a receipt. The name is stored verbatim.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name or `ReceiptNotFound`.
    pub async fn add_participant(
        &self,
        receipt_id: ReceiptId,
        name: &str,
    ) -> Result<Participant, ReceiptError> {
        validate_participant_name(name)?;
        self.ensure_receipt(receipt_id).await?;

        let participant = self
            .repo
            .create_participant(receipt_id, name.to_string())
            .await?;
        info!(receipt_id = %receipt_id, participant_id = %participant.id, "Participant added");
        Ok(participant)
    }

    /// Assign one item to a participant, replacing any previous custom amount.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantNotFound`, `ItemNotFound`, `CrossReceipt` when the
    /// two belong to different receipts, or a validation error for a negative
    /// custom amount.
    pub async fn assign(
        &self,
        participant_id: ParticipantId,
        item_id: ItemId,
        custom_amount: Option<Decimal>,
    ) -> Result<Assignment, ReceiptError> {
        validate_non_negative("amount_owed", custom_amount)?;

        let participant = self
            .repo
            .find_participant(participant_id)
            .await?
            .ok_or(ReceiptError::ParticipantNotFound(participant_id))?;
        self.check_items(&participant, &[item_id]).await?;

        self.repo
            .upsert_assignments(participant_id, vec![item_id], custom_amount)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ReceiptError::repository("upsert returned no assignment"))
    }

    /// Assign several items of `receipt_id` to one of its participants.
    ///
    /// Duplicate IDs in `item_ids` are collapsed. Every item is checked before
    /// any write and all upserts commit together.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty list or a negative custom
    /// amount, `ReceiptNotFound`, `ParticipantNotFound` (also when the
    /// participant belongs to another receipt), `ItemNotFound` or
    /// `CrossReceipt`.
    pub async fn assign_items(
        &self,
        receipt_id: ReceiptId,
        participant_id: ParticipantId,
        item_ids: &[ItemId],
        custom_amount: Option<Decimal>,
    ) -> Result<Vec<Assignment>, ReceiptError> {
        if item_ids.is_empty() {
            return Err(ReceiptError::validation(
                "item_ids",
                "at least one item_id is required",
            ));
        }
        validate_non_negative("amount_owed", custom_amount)?;
        self.ensure_receipt(receipt_id).await?;

        let participant = self
            .repo
            .find_participant(participant_id)
            .await?
            .filter(|p| p.receipt_id == receipt_id)
            .ok_or(ReceiptError::ParticipantNotFound(participant_id))?;

        let mut seen = HashSet::new();
        let unique: Vec<ItemId> = item_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        self.check_items(&participant, &unique).await?;

        let assignments = self
            .repo
            .upsert_assignments(participant_id, unique, custom_amount)
            .await?;
        info!(
            receipt_id = %receipt_id,
            participant_id = %participant_id,
            count = assignments.len(),
            "Items assigned"
        );
        Ok(assignments)
    }

    /// Back-fill receipt metadata.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the patch is empty or carries a tax or
    /// tip that is negative or too large to store, or `ReceiptNotFound`.
    pub async fn update_details(
        &self,
        receipt_id: ReceiptId,
        patch: ReceiptDetailsPatch,
    ) -> Result<Receipt, ReceiptError> {
        if patch.is_empty() {
            return Err(ReceiptError::validation(
                "body",
                "at least one of currency, receipt_date, title, tax or tip is required",
            ));
        }
        validate_non_negative("tax", patch.tax)?;
        validate_non_negative("tip", patch.tip)?;

        let receipt = self
            .repo
            .update_receipt(receipt_id, patch)
            .await?
            .ok_or(ReceiptError::ReceiptNotFound(receipt_id))?;
        info!(receipt_id = %receipt_id, "Receipt details updated");
        Ok(receipt)
    }

    /// List a receipt's items.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptNotFound` if the receipt does not exist.
    pub async fn list_items(&self, receipt_id: ReceiptId) -> Result<Vec<Item>, ReceiptError> {
        self.ensure_receipt(receipt_id).await?;
        self.repo.list_items(receipt_id).await
    }

    /// List a receipt's participants in creation order.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptNotFound` if the receipt does not exist.
    pub async fn list_participants(
        &self,
        receipt_id: ReceiptId,
    ) -> Result<Vec<Participant>, ReceiptError> {
        self.ensure_receipt(receipt_id).await?;
        self.repo.list_participants(receipt_id).await
    }

    /// Load a receipt snapshot and compute its split.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptNotFound` if the receipt does not exist.
    pub async fn summary(&self, receipt_id: ReceiptId) -> Result<ReceiptSummary, ReceiptError> {
        let receipt = self.get_receipt(receipt_id).await?;
        let items = self.repo.list_items(receipt_id).await?;
        let participants = self.repo.list_participants(receipt_id).await?;
        let mut assignments = self.repo.list_assignments(receipt_id).await?;
        assignments.sort_by_key(|a| (a.created_at, a.id));

        let split = BillSplitter::compute(&items, &assignments, receipt.currency_code());
        debug!(
            receipt_id = %receipt_id,
            allocations = split.allocations().len(),
            "Split computed"
        );

        Ok(ReceiptSummary {
            receipt,
            participants,
            items,
            assignments,
            split,
        })
    }

    async fn ensure_receipt(&self, receipt_id: ReceiptId) -> Result<(), ReceiptError> {
        if self.repo.receipt_exists(receipt_id).await? {
            Ok(())
        } else {
            Err(ReceiptError::ReceiptNotFound(receipt_id))
        }
    }

    async fn check_items(
        &self,
        participant: &Participant,
        item_ids: &[ItemId],
    ) -> Result<(), ReceiptError> {
        let found = self.repo.find_items(item_ids.to_vec()).await?;
        for id in item_ids {
            let item = found
                .iter()
                .find(|i| i.id == *id)
                .ok_or(ReceiptError::ItemNotFound(*id))?;
            if item.receipt_id != participant.receipt_id {
                return Err(ReceiptError::CrossReceipt {
                    participant_id: participant.id,
                    item_id: *id,
                });
            }
        }
        Ok(())
    }
}
