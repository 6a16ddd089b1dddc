//! Service tests against an in-memory repository.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use splitzies_shared::types::{AssignmentId, CurrencyCode, ItemId, ParticipantId, ReceiptId};

use super::error::ReceiptError;
use super::service::{ReceiptRepository, ReceiptService};
use super::types::{
    Assignment, Item, ItemDraft, NewReceipt, Participant, Receipt, ReceiptDetailsPatch,
};
use super::validation::validate_item;

#[derive(Default)]
struct State {
    receipts: Vec<Receipt>,
    items: Vec<Item>,
    participants: Vec<Participant>,
    assignments: Vec<Assignment>,
}

#[derive(Default)]
struct InMemoryRepo {
    state: Mutex<State>,
}

impl InMemoryRepo {
    fn assignment_count(&self) -> usize {
        self.state.lock().unwrap().assignments.len()
    }

    fn receipt_count(&self) -> usize {
        self.state.lock().unwrap().receipts.len()
    }
}

impl ReceiptRepository for InMemoryRepo {
    async fn create_receipt(
        &self,
        receipt: NewReceipt,
    ) -> Result<(Receipt, Vec<Item>), ReceiptError> {
        let mut state = self.state.lock().unwrap();
        let saved = Receipt {
            id: receipt.id,
            created_at: Utc::now(),
            image_url: receipt.image_url,
            ocr_text: receipt.ocr_text,
            currency: receipt.currency,
            receipt_date: receipt.receipt_date,
            title: receipt.title,
            tax: receipt.tax,
            tip: receipt.tip,
        };
        let items: Vec<Item> = receipt
            .items
            .into_iter()
            .map(|d| Item {
                id: ItemId::new(),
                receipt_id: saved.id,
                name: d.name,
                quantity: d.quantity,
                total_price: d.total_price,
                price_per_item: d.price_per_item,
            })
            .collect();
        state.receipts.push(saved.clone());
        state.items.extend(items.iter().cloned());
        Ok((saved, items))
    }

    async fn find_receipt(&self, id: ReceiptId) -> Result<Option<Receipt>, ReceiptError> {
        let state = self.state.lock().unwrap();
        Ok(state.receipts.iter().find(|r| r.id == id).cloned())
    }

    async fn receipt_exists(&self, id: ReceiptId) -> Result<bool, ReceiptError> {
        let state = self.state.lock().unwrap();
        Ok(state.receipts.iter().any(|r| r.id == id))
    }

    async fn update_receipt(
        &self,
        id: ReceiptId,
        patch: ReceiptDetailsPatch,
    ) -> Result<Option<Receipt>, ReceiptError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.receipts.iter_mut().find(|r| r.id == id).map(|r| {
            patch.apply_to(r);
            r.clone()
        }))
    }

    async fn list_items(&self, receipt_id: ReceiptId) -> Result<Vec<Item>, ReceiptError> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<Item> = state
            .items
            .iter()
            .filter(|i| i.receipt_id == receipt_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    async fn find_items(&self, ids: Vec<ItemId>) -> Result<Vec<Item>, ReceiptError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .items
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect())
    }

    async fn create_participant(
        &self,
        receipt_id: ReceiptId,
        name: String,
    ) -> Result<Participant, ReceiptError> {
        let mut state = self.state.lock().unwrap();
        let participant = Participant {
            id: ParticipantId::new(),
            receipt_id,
            name,
            created_at: Utc::now(),
        };
        state.participants.push(participant.clone());
        Ok(participant)
    }

    async fn find_participant(
        &self,
        id: ParticipantId,
    ) -> Result<Option<Participant>, ReceiptError> {
        let state = self.state.lock().unwrap();
        Ok(state.participants.iter().find(|p| p.id == id).cloned())
    }

    async fn list_participants(
        &self,
        receipt_id: ReceiptId,
    ) -> Result<Vec<Participant>, ReceiptError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .participants
            .iter()
            .filter(|p| p.receipt_id == receipt_id)
            .cloned()
            .collect())
    }

    async fn upsert_assignments(
        &self,
        participant_id: ParticipantId,
        item_ids: Vec<ItemId>,
        custom_amount: Option<Decimal>,
    ) -> Result<Vec<Assignment>, ReceiptError> {
        let mut state = self.state.lock().unwrap();
        let mut out = Vec::with_capacity(item_ids.len());
        for item_id in item_ids {
            if let Some(existing) = state
                .assignments
                .iter_mut()
                .find(|a| a.participant_id == participant_id && a.item_id == item_id)
            {
                existing.custom_amount = custom_amount;
                out.push(existing.clone());
            } else {
                let created = Assignment {
                    id: AssignmentId::new(),
                    participant_id,
                    item_id,
                    custom_amount,
                    created_at: Utc::now(),
                };
                state.assignments.push(created.clone());
                out.push(created);
            }
        }
        Ok(out)
    }

    async fn list_assignments(
        &self,
        receipt_id: ReceiptId,
    ) -> Result<Vec<Assignment>, ReceiptError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .assignments
            .iter()
            .filter(|a| {
                state
                    .items
                    .iter()
                    .any(|i| i.id == a.item_id && i.receipt_id == receipt_id)
            })
            .cloned()
            .collect())
    }
}

fn service() -> (ReceiptService<InMemoryRepo>, Arc<InMemoryRepo>) {
    let repo = Arc::new(InMemoryRepo::default());
    (ReceiptService::new(Arc::clone(&repo)), repo)
}

fn draft(name: &str, total: Decimal) -> ItemDraft {
    validate_item(name, 1, Some(total), None).unwrap()
}

async fn receipt_with(
    svc: &ReceiptService<InMemoryRepo>,
    items: Vec<ItemDraft>,
) -> (Receipt, Vec<Item>) {
    svc.create_receipt(NewReceipt {
        items,
        ..NewReceipt::default()
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_pizza_end_to_end() {
    let (svc, _) = service();
    let (receipt, items) = receipt_with(&svc, vec![draft("Pizza", dec!(10.00))]).await;
    let pizza = items[0].id;

    let mut people = Vec::new();
    for name in ["Ann", "Ben", "Cat"] {
        let p = svc.add_participant(receipt.id, name).await.unwrap();
        svc.assign_items(receipt.id, p.id, &[pizza], None)
            .await
            .unwrap();
        people.push(p.id);
    }

    let summary = svc.summary(receipt.id).await.unwrap();
    let shares: Vec<Decimal> = people
        .iter()
        .map(|p| summary.split.amount_for(*p, pizza).unwrap())
        .collect();
    assert_eq!(shares, vec![dec!(3.34), dec!(3.33), dec!(3.33)]);
    assert_eq!(shares.iter().sum::<Decimal>(), dec!(10.00));
    assert_eq!(summary.assignments.len(), 3);
    assert_eq!(summary.participants.len(), 3);
}

#[tokio::test]
async fn test_reassignment_replaces_custom_amount() {
    let (svc, repo) = service();
    let (receipt, items) = receipt_with(&svc, vec![draft("Wine", dec!(30))]).await;
    let p = svc.add_participant(receipt.id, "Dee").await.unwrap();

    let first = svc
        .assign(p.id, items[0].id, Some(dec!(5)))
        .await
        .unwrap();
    let second = svc
        .assign(p.id, items[0].id, Some(dec!(7)))
        .await
        .unwrap();

    assert_eq!(repo.assignment_count(), 1);
    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.custom_amount, Some(dec!(7)));
}

#[tokio::test]
async fn test_cross_receipt_assignment_is_rejected() {
    let (svc, repo) = service();
    let (receipt_a, _) = receipt_with(&svc, vec![draft("Tea", dec!(3))]).await;
    let (receipt_b, items_b) = receipt_with(&svc, vec![draft("Cake", dec!(6))]).await;
    let p = svc.add_participant(receipt_a.id, "Eve").await.unwrap();

    let err = svc.assign(p.id, items_b[0].id, None).await.unwrap_err();
    assert!(matches!(err, ReceiptError::CrossReceipt { .. }));

    let err = svc
        .assign_items(receipt_b.id, p.id, &[items_b[0].id], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReceiptError::ParticipantNotFound(_)));
    assert_eq!(repo.assignment_count(), 0);
}

#[tokio::test]
async fn test_assign_items_checks_everything_before_writing() {
    let (svc, repo) = service();
    let (receipt, items) = receipt_with(&svc, vec![draft("Tea", dec!(3))]).await;
    let p = svc.add_participant(receipt.id, "Fay").await.unwrap();
    let missing = ItemId::new();

    let err = svc
        .assign_items(receipt.id, p.id, &[items[0].id, missing], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReceiptError::ItemNotFound(id) if id == missing));
    assert_eq!(repo.assignment_count(), 0);
}

#[tokio::test]
async fn test_assign_items_collapses_duplicates() {
    let (svc, repo) = service();
    let (receipt, items) = receipt_with(&svc, vec![draft("Tea", dec!(3))]).await;
    let p = svc.add_participant(receipt.id, "Gus").await.unwrap();

    let out = svc
        .assign_items(receipt.id, p.id, &[items[0].id, items[0].id], None)
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(repo.assignment_count(), 1);
}

#[tokio::test]
async fn test_assign_items_validation() {
    let (svc, _) = service();
    let (receipt, items) = receipt_with(&svc, vec![draft("Tea", dec!(3))]).await;
    let p = svc.add_participant(receipt.id, "Hal").await.unwrap();

    let err = svc
        .assign_items(receipt.id, p.id, &[], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReceiptError::Validation { ref field, .. } if field == "item_ids"));

    let err = svc
        .assign_items(receipt.id, p.id, &[items[0].id], Some(dec!(-1)))
        .await
        .unwrap_err();
    assert!(matches!(err, ReceiptError::Validation { ref field, .. } if field == "amount_owed"));
}

#[tokio::test]
async fn test_assign_unknown_participant_or_item() {
    let (svc, _) = service();
    let (receipt, items) = receipt_with(&svc, vec![draft("Tea", dec!(3))]).await;
    let p = svc.add_participant(receipt.id, "Ivy").await.unwrap();

    let err = svc
        .assign(ParticipantId::new(), items[0].id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReceiptError::ParticipantNotFound(_)));

    let err = svc.assign(p.id, ItemId::new(), None).await.unwrap_err();
    assert!(matches!(err, ReceiptError::ItemNotFound(_)));
}

#[tokio::test]
async fn test_add_participant() {
    let (svc, _) = service();
    let (receipt, _) = receipt_with(&svc, vec![]).await;

    let p = svc.add_participant(receipt.id, " Jo ").await.unwrap();
    assert_eq!(p.name, " Jo ");
    let dup = svc.add_participant(receipt.id, " Jo ").await.unwrap();
    assert_ne!(p.id, dup.id);

    let err = svc.add_participant(receipt.id, "").await.unwrap_err();
    assert!(matches!(err, ReceiptError::Validation { .. }));

    let err = svc
        .add_participant(ReceiptId::new(), "Kim")
        .await
        .unwrap_err();
    assert!(matches!(err, ReceiptError::ReceiptNotFound(_)));
}

#[tokio::test]
async fn test_update_details() {
    let (svc, _) = service();
    let (receipt, _) = receipt_with(&svc, vec![]).await;

    let updated = svc
        .update_details(
            receipt.id,
            ReceiptDetailsPatch {
                tax: Some(dec!(1.50)),
                currency: CurrencyCode::parse("eur"),
                ..ReceiptDetailsPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.tax, Some(dec!(1.50)));
    assert_eq!(updated.currency_code(), Some("EUR"));
    assert_eq!(updated.tip, None);

    let updated = svc
        .update_details(
            receipt.id,
            ReceiptDetailsPatch {
                tip: Some(dec!(5)),
                ..ReceiptDetailsPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.tax, Some(dec!(1.50)));
    assert_eq!(updated.tip, Some(dec!(5)));
}

#[tokio::test]
async fn test_update_details_rejections() {
    let (svc, _) = service();
    let (receipt, _) = receipt_with(&svc, vec![]).await;

    let err = svc
        .update_details(receipt.id, ReceiptDetailsPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReceiptError::Validation { .. }));

    let err = svc
        .update_details(
            receipt.id,
            ReceiptDetailsPatch {
                tax: Some(dec!(-2)),
                ..ReceiptDetailsPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ReceiptError::Validation { ref field, .. } if field == "tax"));

    let err = svc
        .update_details(
            ReceiptId::new(),
            ReceiptDetailsPatch {
                tip: Some(dec!(1)),
                ..ReceiptDetailsPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ReceiptError::ReceiptNotFound(_)));
}

#[tokio::test]
async fn test_create_receipt_rejects_negative_tip_without_writing() {
    let (svc, repo) = service();
    let err = svc
        .create_receipt(NewReceipt {
            tip: Some(dec!(-1)),
            ..NewReceipt::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ReceiptError::Validation { .. }));
    assert_eq!(repo.receipt_count(), 0);
}

#[tokio::test]
async fn test_listings_require_receipt() {
    let (svc, _) = service();
    let missing = ReceiptId::new();
    assert!(matches!(
        svc.list_items(missing).await.unwrap_err(),
        ReceiptError::ReceiptNotFound(_)
    ));
    assert!(matches!(
        svc.list_participants(missing).await.unwrap_err(),
        ReceiptError::ReceiptNotFound(_)
    ));
    assert!(matches!(
        svc.summary(missing).await.unwrap_err(),
        ReceiptError::ReceiptNotFound(_)
    ));
}

#[tokio::test]
async fn test_summary_uses_receipt_currency() {
    let (svc, _) = service();
    let (receipt, items) = svc
        .create_receipt(NewReceipt {
            currency: CurrencyCode::parse("JPY"),
            items: vec![draft("Ramen", dec!(1000))],
            ..NewReceipt::default()
        })
        .await
        .unwrap();
    let a = svc.add_participant(receipt.id, "A").await.unwrap();
    let b = svc.add_participant(receipt.id, "B").await.unwrap();
    let c = svc.add_participant(receipt.id, "C").await.unwrap();
    for p in [&a, &b, &c] {
        svc.assign_items(receipt.id, p.id, &[items[0].id], None)
            .await
            .unwrap();
    }

    let summary = svc.summary(receipt.id).await.unwrap();
    assert_eq!(summary.split.total_for(a.id), dec!(334));
    assert_eq!(summary.split.total_for(b.id), dec!(333));
    assert_eq!(summary.split.total_for(c.id), dec!(333));
}
