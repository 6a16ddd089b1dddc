//! Receipt, participant and assignment routes.
//!
//! Monetary fields are rendered as strings with the receipt currency's
//! minor-unit digits (`"3.34"`, `"1500"` for JPY).

use axum::{
    Json, Router,
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::StatusCode,
    routing::{get, post},
};
use bytes::Bytes;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use splitzies_core::currency::Amount;
use splitzies_core::ingestion::parse_receipt_date;
use splitzies_core::receipt::{
    Item, NewReceipt, Participant, Receipt, ReceiptDetailsPatch, ReceiptError, ReceiptSummary,
    validate_item,
};
use splitzies_shared::AppError;
use splitzies_shared::types::{AssignmentId, CurrencyCode, ItemId, ParticipantId, ReceiptId};
use tracing::{info, warn};

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Creates the receipt routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/receipts", post(create_receipt))
        .route("/receipts/image", post(upload_receipt_image))
        .route(
            "/receipts/{receipt_id}",
            get(get_receipt).patch(update_receipt),
        )
        .route("/receipts/{receipt_id}/items", get(list_items))
        .route(
            "/receipts/{receipt_id}/users",
            post(add_user).get(list_users),
        )
        .route(
            "/receipts/{receipt_id}/users/{user_id}/items",
            post(assign_items),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A manually entered line item.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    /// Item name.
    #[serde(default)]
    pub name: String,
    /// Quantity, defaults to 1.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Total price for all units.
    pub total_price: Option<Decimal>,
    /// Price of one unit.
    pub price_per_item: Option<Decimal>,
}

fn default_quantity() -> i64 {
    1
}

/// Request body for `POST /receipts`.
#[derive(Debug, Deserialize)]
pub struct CreateReceiptRequest {
    /// Line items; every one must be valid.
    #[serde(default)]
    pub items: Vec<ItemRequest>,
    /// ISO 4217 currency code.
    pub currency: Option<String>,
    /// Receipt date.
    pub receipt_date: Option<String>,
    /// Title or merchant name.
    pub title: Option<String>,
    /// Tax amount.
    pub tax: Option<Decimal>,
    /// Tip amount.
    pub tip: Option<Decimal>,
}

/// Request body for `PATCH /receipts/{receipt_id}`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateReceiptRequest {
    /// New currency code.
    pub currency: Option<String>,
    /// New receipt date.
    pub receipt_date: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New tax amount.
    pub tax: Option<Decimal>,
    /// New tip amount.
    pub tip: Option<Decimal>,
}

/// Request body for `POST /receipts/{receipt_id}/users`.
#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Request body for `POST /receipts/{receipt_id}/users/{user_id}/items`.
#[derive(Debug, Deserialize)]
pub struct AssignItemsRequest {
    /// Items to assign.
    #[serde(default)]
    pub item_ids: Vec<String>,
    /// Custom owed amount recorded on every assignment.
    pub amount_owed: Option<Decimal>,
}

/// A persisted line item.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    /// Item ID.
    pub id: ItemId,
    /// Item name.
    pub name: String,
    /// Quantity.
    pub quantity: i32,
    /// Total price.
    pub total_price: Amount,
    /// Unit price.
    pub price_per_item: Amount,
}

impl ItemResponse {
    fn new(item: &Item, currency: Option<&CurrencyCode>) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            quantity: item.quantity,
            total_price: Amount::new(item.total_price, currency.cloned()),
            price_per_item: Amount::new(item.price_per_item, currency.cloned()),
        }
    }
}

/// Response for `POST /receipts`.
#[derive(Debug, Serialize)]
pub struct CreateReceiptResponse {
    /// Human readable confirmation.
    pub message: String,
    /// New receipt ID.
    pub receipt_id: ReceiptId,
    /// Saved items.
    pub items: Vec<ItemResponse>,
}

/// Response for `POST /receipts/image`.
#[derive(Debug, Serialize)]
pub struct UploadReceiptResponse {
    /// Human readable confirmation.
    pub message: String,
    /// New receipt ID.
    pub receipt_id: ReceiptId,
    /// Public URL of the stored image.
    pub image_url: String,
    /// Items recovered from the image, possibly none.
    pub items: Vec<ItemResponse>,
    /// Raw OCR text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    /// Currency read from the receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    /// Tax read from the receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Amount>,
    /// Tip read from the receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<Amount>,
    /// Ingestion stages that fell back to less data.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<String>,
}

/// A participant, with their total when a split was computed.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Participant ID.
    pub id: ParticipantId,
    /// Owning receipt.
    pub receipt_id: ReceiptId,
    /// Display name.
    pub name: String,
    /// Amount owed across all items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_total: Option<Amount>,
}

impl UserResponse {
    fn new(participant: &Participant, user_total: Option<Amount>) -> Self {
        Self {
            id: participant.id,
            receipt_id: participant.receipt_id,
            name: participant.name.clone(),
            user_total,
        }
    }
}

/// Response for `POST /receipts/{receipt_id}/users`.
#[derive(Debug, Serialize)]
pub struct AddUserResponse {
    /// Human readable confirmation.
    pub message: String,
    /// The new participant.
    pub user: UserResponse,
}

/// Response for `GET /receipts/{receipt_id}/users`.
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    /// Participants in creation order.
    pub users: Vec<UserResponse>,
}

/// Response for `GET /receipts/{receipt_id}/items`.
#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    /// Items in ID order.
    pub items: Vec<ItemResponse>,
}

/// One assignment with its computed share.
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    /// Assignment ID.
    pub id: AssignmentId,
    /// Participant.
    pub user_id: ParticipantId,
    /// Item.
    pub item_id: ItemId,
    /// Share of the item owed by the participant.
    pub amount_owed: Amount,
}

/// Response for `GET /receipts/{receipt_id}`.
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    /// Receipt ID.
    pub receipt_id: ReceiptId,
    /// Currency code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    /// Receipt date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_date: Option<NaiveDate>,
    /// Title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Tax amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Amount>,
    /// Tip amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<Amount>,
    /// Public URL of the source image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Participants with their totals.
    pub users: Vec<UserResponse>,
    /// Items.
    pub items: Vec<ItemResponse>,
    /// Assignments in split order with their shares.
    pub assignments: Vec<AssignmentResponse>,
}

impl From<&ReceiptSummary> for ReceiptResponse {
    fn from(summary: &ReceiptSummary) -> Self {
        let receipt = &summary.receipt;
        let currency = receipt.currency.as_ref();
        let money = |value: Decimal| Amount::new(value, currency.cloned());

        Self {
            receipt_id: receipt.id,
            currency: receipt.currency.clone(),
            receipt_date: receipt.receipt_date,
            title: receipt.title.clone(),
            tax: receipt.tax.map(money),
            tip: receipt.tip.map(money),
            image_url: receipt.image_url.clone(),
            users: user_totals(summary),
            items: summary
                .items
                .iter()
                .map(|item| ItemResponse::new(item, currency))
                .collect(),
            assignments: summary
                .assignments
                .iter()
                .map(|a| AssignmentResponse {
                    id: a.id,
                    user_id: a.participant_id,
                    item_id: a.item_id,
                    amount_owed: money(
                        summary
                            .split
                            .amount_for_assignment(a.id)
                            .unwrap_or_default(),
                    ),
                })
                .collect(),
        }
    }
}

/// An assignment as stored.
#[derive(Debug, Serialize)]
pub struct AssignedItemResponse {
    /// Assignment ID.
    pub id: AssignmentId,
    /// Participant.
    pub receipt_user_id: ParticipantId,
    /// Item.
    pub receipt_item_id: ItemId,
    /// Custom owed amount, when one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_owed: Option<Amount>,
}

/// Response for `POST /receipts/{receipt_id}/users/{user_id}/items`.
#[derive(Debug, Serialize)]
pub struct AssignItemsResponse {
    /// Human readable confirmation.
    pub message: String,
    /// Created or updated assignments.
    pub items: Vec<AssignedItemResponse>,
}

/// Response for `PATCH /receipts/{receipt_id}`.
#[derive(Debug, Serialize)]
pub struct ReceiptDetailsResponse {
    /// Human readable confirmation.
    pub message: String,
    /// Receipt ID.
    pub receipt_id: ReceiptId,
    /// Currency code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    /// Receipt date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_date: Option<NaiveDate>,
    /// Title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Tax amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Amount>,
    /// Tip amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<Amount>,
}

impl From<Receipt> for ReceiptDetailsResponse {
    fn from(receipt: Receipt) -> Self {
        let currency = receipt.currency;
        let money = |value: Decimal| Amount::new(value, currency.clone());
        Self {
            message: format!("Receipt {} updated", receipt.id),
            receipt_id: receipt.id,
            receipt_date: receipt.receipt_date,
            title: receipt.title,
            tax: receipt.tax.map(money),
            tip: receipt.tip.map(money),
            currency,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/receipts`
/// Create a receipt from manually entered items.
async fn create_receipt(
    State(state): State<AppState>,
    payload: Result<Json<CreateReceiptRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateReceiptResponse>)> {
    let Json(payload) = payload?;
    let new_receipt = payload.into_new_receipt()?;

    let (receipt, items) = state.receipts().create_receipt(new_receipt).await?;
    let currency = receipt.currency.as_ref();

    Ok((
        StatusCode::CREATED,
        Json(CreateReceiptResponse {
            message: format!("Receipt created with ID: {}", receipt.id),
            receipt_id: receipt.id,
            items: items
                .iter()
                .map(|item| ItemResponse::new(item, currency))
                .collect(),
        }),
    ))
}

/// POST `/receipts/image`
/// Upload a receipt photo (multipart field `image`) and extract its items.
async fn upload_receipt_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<UploadReceiptResponse>)> {
    let Some(ingestion) = state.ingestion.clone() else {
        return Err(AppError::ServiceUnavailable(
            "image storage is not configured".to_string(),
        )
        .into());
    };
    let (data, content_type) = read_image_field(multipart?).await?;

    let ingested = ingestion.ingest_image(data, &content_type).await?;
    let degraded: Vec<String> = ingested.degraded.iter().map(ToString::to_string).collect();
    if !degraded.is_empty() {
        warn!(receipt_id = %ingested.receipt_id(), ?degraded, "Receipt ingested with degraded data");
    }

    let receipt_id = ingested.receipt_id();
    let (receipt, items) = match state.receipts().create_receipt(ingested.receipt).await {
        Ok(created) => created,
        Err(e) => {
            ingestion.discard(receipt_id, &content_type).await;
            return Err(e.into());
        }
    };
    let currency = receipt.currency.as_ref();
    let money = |value: Decimal| Amount::new(value, currency.cloned());
    info!(receipt_id = %receipt.id, items = items.len(), "Receipt image ingested");

    Ok((
        StatusCode::CREATED,
        Json(UploadReceiptResponse {
            message: format!("Receipt image uploaded successfully with ID: {}", receipt.id),
            receipt_id: receipt.id,
            image_url: receipt.image_url.clone().unwrap_or_default(),
            items: items
                .iter()
                .map(|item| ItemResponse::new(item, currency))
                .collect(),
            ocr_text: receipt.ocr_text.clone(),
            currency: receipt.currency.clone(),
            tax: receipt.tax.map(money),
            tip: receipt.tip.map(money),
            degraded,
        }),
    ))
}

/// GET `/receipts/{receipt_id}`
/// The receipt with every participant's share.
async fn get_receipt(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> ApiResult<Json<ReceiptResponse>> {
    let receipt_id = parse_id::<ReceiptId>(&receipt_id, "receipt_id")?;
    let summary = state.receipts().summary(receipt_id).await?;
    Ok(Json(ReceiptResponse::from(&summary)))
}

/// PATCH `/receipts/{receipt_id}`
/// Back-fill currency, date, title, tax or tip.
async fn update_receipt(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
    payload: Result<Json<UpdateReceiptRequest>, JsonRejection>,
) -> ApiResult<Json<ReceiptDetailsResponse>> {
    let receipt_id = parse_id::<ReceiptId>(&receipt_id, "receipt_id")?;
    let Json(payload) = payload?;
    let patch = payload.into_patch()?;

    let receipt = state.receipts().update_details(receipt_id, patch).await?;
    Ok(Json(receipt.into()))
}

/// GET `/receipts/{receipt_id}/items`
async fn list_items(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> ApiResult<Json<ItemsResponse>> {
    let receipt_id = parse_id::<ReceiptId>(&receipt_id, "receipt_id")?;
    let service = state.receipts();
    let receipt = service.get_receipt(receipt_id).await?;
    let items = service.list_items(receipt_id).await?;

    Ok(Json(ItemsResponse {
        items: items
            .iter()
            .map(|item| ItemResponse::new(item, receipt.currency.as_ref()))
            .collect(),
    }))
}

/// POST `/receipts/{receipt_id}/users`
async fn add_user(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
    payload: Result<Json<AddUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AddUserResponse>)> {
    let receipt_id = parse_id::<ReceiptId>(&receipt_id, "receipt_id")?;
    let Json(payload) = payload?;

    let participant = state
        .receipts()
        .add_participant(receipt_id, &payload.name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AddUserResponse {
            message: format!("User added to receipt {receipt_id}"),
            user: UserResponse::new(&participant, None),
        }),
    ))
}

/// GET `/receipts/{receipt_id}/users`
async fn list_users(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> ApiResult<Json<UsersResponse>> {
    let receipt_id = parse_id::<ReceiptId>(&receipt_id, "receipt_id")?;
    let summary = state.receipts().summary(receipt_id).await?;
    Ok(Json(UsersResponse {
        users: user_totals(&summary),
    }))
}

/// POST `/receipts/{receipt_id}/users/{user_id}/items`
/// Assign items to a participant. Repeating an assignment updates it.
async fn assign_items(
    State(state): State<AppState>,
    Path((receipt_id, user_id)): Path<(String, String)>,
    payload: Result<Json<AssignItemsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AssignItemsResponse>)> {
    let receipt_id = parse_id::<ReceiptId>(&receipt_id, "receipt_id")?;
    let user_id = parse_id::<ParticipantId>(&user_id, "user_id")?;
    let Json(payload) = payload?;
    let item_ids = payload
        .item_ids
        .iter()
        .map(|raw| parse_id::<ItemId>(raw, "item_ids"))
        .collect::<ApiResult<Vec<_>>>()?;

    let service = state.receipts();
    let assignments = service
        .assign_items(receipt_id, user_id, &item_ids, payload.amount_owed)
        .await?;
    let receipt = service.get_receipt(receipt_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AssignItemsResponse {
            message: format!("{} item(s) assigned to user {user_id}", assignments.len()),
            items: assignments
                .into_iter()
                .map(|a| AssignedItemResponse {
                    id: a.id,
                    receipt_user_id: a.participant_id,
                    receipt_item_id: a.item_id,
                    amount_owed: a
                        .custom_amount
                        .map(|v| Amount::new(v, receipt.currency.clone())),
                })
                .collect(),
        }),
    ))
}

// ============================================================================
// Helper Functions
// ============================================================================

impl CreateReceiptRequest {
    fn into_new_receipt(self) -> ApiResult<NewReceipt> {
        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                validate_item(
                    &item.name,
                    item.quantity,
                    item.total_price,
                    item.price_per_item,
                )
                .map_err(|e| item_error(idx, e))
            })
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(NewReceipt {
            currency: optional_currency(self.currency.as_deref())?,
            receipt_date: optional_date(self.receipt_date.as_deref())?,
            title: self
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            tax: self.tax,
            tip: self.tip,
            items,
            ..NewReceipt::default()
        })
    }
}

impl UpdateReceiptRequest {
    fn into_patch(self) -> ApiResult<ReceiptDetailsPatch> {
        let title = match self.title {
            Some(title) if title.trim().is_empty() => {
                return Err(ApiError::invalid_field("title", "title must not be blank"));
            }
            title => title.map(|t| t.trim().to_string()),
        };

        Ok(ReceiptDetailsPatch {
            currency: optional_currency(self.currency.as_deref())?,
            receipt_date: optional_date(self.receipt_date.as_deref())?,
            title,
            tax: self.tax,
            tip: self.tip,
        })
    }
}

async fn read_image_field(mut multipart: Multipart) -> ApiResult<(Bytes, String)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(ApiError::invalid_field("image", "image file is empty"));
        }
        return Ok((data, content_type));
    }
    Err(ApiError::invalid_field(
        "image",
        "multipart field 'image' is required",
    ))
}

fn parse_id<T: std::str::FromStr>(raw: &str, field: &str) -> ApiResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::invalid_field(field, format!("'{raw}' is not a valid ID")))
}

fn optional_currency(raw: Option<&str>) -> ApiResult<Option<CurrencyCode>> {
    match raw {
        None => Ok(None),
        Some(raw) => match CurrencyCode::parse(raw) {
            None => Err(ApiError::invalid_field("currency", "currency must not be blank")),
            Some(code) if !code.is_well_formed() => Err(ApiError::invalid_field(
                "currency",
                format!("'{}' is not a three-letter currency code", raw.trim()),
            )),
            Some(code) => Ok(Some(code)),
        },
    }
}

fn optional_date(raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match raw {
        None => Ok(None),
        Some(raw) => parse_receipt_date(raw).map(Some).ok_or_else(|| {
            ApiError::invalid_field("receipt_date", format!("'{raw}' is not a valid date"))
        }),
    }
}

fn item_error(idx: usize, err: ReceiptError) -> ApiError {
    match err {
        ReceiptError::Validation { field, message } => {
            ApiError::invalid_field(format!("items[{idx}].{field}"), message)
        }
        other => other.into(),
    }
}

fn user_totals(summary: &ReceiptSummary) -> Vec<UserResponse> {
    let currency = summary.receipt.currency.as_ref();
    summary
        .participants
        .iter()
        .map(|p| {
            let total = Amount::new(summary.split.total_for(p.id), currency.cloned());
            UserResponse::new(p, Some(total))
        })
        .collect()
}
