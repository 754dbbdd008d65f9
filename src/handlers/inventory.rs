use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::inventory_service::{InventoryService, VariantStockInput};
use crate::application::BulkOutcome;
use crate::domain::inventory::{InventoryRecord, StockCounts, StockPatch, VariantKey};
use crate::errors::AppError;
use crate::infrastructure::pg_store::PgStore;

pub type Inventory = InventoryService<PgStore>;

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Counts of a new record; only `availableQuantity` is required.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockCountsRequest {
    pub available_quantity: i32,
    pub reserved_quantity: Option<i32>,
    pub minimum_threshold: Option<i32>,
    pub maximum_capacity: Option<i32>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

impl From<StockCountsRequest> for StockCounts {
    fn from(r: StockCountsRequest) -> Self {
        let defaults = StockCounts::default();
        StockCounts {
            available_quantity: r.available_quantity,
            reserved_quantity: r.reserved_quantity.unwrap_or(defaults.reserved_quantity),
            minimum_threshold: r.minimum_threshold.unwrap_or(defaults.minimum_threshold),
            maximum_capacity: r.maximum_capacity,
            is_active: r.is_active.unwrap_or(defaults.is_active),
            notes: r.notes,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryRequest {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    #[serde(flatten)]
    pub counts: StockCountsRequest,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariantStockRequest {
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    #[serde(flatten)]
    pub counts: StockCountsRequest,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkInventoryRequest {
    pub variants: Vec<VariantStockRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariantKeyRequest {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
}

impl VariantKeyRequest {
    fn key(&self) -> VariantKey {
        VariantKey::new(self.product_id, self.color_id, self.size_id)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    /// Positive restocks, negative sells.
    pub quantity_change: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryRequest {
    pub available_quantity: Option<i32>,
    pub reserved_quantity: Option<i32>,
    pub minimum_threshold: Option<i32>,
    pub maximum_capacity: Option<i32>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

impl From<UpdateInventoryRequest> for StockPatch {
    fn from(r: UpdateInventoryRequest) -> Self {
        StockPatch {
            available_quantity: r.available_quantity,
            reserved_quantity: r.reserved_quantity,
            minimum_threshold: r.minimum_threshold,
            maximum_capacity: r.maximum_capacity,
            is_active: r.is_active,
            notes: r.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    pub id: i32,
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub available_quantity: i32,
    pub reserved_quantity: i32,
    pub total_quantity: i32,
    pub minimum_threshold: i32,
    pub maximum_capacity: Option<i32>,
    pub is_active: bool,
    pub is_low_stock: bool,
    pub is_out_of_stock: bool,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<InventoryRecord> for InventoryResponse {
    fn from(r: InventoryRecord) -> Self {
        Self {
            id: r.id,
            product_id: r.key.product_id,
            color_id: r.key.color_id,
            size_id: r.key.size_id,
            available_quantity: r.available_quantity,
            reserved_quantity: r.reserved_quantity,
            total_quantity: r.total_quantity(),
            minimum_threshold: r.minimum_threshold,
            maximum_capacity: r.maximum_capacity,
            is_active: r.is_active,
            is_low_stock: r.is_low_stock(),
            is_out_of_stock: r.is_out_of_stock(),
            notes: r.notes,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectedVariant {
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkInventoryFailure {
    pub variant: RejectedVariant,
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkInventoryResponse {
    pub created: usize,
    pub errors_count: usize,
    pub items: Vec<InventoryResponse>,
    pub errors: Vec<BulkInventoryFailure>,
}

impl From<BulkOutcome<InventoryRecord, VariantStockInput>> for BulkInventoryResponse {
    fn from(outcome: BulkOutcome<InventoryRecord, VariantStockInput>) -> Self {
        Self {
            created: outcome.created.len(),
            errors_count: outcome.errors.len(),
            items: outcome.created.into_iter().map(Into::into).collect(),
            errors: outcome
                .errors
                .into_iter()
                .map(|f| BulkInventoryFailure {
                    variant: RejectedVariant {
                        color_id: f.input.color_id,
                        size_id: f.input.size_id,
                    },
                    error: f.error.to_string(),
                })
                .collect(),
        }
    }
}

fn to_responses(records: Vec<InventoryRecord>) -> Vec<InventoryResponse> {
    records.into_iter().map(InventoryResponse::from).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /inventory
#[utoipa::path(
    post,
    path = "/inventory",
    request_body = CreateInventoryRequest,
    responses(
        (status = 201, description = "Record created", body = InventoryResponse),
        (status = 400, description = "Invalid counts"),
        (status = 404, description = "Unknown product, color or size"),
        (status = 409, description = "Variant already has a record"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inventory"
)]
pub async fn create_stock(
    service: web::Data<Inventory>,
    body: web::Json<CreateInventoryRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let key = VariantKey::new(req.product_id, req.color_id, req.size_id);
    let counts = StockCounts::from(req.counts);
    let record = web::block(move || service.create_variant_stock(key, counts)).await??;
    Ok(HttpResponse::Created().json(InventoryResponse::from(record)))
}

/// POST /inventory/product/{productId}/bulk
#[utoipa::path(
    post,
    path = "/inventory/product/{productId}/bulk",
    params(
        ("productId" = i32, Path, description = "Product id"),
    ),
    request_body = BulkInventoryRequest,
    responses(
        (status = 201, description = "Import finished", body = BulkInventoryResponse),
        (status = 404, description = "Unknown product"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inventory"
)]
pub async fn bulk_create_stock(
    service: web::Data<Inventory>,
    path: web::Path<i32>,
    body: web::Json<BulkInventoryRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let variants: Vec<VariantStockInput> = body
        .into_inner()
        .variants
        .into_iter()
        .map(|v| VariantStockInput {
            color_id: v.color_id,
            size_id: v.size_id,
            counts: v.counts.into(),
        })
        .collect();
    let outcome =
        web::block(move || service.bulk_create_variant_stock(product_id, variants)).await??;
    Ok(HttpResponse::Created().json(BulkInventoryResponse::from(outcome)))
}

/// GET /inventory/product/{productId}
#[utoipa::path(
    get,
    path = "/inventory/product/{productId}",
    params(
        ("productId" = i32, Path, description = "Product id"),
    ),
    responses(
        (status = 200, description = "Active records by color then size", body = [InventoryResponse]),
        (status = 404, description = "Unknown product"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inventory"
)]
pub async fn list_for_product(
    service: web::Data<Inventory>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let records = web::block(move || service.list_variant_stock(product_id)).await??;
    Ok(HttpResponse::Ok().json(to_responses(records)))
}

/// POST /inventory/check
///
/// Exact variant lookup; an omitted color or size only matches a record
/// without one.
#[utoipa::path(
    post,
    path = "/inventory/check",
    request_body = VariantKeyRequest,
    responses(
        (status = 200, description = "Record found", body = InventoryResponse),
        (status = 404, description = "No record for the variant"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inventory"
)]
pub async fn check_stock(
    service: web::Data<Inventory>,
    body: web::Json<VariantKeyRequest>,
) -> Result<HttpResponse, AppError> {
    let key = body.into_inner().key();
    let record = web::block(move || service.get_variant_stock(key)).await??;
    Ok(HttpResponse::Ok().json(InventoryResponse::from(record)))
}

/// PATCH /inventory/adjust
#[utoipa::path(
    patch,
    path = "/inventory/adjust",
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = InventoryResponse),
        (status = 404, description = "No record for the variant"),
        (status = 409, description = "Adjustment would go below zero"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inventory"
)]
pub async fn adjust_stock(
    service: web::Data<Inventory>,
    body: web::Json<AdjustStockRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let key = VariantKey::new(req.product_id, req.color_id, req.size_id);
    let record =
        web::block(move || service.adjust_stock(key, req.quantity_change, req.reason)).await??;
    Ok(HttpResponse::Ok().json(InventoryResponse::from(record)))
}

/// GET /inventory/low-stock?threshold=
#[utoipa::path(
    get,
    path = "/inventory/low-stock",
    params(
        ("threshold" = Option<i32>, Query, description = "Include records at or below this quantity"),
    ),
    responses(
        (status = 200, description = "Low records, emptiest first", body = [InventoryResponse]),
        (status = 400, description = "Negative threshold"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inventory"
)]
pub async fn low_stock(
    service: web::Data<Inventory>,
    query: web::Query<LowStockQuery>,
) -> Result<HttpResponse, AppError> {
    let threshold = query.into_inner().threshold;
    let records = web::block(move || service.list_low_stock(threshold)).await??;
    Ok(HttpResponse::Ok().json(to_responses(records)))
}

/// GET /inventory/out-of-stock
#[utoipa::path(
    get,
    path = "/inventory/out-of-stock",
    responses(
        (status = 200, description = "Active records with nothing available", body = [InventoryResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inventory"
)]
pub async fn out_of_stock(service: web::Data<Inventory>) -> Result<HttpResponse, AppError> {
    let records = web::block(move || service.list_out_of_stock()).await??;
    Ok(HttpResponse::Ok().json(to_responses(records)))
}

/// GET /inventory/{id}
#[utoipa::path(
    get,
    path = "/inventory/{id}",
    params(
        ("id" = i32, Path, description = "Inventory record id"),
    ),
    responses(
        (status = 200, description = "Record found", body = InventoryResponse),
        (status = 404, description = "Record not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inventory"
)]
pub async fn get_stock(
    service: web::Data<Inventory>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let record = web::block(move || service.get_stock_by_id(id)).await??;
    Ok(HttpResponse::Ok().json(InventoryResponse::from(record)))
}

/// PATCH /inventory/{id}
#[utoipa::path(
    patch,
    path = "/inventory/{id}",
    params(
        ("id" = i32, Path, description = "Inventory record id"),
    ),
    request_body = UpdateInventoryRequest,
    responses(
        (status = 200, description = "Record updated", body = InventoryResponse),
        (status = 400, description = "Invalid counts"),
        (status = 404, description = "Record not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inventory"
)]
pub async fn update_stock(
    service: web::Data<Inventory>,
    path: web::Path<i32>,
    body: web::Json<UpdateInventoryRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let patch = StockPatch::from(body.into_inner());
    let record = web::block(move || service.update_variant_stock(id, patch)).await??;
    Ok(HttpResponse::Ok().json(InventoryResponse::from(record)))
}

/// DELETE /inventory/{id}
#[utoipa::path(
    delete,
    path = "/inventory/{id}",
    params(
        ("id" = i32, Path, description = "Inventory record id"),
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Record not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inventory"
)]
pub async fn delete_stock(
    service: web::Data<Inventory>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || service.delete_variant_stock(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn create_request_flattens_counts_and_fills_defaults() {
        let req: CreateInventoryRequest = serde_json::from_str(
            r#"{"productId": 4, "colorId": 1, "availableQuantity": 12, "maximumCapacity": 50}"#,
        )
        .expect("valid");
        assert_eq!(req.color_id, Some(1));
        assert_eq!(req.size_id, None);

        let counts = StockCounts::from(req.counts);
        assert_eq!(counts.available_quantity, 12);
        assert_eq!(counts.reserved_quantity, 0);
        assert_eq!(counts.maximum_capacity, Some(50));
        assert!(counts.is_active);
    }

    #[test]
    fn response_carries_derived_fields() {
        let now = Utc::now();
        let response = InventoryResponse::from(InventoryRecord {
            id: 9,
            key: VariantKey::new(4, None, Some(2)),
            available_quantity: 0,
            reserved_quantity: 3,
            minimum_threshold: 2,
            maximum_capacity: None,
            is_active: true,
            notes: None,
            created_at: now,
            updated_at: now,
        });
        assert_eq!(response.total_quantity, 3);
        assert!(response.is_low_stock);
        assert!(response.is_out_of_stock);

        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["sizeId"], 2);
        assert!(json["colorId"].is_null());
    }
}
