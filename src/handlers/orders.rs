use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::checkout::{CheckoutLine, CheckoutRequest, CheckoutService};
use crate::application::order_service::{ItemQuantityUpdate, OrderService, ShippingUpdate};
use crate::domain::inventory::VariantKey;
use crate::domain::order::{
    Order, OrderAggregate, OrderEvent, OrderItem, OrderStatus, ShippingDetails, ShippingPatch,
    ShippingRecord, UserRef,
};
use crate::domain::ports::BuyerIdentity;
use crate::errors::AppError;
use crate::infrastructure::pg_store::PgStore;

use super::{parse_money, parse_money_opt};

pub type Checkout = CheckoutService<PgStore>;
pub type Orders = OrderService<PgStore>;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItemRequest {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub quantity: i32,
    /// Unit price shown to the buyer, as a decimal string, e.g. "50.00"
    pub price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRequest {
    pub full_name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub delivery_area: Option<String>,
}

impl From<ShippingRequest> for ShippingDetails {
    fn from(r: ShippingRequest) -> Self {
        ShippingDetails {
            full_name: r.full_name,
            address1: r.address1,
            address2: r.address2,
            city: r.city,
            state: r.state,
            postal_code: r.postal_code,
            country: r.country,
            phone: r.phone,
            email: r.email,
            delivery_area: r.delivery_area,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub items: Vec<CheckoutItemRequest>,
    pub shipping: ShippingRequest,
    pub delivery_charge: Option<String>,
    /// Total shown to the buyer; rejected when it disagrees with the server total.
    pub total: Option<String>,
}

impl CheckoutBody {
    fn into_request(self) -> Result<CheckoutRequest, AppError> {
        let items = self
            .items
            .into_iter()
            .map(|i| {
                Ok(CheckoutLine {
                    key: VariantKey::new(i.product_id, i.color_id, i.size_id),
                    quantity: i.quantity,
                    price: parse_money("price", &i.price)?,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;
        Ok(CheckoutRequest {
            buyer: BuyerIdentity {
                name: self.name,
                phone: self.phone,
                email: self.email,
            },
            items,
            shipping: self.shipping.into(),
            delivery_charge: parse_money_opt("deliveryCharge", self.delivery_charge.as_deref())?,
            total: parse_money_opt("total", self.total.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShippingRequest {
    pub full_name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub delivery_area: Option<String>,
    pub delivery_charge: Option<String>,
}

impl UpdateShippingRequest {
    fn into_patch(self) -> Result<ShippingPatch, AppError> {
        Ok(ShippingPatch {
            delivery_charge: parse_money_opt("deliveryCharge", self.delivery_charge.as_deref())?,
            full_name: self.full_name,
            address1: self.address1,
            address2: self.address2,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
            phone: self.phone,
            email: self.email,
            delivery_area: self.delivery_area,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionalUserQuery {
    pub user_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub quantity: i32,
    pub price: String,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(i: OrderItem) -> Self {
        Self {
            id: i.id,
            product_id: i.key.product_id,
            color_id: i.key.color_id,
            size_id: i.key.size_id,
            quantity: i.quantity,
            price: i.price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingResponse {
    pub id: i32,
    pub order_id: i32,
    pub full_name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub delivery_area: Option<String>,
    pub delivery_charge: String,
}

impl From<ShippingRecord> for ShippingResponse {
    fn from(s: ShippingRecord) -> Self {
        let d = s.details;
        Self {
            id: s.id,
            order_id: s.order_id,
            full_name: d.full_name,
            address1: d.address1,
            address2: d.address2,
            city: d.city,
            state: d.state,
            postal_code: d.postal_code,
            country: d.country,
            phone: d.phone,
            email: d.email,
            delivery_area: d.delivery_area,
            delivery_charge: s.delivery_charge.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<UserRef> for UserResponse {
    fn from(u: UserRef) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
        }
    }
}

/// Order row without its children.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderHeaderResponse {
    pub id: i32,
    pub order_code: String,
    pub user_id: i32,
    pub status: OrderStatus,
    pub total: String,
    pub delivery_charge: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderHeaderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            order_code: o.order_code,
            user_id: o.user_id,
            status: o.status,
            total: o.total.to_string(),
            delivery_charge: o.delivery_charge.to_string(),
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: OrderHeaderResponse,
    pub items: Vec<OrderItemResponse>,
    pub shipping: Option<ShippingResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

impl From<OrderAggregate> for OrderResponse {
    fn from(a: OrderAggregate) -> Self {
        Self {
            order: a.order.into(),
            items: a.items.into_iter().map(Into::into).collect(),
            shipping: a.shipping.map(Into::into),
            user: a.user.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShippingUpdateResponse {
    pub shipping: ShippingResponse,
    pub order: OrderHeaderResponse,
}

impl From<ShippingUpdate> for ShippingUpdateResponse {
    fn from(u: ShippingUpdate) -> Self {
        Self {
            shipping: u.shipping.into(),
            order: u.order.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemQuantityResponse {
    pub item: OrderItemResponse,
    pub order: OrderHeaderResponse,
}

impl From<ItemQuantityUpdate> for ItemQuantityResponse {
    fn from(u: ItemQuantityUpdate) -> Self {
        Self {
            item: u.item.into(),
            order: u.order.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderEventResponse {
    pub id: Uuid,
    pub order_id: i32,
    pub order_code: String,
    pub event_type: String,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    pub created_at: String,
}

impl From<OrderEvent> for OrderEventResponse {
    fn from(e: OrderEvent) -> Self {
        Self {
            id: e.id,
            order_id: e.order_id,
            order_code: e.order_code,
            event_type: e.event_type,
            payload: e.payload,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

fn to_responses(orders: Vec<OrderAggregate>) -> Vec<OrderResponse> {
    orders.into_iter().map(OrderResponse::from).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders/checkout
///
/// Places an order. Stock for every line is validated and decremented, the
/// order, items, shipping record and `OrderPlaced` outbox event are written
/// in one transaction, or nothing is written at all.
#[utoipa::path(
    post,
    path = "/orders/checkout",
    request_body = CheckoutBody,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Invalid request or price mismatch"),
        (status = 404, description = "Unknown product"),
        (status = 409, description = "Insufficient stock"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn checkout(
    service: web::Data<Checkout>,
    body: web::Json<CheckoutBody>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner().into_request()?;
    let order = web::block(move || service.checkout(request)).await??;
    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders/my?userId=
#[utoipa::path(
    get,
    path = "/orders/my",
    params(
        ("userId" = i32, Query, description = "Buyer id"),
    ),
    responses(
        (status = 200, description = "Orders of the buyer, newest first", body = [OrderResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn orders_by_user(
    service: web::Data<Orders>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = query.into_inner().user_id;
    let orders = web::block(move || service.list_orders_for_user(user_id)).await??;
    Ok(HttpResponse::Ok().json(to_responses(orders)))
}

/// GET /orders/{id}
///
/// With `userId`, an order belonging to someone else is reported as missing.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order id"),
        ("userId" = Option<i32>, Query, description = "Restrict to this buyer"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<Orders>,
    path: web::Path<i32>,
    query: web::Query<OptionalUserQuery>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let user_id = query.into_inner().user_id;
    let order = web::block(move || service.get_order(id, user_id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Every order with its items, shipping record and buyer, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "All orders", body = [OrderResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(service: web::Data<Orders>) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || service.list_all_orders()).await??;
    Ok(HttpResponse::Ok().json(to_responses(orders)))
}

/// GET /orders/{id}/events
#[utoipa::path(
    get,
    path = "/orders/{id}/events",
    params(
        ("id" = i32, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Outbox events, oldest first", body = [OrderEventResponse]),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn order_events(
    service: web::Data<Orders>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let events = web::block(move || service.list_events(id)).await??;
    let body: Vec<OrderEventResponse> = events.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// PUT /orders/{id}/status
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(
        ("id" = i32, Path, description = "Order id"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderHeaderResponse),
        (status = 404, description = "Order not found"),
        (status = 422, description = "Transition not allowed"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    service: web::Data<Orders>,
    path: web::Path<i32>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let UpdateStatusRequest { status, note } = body.into_inner();
    let order = web::block(move || service.update_status(id, status, note)).await??;
    Ok(HttpResponse::Ok().json(OrderHeaderResponse::from(order)))
}

/// PUT /orders/{id}/cancel?userId=
#[utoipa::path(
    put,
    path = "/orders/{id}/cancel",
    params(
        ("id" = i32, Path, description = "Order id"),
        ("userId" = i32, Query, description = "Owner of the order"),
    ),
    responses(
        (status = 200, description = "Order cancelled", body = OrderHeaderResponse),
        (status = 404, description = "Order not found for this buyer"),
        (status = 422, description = "Order is no longer pending"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    service: web::Data<Orders>,
    path: web::Path<i32>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let user_id = query.into_inner().user_id;
    let order = web::block(move || service.cancel_order(id, user_id)).await??;
    Ok(HttpResponse::Ok().json(OrderHeaderResponse::from(order)))
}

/// PUT /orders/shipping/{shippingId}
#[utoipa::path(
    put,
    path = "/orders/shipping/{shippingId}",
    params(
        ("shippingId" = i32, Path, description = "Shipping record id"),
    ),
    request_body = UpdateShippingRequest,
    responses(
        (status = 200, description = "Shipping updated", body = ShippingUpdateResponse),
        (status = 400, description = "Empty or invalid patch"),
        (status = 404, description = "Shipping record not found"),
        (status = 422, description = "Order can no longer be edited"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_shipping(
    service: web::Data<Orders>,
    path: web::Path<i32>,
    body: web::Json<UpdateShippingRequest>,
) -> Result<HttpResponse, AppError> {
    let shipping_id = path.into_inner();
    let patch = body.into_inner().into_patch()?;
    let update = web::block(move || service.update_shipping(shipping_id, patch)).await??;
    Ok(HttpResponse::Ok().json(ShippingUpdateResponse::from(update)))
}

/// PUT /orders/items/{itemId}/quantity
#[utoipa::path(
    put,
    path = "/orders/items/{itemId}/quantity",
    params(
        ("itemId" = i32, Path, description = "Order item id"),
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity changed", body = ItemQuantityResponse),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Insufficient stock"),
        (status = 422, description = "Order can no longer be edited"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_item_quantity(
    service: web::Data<Orders>,
    path: web::Path<i32>,
    body: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();
    let quantity = body.into_inner().quantity;
    let update = web::block(move || service.update_item_quantity(item_id, quantity)).await??;
    Ok(HttpResponse::Ok().json(ItemQuantityResponse::from(update)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn body(json: serde_json::Value) -> CheckoutBody {
        serde_json::from_value(json).expect("valid checkout json")
    }

    #[test]
    fn checkout_body_maps_camel_case_fields() {
        let request = body(serde_json::json!({
            "name": "Ada",
            "phone": "+8801",
            "items": [{"productId": 1, "colorId": 2, "quantity": 2, "price": "50.00"}],
            "shipping": {
                "fullName": "Ada", "address1": "1 Loop St", "city": "Dhaka",
                "country": "BD", "deliveryArea": "Inside Dhaka"
            },
            "deliveryCharge": "10"
        }))
        .into_request()
        .expect("valid request");

        assert_eq!(request.items[0].key, VariantKey::new(1, Some(2), None));
        assert_eq!(
            request.items[0].price,
            BigDecimal::from_str("50.00").expect("literal")
        );
        assert_eq!(request.delivery_charge, Some(BigDecimal::from(10)));
        assert_eq!(request.shipping.delivery_area.as_deref(), Some("Inside Dhaka"));
        assert!(request.total.is_none());
    }

    #[test]
    fn malformed_price_is_a_bad_request() {
        let result = body(serde_json::json!({
            "email": "ada@example.com",
            "items": [{"productId": 1, "quantity": 1, "price": "fifty"}],
            "shipping": {"fullName": "Ada", "address1": "x", "city": "y", "country": "z"}
        }))
        .into_request();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn empty_shipping_request_becomes_empty_patch() {
        let patch = UpdateShippingRequest::default()
            .into_patch()
            .expect("valid");
        assert!(patch.is_empty());
    }

    #[test]
    fn status_request_uses_upper_case_names() {
        let req: UpdateStatusRequest =
            serde_json::from_str(r#"{"status":"SHIPPED","note":"courier picked up"}"#)
                .expect("valid");
        assert_eq!(req.status, OrderStatus::Shipped);
    }
}
