use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::inventory::{InventoryRecord, VariantKey};
use crate::domain::order::{Order, OrderEvent, OrderItem, ShippingDetails, ShippingRecord, UserRef};
use crate::domain::ports::DeliveryArea;
use crate::domain::pricing::{PricingRule, ProductRef};
use crate::schema::{
    delivery_areas, inventory_records, order_items, order_outbox, orders, pricing_rules, products,
    shipping_records, users,
};

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: i32,
    pub title: String,
    pub sku: String,
    pub base_price: BigDecimal,
    pub discounted_price: Option<BigDecimal>,
}

impl From<ProductRow> for ProductRef {
    fn from(row: ProductRow) -> Self {
        ProductRef {
            id: row.id,
            title: row.title,
            base_price: row.base_price,
            discounted_price: row.discounted_price,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = delivery_areas)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryAreaRow {
    pub id: i32,
    pub area_name: String,
    pub charge: BigDecimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<DeliveryAreaRow> for DeliveryArea {
    fn from(row: DeliveryAreaRow) -> Self {
        DeliveryArea {
            id: row.id,
            area_name: row.area_name,
            charge: row.charge,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i32,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRef {
    fn from(row: UserRow) -> Self {
        UserRef {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
}

// ── Inventory ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = inventory_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InventoryRow {
    pub id: i32,
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub available_quantity: i32,
    pub reserved_quantity: i32,
    pub minimum_threshold: i32,
    pub maximum_capacity: Option<i32>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InventoryRow> for InventoryRecord {
    fn from(row: InventoryRow) -> Self {
        InventoryRecord {
            id: row.id,
            key: VariantKey::new(row.product_id, row.color_id, row.size_id),
            available_quantity: row.available_quantity,
            reserved_quantity: row.reserved_quantity,
            minimum_threshold: row.minimum_threshold,
            maximum_capacity: row.maximum_capacity,
            is_active: row.is_active,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = inventory_records)]
pub struct NewInventoryRow<'a> {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub available_quantity: i32,
    pub reserved_quantity: i32,
    pub minimum_threshold: i32,
    pub maximum_capacity: Option<i32>,
    pub is_active: bool,
    pub notes: Option<&'a str>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = inventory_records)]
pub struct InventoryChangeset<'a> {
    pub available_quantity: Option<i32>,
    pub reserved_quantity: Option<i32>,
    pub minimum_threshold: Option<i32>,
    pub maximum_capacity: Option<i32>,
    pub is_active: Option<bool>,
    pub notes: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ── Pricing ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = pricing_rules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PricingRuleRow {
    pub id: i32,
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub unit_price: BigDecimal,
    pub discount_percentage: Option<BigDecimal>,
    pub rule_name: Option<String>,
    pub rule_type: String,
    pub is_active: bool,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PricingRuleRow> for PricingRule {
    type Error = DomainError;

    fn try_from(row: PricingRuleRow) -> Result<Self, Self::Error> {
        Ok(PricingRule {
            id: row.id,
            product_id: row.product_id,
            color_id: row.color_id,
            size_id: row.size_id,
            min_quantity: row.min_quantity,
            max_quantity: row.max_quantity,
            unit_price: row.unit_price,
            discount_percentage: row.discount_percentage,
            rule_name: row.rule_name,
            rule_type: row
                .rule_type
                .parse()
                .map_err(|_| DomainError::Internal(format!("bad rule_type '{}'", row.rule_type)))?,
            is_active: row.is_active,
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Full row image used for both inserts and overwrites.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = pricing_rules)]
#[diesel(treat_none_as_null = true)]
pub struct PricingRuleValues<'a> {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub unit_price: &'a BigDecimal,
    pub discount_percentage: Option<&'a BigDecimal>,
    pub rule_name: Option<&'a str>,
    pub rule_type: &'a str,
    pub is_active: bool,
    pub priority: i32,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: i32,
    pub order_code: String,
    pub user_id: i32,
    pub status: String,
    pub total: BigDecimal,
    pub delivery_charge: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            order_code: row.order_code,
            user_id: row.user_id,
            status: row.status.parse()?,
            total: row.total,
            delivery_charge: row.delivery_charge,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub order_code: &'a str,
    pub user_id: i32,
    pub status: &'a str,
    pub total: &'a BigDecimal,
    pub delivery_charge: &'a BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub quantity: i32,
    pub price: BigDecimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            key: VariantKey::new(row.product_id, row.color_id, row.size_id),
            quantity: row.quantity,
            price: row.price,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow<'a> {
    pub order_id: i32,
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub quantity: i32,
    pub price: &'a BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = shipping_records)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShippingRow {
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
    pub delivery_charge: BigDecimal,
}

impl From<ShippingRow> for ShippingRecord {
    fn from(row: ShippingRow) -> Self {
        ShippingRecord {
            id: row.id,
            order_id: row.order_id,
            details: ShippingDetails {
                full_name: row.full_name,
                address1: row.address1,
                address2: row.address2,
                city: row.city,
                state: row.state,
                postal_code: row.postal_code,
                country: row.country,
                phone: row.phone,
                email: row.email,
                delivery_area: row.delivery_area,
            },
            delivery_charge: row.delivery_charge,
        }
    }
}

/// Address image written on insert (with `order_id`) and on edits.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = shipping_records)]
#[diesel(treat_none_as_null = true)]
pub struct ShippingValues<'a> {
    pub full_name: &'a str,
    pub address1: &'a str,
    pub address2: Option<&'a str>,
    pub city: &'a str,
    pub state: Option<&'a str>,
    pub postal_code: Option<&'a str>,
    pub country: &'a str,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub delivery_area: Option<&'a str>,
    pub delivery_charge: &'a BigDecimal,
}

impl<'a> ShippingValues<'a> {
    pub fn new(details: &'a ShippingDetails, delivery_charge: &'a BigDecimal) -> Self {
        Self {
            full_name: &details.full_name,
            address1: &details.address1,
            address2: details.address2.as_deref(),
            city: &details.city,
            state: details.state.as_deref(),
            postal_code: details.postal_code.as_deref(),
            country: &details.country,
            phone: details.phone.as_deref(),
            email: details.email.as_deref(),
            delivery_area: details.delivery_area.as_deref(),
            delivery_charge,
        }
    }
}

// ── Outbox ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub order_id: i32,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl From<OutboxEventRow> for OrderEvent {
    fn from(row: OutboxEventRow) -> Self {
        OrderEvent {
            id: row.id,
            order_id: row.order_id,
            order_code: row.aggregate_id,
            event_type: row.event_type,
            payload: row.payload,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub order_id: i32,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
