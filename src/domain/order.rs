use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::DomainError;
use super::inventory::VariantKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Position on the fulfilment path; `None` for the cancelled side branch.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    /// Forward moves along the fulfilment path, or PENDING -> CANCELLED.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to > from,
            (Some(_), None) => *self == OrderStatus::Pending,
            (None, _) => false,
        }
    }

    pub fn transition_to(&self, next: OrderStatus) -> Result<OrderStatus, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }

    /// Items and shipping may be edited only before the parcel leaves.
    pub fn is_editable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    pub fn ensure_editable(&self, operation: &'static str) -> Result<(), DomainError> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(DomainError::InvalidState {
                status: *self,
                operation,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::Internal(format!(
                "unknown order status '{other}' in storage"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i32,
    pub order_code: String,
    pub user_id: i32,
    pub status: OrderStatus,
    pub total: BigDecimal,
    pub delivery_charge: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub key: VariantKey,
    pub quantity: i32,
    /// Unit price captured at checkout; never re-derived.
    pub price: BigDecimal,
}

impl OrderItem {
    pub fn line_total(&self) -> BigDecimal {
        &self.price * BigDecimal::from(self.quantity)
    }
}

/// Address and contact fields of a shipment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShippingDetails {
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

impl ShippingDetails {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("full_name", &self.full_name),
            ("address1", &self.address1),
            ("city", &self.city),
            ("country", &self.country),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidInput(format!(
                    "shipping {field} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingRecord {
    pub id: i32,
    pub order_id: i32,
    pub details: ShippingDetails,
    pub delivery_charge: BigDecimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShippingPatch {
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
    pub delivery_charge: Option<BigDecimal>,
}

impl ShippingPatch {
    /// Applies the address/contact fields; `delivery_charge` is reconciled
    /// separately against the order total.
    pub fn apply_to(&self, details: &mut ShippingDetails) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        fn set_opt(target: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }
        set(&mut details.full_name, &self.full_name);
        set(&mut details.address1, &self.address1);
        set_opt(&mut details.address2, &self.address2);
        set(&mut details.city, &self.city);
        set_opt(&mut details.state, &self.state);
        set_opt(&mut details.postal_code, &self.postal_code);
        set(&mut details.country, &self.country);
        set_opt(&mut details.phone, &self.phone);
        set_opt(&mut details.email, &self.email);
        set_opt(&mut details.delivery_area, &self.delivery_area);
    }

    pub fn is_empty(&self) -> bool {
        *self == ShippingPatch::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRef {
    pub id: i32,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// An order with its items, shipping record and buyer.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAggregate {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub shipping: Option<ShippingRecord>,
    pub user: Option<UserRef>,
}

impl OrderAggregate {
    pub fn items_subtotal(&self) -> BigDecimal {
        items_subtotal(&self.items)
    }
}

pub fn items_subtotal(items: &[OrderItem]) -> BigDecimal {
    items
        .iter()
        .fold(BigDecimal::zero(), |acc, item| acc + item.line_total())
}

/// Insert graph for a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_code: String,
    pub user_id: i32,
    pub total: BigDecimal,
    pub delivery_charge: BigDecimal,
    pub items: Vec<NewOrderItem>,
    pub shipping: ShippingDetails,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub key: VariantKey,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderEventType {
    OrderPlaced,
    OrderStatusChanged,
    OrderCancelled,
    ShippingUpdated,
    OrderItemQuantityChanged,
}

impl OrderEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventType::OrderPlaced => "OrderPlaced",
            OrderEventType::OrderStatusChanged => "OrderStatusChanged",
            OrderEventType::OrderCancelled => "OrderCancelled",
            OrderEventType::ShippingUpdated => "ShippingUpdated",
            OrderEventType::OrderItemQuantityChanged => "OrderItemQuantityChanged",
        }
    }
}

/// Outbox row describing a committed change to an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub id: uuid::Uuid,
    pub order_id: i32,
    pub order_code: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
