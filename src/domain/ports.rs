use bigdecimal::BigDecimal;

use super::errors::DomainError;
use super::inventory::{InventoryRecord, LowStockFilter, StockCounts, StockPatch, VariantKey};
use super::order::{
    NewOrder, Order, OrderAggregate, OrderEvent, OrderItem, OrderStatus, ShippingDetails,
    ShippingRecord, UserRef,
};
use super::pricing::{PricingRule, PricingRuleDraft, ProductRef, RuleType};

/// Buyer identity offered at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyerIdentity {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryArea {
    pub id: i32,
    pub area_name: String,
    pub charge: BigDecimal,
    pub is_active: bool,
}

/// Read-only lookups into the product catalog and its dimension tables.
pub trait CatalogPort {
    fn find_product(&mut self, id: i32) -> Result<Option<ProductRef>, DomainError>;
    fn color_exists(&mut self, id: i32) -> Result<bool, DomainError>;
    fn size_exists(&mut self, id: i32) -> Result<bool, DomainError>;
    fn find_delivery_area(&mut self, name: &str) -> Result<Option<DeliveryArea>, DomainError>;
}

pub trait UserDirectory {
    /// Finds a user by phone or email, creating one when neither matches.
    fn find_or_create_user(&mut self, buyer: &BuyerIdentity) -> Result<UserRef, DomainError>;
}

pub trait InventoryPort {
    fn find_stock(&mut self, key: &VariantKey) -> Result<Option<InventoryRecord>, DomainError>;
    /// Same as `find_stock` but holds a row lock until the transaction ends.
    fn lock_stock(&mut self, key: &VariantKey) -> Result<Option<InventoryRecord>, DomainError>;
    fn find_stock_by_id(&mut self, id: i32) -> Result<Option<InventoryRecord>, DomainError>;
    fn insert_stock(
        &mut self,
        key: &VariantKey,
        counts: &StockCounts,
    ) -> Result<InventoryRecord, DomainError>;
    /// Adds `delta` to `available_quantity` only if the result stays >= 0.
    /// Returns `None` when the guard rejects the write.
    fn apply_stock_delta(
        &mut self,
        id: i32,
        delta: i32,
        notes: Option<String>,
    ) -> Result<Option<InventoryRecord>, DomainError>;
    fn update_stock(&mut self, id: i32, patch: &StockPatch) -> Result<InventoryRecord, DomainError>;
    fn delete_stock(&mut self, id: i32) -> Result<bool, DomainError>;
    /// Active records of a product ordered by color then size.
    fn list_stock_for_product(&mut self, product_id: i32)
        -> Result<Vec<InventoryRecord>, DomainError>;
    /// Ascending by available quantity.
    fn list_low_stock(&mut self, filter: LowStockFilter)
        -> Result<Vec<InventoryRecord>, DomainError>;
}

pub trait PricingPort {
    fn find_rule(&mut self, id: i32) -> Result<Option<PricingRule>, DomainError>;
    /// An active rule with the same variant scope and `min_quantity`.
    fn find_active_tier(
        &mut self,
        key: &VariantKey,
        min_quantity: i32,
        excluding: Option<i32>,
    ) -> Result<Option<PricingRule>, DomainError>;
    fn insert_rule(&mut self, draft: &PricingRuleDraft) -> Result<PricingRule, DomainError>;
    fn save_rule(&mut self, rule: &PricingRule) -> Result<PricingRule, DomainError>;
    fn delete_rule(&mut self, id: i32) -> Result<bool, DomainError>;
    /// Active rules of a product whose quantity window contains `quantity`.
    fn applicable_rules(
        &mut self,
        product_id: i32,
        quantity: i32,
    ) -> Result<Vec<PricingRule>, DomainError>;
    /// Ordered by priority desc, rule type asc, min quantity asc.
    fn list_rules(&mut self, product_id: i32) -> Result<Vec<PricingRule>, DomainError>;
    /// Active rules of one type, ordered by priority desc, min quantity asc.
    fn list_rules_by_type(
        &mut self,
        product_id: i32,
        rule_type: RuleType,
    ) -> Result<Vec<PricingRule>, DomainError>;
}

pub trait OrderPort {
    fn order_code_exists(&mut self, code: &str) -> Result<bool, DomainError>;
    fn insert_order(&mut self, order: &NewOrder) -> Result<i32, DomainError>;
    fn find_order(&mut self, id: i32) -> Result<Option<Order>, DomainError>;
    /// Same as `find_order` but holds a row lock until the transaction ends.
    fn lock_order(&mut self, id: i32) -> Result<Option<Order>, DomainError>;
    fn load_aggregate(&mut self, id: i32) -> Result<Option<OrderAggregate>, DomainError>;
    /// Newest first.
    fn list_orders_for_user(&mut self, user_id: i32) -> Result<Vec<OrderAggregate>, DomainError>;
    /// Newest first, with buyers loaded.
    fn list_all_orders(&mut self) -> Result<Vec<OrderAggregate>, DomainError>;
    fn set_status(&mut self, id: i32, status: OrderStatus) -> Result<Order, DomainError>;
    fn set_totals(
        &mut self,
        id: i32,
        total: &BigDecimal,
        delivery_charge: &BigDecimal,
    ) -> Result<Order, DomainError>;
    fn find_item(&mut self, item_id: i32) -> Result<Option<OrderItem>, DomainError>;
    fn list_items(&mut self, order_id: i32) -> Result<Vec<OrderItem>, DomainError>;
    fn set_item_quantity(&mut self, item_id: i32, quantity: i32) -> Result<OrderItem, DomainError>;
    fn find_shipping(&mut self, id: i32) -> Result<Option<ShippingRecord>, DomainError>;
    fn save_shipping(
        &mut self,
        id: i32,
        details: &ShippingDetails,
        delivery_charge: &BigDecimal,
    ) -> Result<ShippingRecord, DomainError>;
    fn append_event(
        &mut self,
        order: &Order,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), DomainError>;
    /// Oldest first.
    fn list_events(&mut self, order_id: i32) -> Result<Vec<OrderEvent>, DomainError>;
}

/// Everything a single request may touch inside one transaction.
pub trait UnitOfWork: CatalogPort + UserDirectory + InventoryPort + PricingPort + OrderPort {}

impl<T> UnitOfWork for T where T: CatalogPort + UserDirectory + InventoryPort + PricingPort + OrderPort
{}

pub trait Store: Clone + Send + Sync + 'static {
    /// Runs `f` in one transaction: commits when it returns `Ok`, rolls back
    /// every write otherwise.
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>;
}
