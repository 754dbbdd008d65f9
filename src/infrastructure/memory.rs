use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::inventory::{InventoryRecord, LowStockFilter, StockCounts, StockPatch, VariantKey};
use crate::domain::order::{
    NewOrder, Order, OrderAggregate, OrderEvent, OrderItem, OrderStatus, ShippingDetails,
    ShippingRecord, UserRef,
};
use crate::domain::ports::{
    BuyerIdentity, CatalogPort, DeliveryArea, InventoryPort, OrderPort, PricingPort, Store,
    UnitOfWork, UserDirectory,
};
use crate::domain::pricing::{PricingRule, PricingRuleDraft, ProductRef, RuleType};

/// Process-local store. Transactions run one at a time against a copy of the
/// state, which replaces the original only when the closure succeeds.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> Result<T, DomainError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DomainError::Internal("memory store lock poisoned".to_string()))?;
        Ok(f(&mut state))
    }

    // ── Catalog seeding ──────────────────────────────────────────────────────

    pub fn add_product(&self, product: ProductRef) -> Result<(), DomainError> {
        self.with_state(|s| {
            s.products.insert(product.id, product);
        })
    }

    pub fn add_color(&self, id: i32) -> Result<(), DomainError> {
        self.with_state(|s| {
            s.colors.insert(id);
        })
    }

    pub fn add_size(&self, id: i32) -> Result<(), DomainError> {
        self.with_state(|s| {
            s.sizes.insert(id);
        })
    }

    pub fn add_delivery_area(
        &self,
        area_name: &str,
        charge: BigDecimal,
        is_active: bool,
    ) -> Result<i32, DomainError> {
        self.with_state(|s| {
            let id = s.next_id();
            s.delivery_areas.push(DeliveryArea {
                id,
                area_name: area_name.to_string(),
                charge,
                is_active,
            });
            id
        })
    }
}

impl Store for MemoryStore {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>,
    {
        let mut committed = self
            .state
            .lock()
            .map_err(|_| DomainError::Internal("memory store lock poisoned".to_string()))?;
        let mut working = committed.clone();
        let value = f(&mut working)?;
        *committed = working;
        Ok(value)
    }
}

#[derive(Debug, Clone, Default)]
struct State {
    last_id: i32,
    products: BTreeMap<i32, ProductRef>,
    colors: BTreeSet<i32>,
    sizes: BTreeSet<i32>,
    delivery_areas: Vec<DeliveryArea>,
    users: BTreeMap<i32, UserRef>,
    stock: BTreeMap<i32, InventoryRecord>,
    rules: BTreeMap<i32, PricingRule>,
    orders: BTreeMap<i32, Order>,
    items: BTreeMap<i32, OrderItem>,
    shipping: BTreeMap<i32, ShippingRecord>,
    events: Vec<OrderEvent>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn order_mut(&mut self, id: i32) -> Result<&mut Order, DomainError> {
        self.orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Order", id))
    }

    fn aggregate(&self, order: &Order, with_user: bool) -> OrderAggregate {
        OrderAggregate {
            order: order.clone(),
            items: self
                .items
                .values()
                .filter(|i| i.order_id == order.id)
                .cloned()
                .collect(),
            shipping: self
                .shipping
                .values()
                .find(|s| s.order_id == order.id)
                .cloned(),
            user: if with_user {
                self.users.get(&order.user_id).cloned()
            } else {
                None
            },
        }
    }

    fn newest_first(&self, user_id: Option<i32>) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self
            .orders
            .values()
            .filter(|o| user_id.map_or(true, |uid| o.user_id == uid))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders
    }
}

impl CatalogPort for State {
    fn find_product(&mut self, id: i32) -> Result<Option<ProductRef>, DomainError> {
        Ok(self.products.get(&id).cloned())
    }

    fn color_exists(&mut self, id: i32) -> Result<bool, DomainError> {
        Ok(self.colors.contains(&id))
    }

    fn size_exists(&mut self, id: i32) -> Result<bool, DomainError> {
        Ok(self.sizes.contains(&id))
    }

    fn find_delivery_area(&mut self, name: &str) -> Result<Option<DeliveryArea>, DomainError> {
        Ok(self
            .delivery_areas
            .iter()
            .find(|a| a.area_name == name)
            .cloned())
    }
}

impl UserDirectory for State {
    fn find_or_create_user(&mut self, buyer: &BuyerIdentity) -> Result<UserRef, DomainError> {
        let present = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let phone = present(&buyer.phone);
        let email = present(&buyer.email);
        if phone.is_none() && email.is_none() {
            return Err(DomainError::InvalidInput(
                "buyer needs a phone number or an email".to_string(),
            ));
        }

        let existing = self.users.values().find(|u| {
            (phone.is_some() && u.phone == phone) || (email.is_some() && u.email == email)
        });
        if let Some(user) = existing {
            return Ok(user.clone());
        }

        let user = UserRef {
            id: self.next_id(),
            name: buyer.name.clone(),
            email,
            phone,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }
}

impl InventoryPort for State {
    fn find_stock(&mut self, key: &VariantKey) -> Result<Option<InventoryRecord>, DomainError> {
        Ok(self.stock.values().find(|r| r.key == *key).cloned())
    }

    fn lock_stock(&mut self, key: &VariantKey) -> Result<Option<InventoryRecord>, DomainError> {
        // The store-wide mutex already serialises transactions.
        self.find_stock(key)
    }

    fn find_stock_by_id(&mut self, id: i32) -> Result<Option<InventoryRecord>, DomainError> {
        Ok(self.stock.get(&id).cloned())
    }

    fn insert_stock(
        &mut self,
        key: &VariantKey,
        counts: &StockCounts,
    ) -> Result<InventoryRecord, DomainError> {
        if self.stock.values().any(|r| r.key == *key) {
            return Err(DomainError::Conflict(format!(
                "inventory record for {key} already exists"
            )));
        }
        let now = Utc::now();
        let record = InventoryRecord {
            id: self.next_id(),
            key: *key,
            available_quantity: counts.available_quantity,
            reserved_quantity: counts.reserved_quantity,
            minimum_threshold: counts.minimum_threshold,
            maximum_capacity: counts.maximum_capacity,
            is_active: counts.is_active,
            notes: counts.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.stock.insert(record.id, record.clone());
        Ok(record)
    }

    fn apply_stock_delta(
        &mut self,
        id: i32,
        delta: i32,
        notes: Option<String>,
    ) -> Result<Option<InventoryRecord>, DomainError> {
        let Some(record) = self.stock.get_mut(&id) else {
            return Ok(None);
        };
        match record.available_quantity.checked_add(delta) {
            Some(next) if next >= 0 => {
                record.available_quantity = next;
                record.notes = notes;
                record.updated_at = Utc::now();
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    fn update_stock(&mut self, id: i32, patch: &StockPatch) -> Result<InventoryRecord, DomainError> {
        let record = self
            .stock
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Inventory record", id))?;
        patch.apply_to(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn delete_stock(&mut self, id: i32) -> Result<bool, DomainError> {
        Ok(self.stock.remove(&id).is_some())
    }

    fn list_stock_for_product(
        &mut self,
        product_id: i32,
    ) -> Result<Vec<InventoryRecord>, DomainError> {
        let mut records: Vec<InventoryRecord> = self
            .stock
            .values()
            .filter(|r| r.key.product_id == product_id && r.is_active)
            .cloned()
            .collect();
        // Postgres sorts NULLs last in ascending order.
        records.sort_by_key(|r| {
            (
                r.key.color_id.is_none(),
                r.key.color_id,
                r.key.size_id.is_none(),
                r.key.size_id,
            )
        });
        Ok(records)
    }

    fn list_low_stock(
        &mut self,
        filter: LowStockFilter,
    ) -> Result<Vec<InventoryRecord>, DomainError> {
        let mut records: Vec<InventoryRecord> = self
            .stock
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.available_quantity, r.id));
        Ok(records)
    }
}

impl PricingPort for State {
    fn find_rule(&mut self, id: i32) -> Result<Option<PricingRule>, DomainError> {
        Ok(self.rules.get(&id).cloned())
    }

    fn find_active_tier(
        &mut self,
        key: &VariantKey,
        min_quantity: i32,
        excluding: Option<i32>,
    ) -> Result<Option<PricingRule>, DomainError> {
        Ok(self
            .rules
            .values()
            .find(|r| {
                r.is_active
                    && Some(r.id) != excluding
                    && r.product_id == key.product_id
                    && r.color_id == key.color_id
                    && r.size_id == key.size_id
                    && r.min_quantity == min_quantity
            })
            .cloned())
    }

    fn insert_rule(&mut self, draft: &PricingRuleDraft) -> Result<PricingRule, DomainError> {
        let now = Utc::now();
        let rule = PricingRule {
            id: self.next_id(),
            product_id: draft.product_id,
            color_id: draft.color_id,
            size_id: draft.size_id,
            min_quantity: draft.min_quantity,
            max_quantity: draft.max_quantity,
            unit_price: draft.unit_price.clone(),
            discount_percentage: draft.discount_percentage.clone(),
            rule_name: draft.rule_name.clone(),
            rule_type: draft.rule_type,
            is_active: draft.is_active,
            priority: draft.priority,
            created_at: now,
            updated_at: now,
        };
        self.rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    fn save_rule(&mut self, rule: &PricingRule) -> Result<PricingRule, DomainError> {
        let stored = self
            .rules
            .get_mut(&rule.id)
            .ok_or_else(|| DomainError::not_found("Pricing rule", rule.id))?;
        *stored = PricingRule {
            updated_at: Utc::now(),
            ..rule.clone()
        };
        Ok(stored.clone())
    }

    fn delete_rule(&mut self, id: i32) -> Result<bool, DomainError> {
        Ok(self.rules.remove(&id).is_some())
    }

    fn applicable_rules(
        &mut self,
        product_id: i32,
        quantity: i32,
    ) -> Result<Vec<PricingRule>, DomainError> {
        let mut rules: Vec<PricingRule> = self
            .rules
            .values()
            .filter(|r| r.product_id == product_id && r.covers(quantity))
            .cloned()
            .collect();
        rules.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(b.min_quantity.cmp(&a.min_quantity))
                .then(a.id.cmp(&b.id))
        });
        Ok(rules)
    }

    fn list_rules(&mut self, product_id: i32) -> Result<Vec<PricingRule>, DomainError> {
        let mut rules: Vec<PricingRule> = self
            .rules
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        rules.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.rule_type.as_str().cmp(b.rule_type.as_str()))
                .then(a.min_quantity.cmp(&b.min_quantity))
        });
        Ok(rules)
    }

    fn list_rules_by_type(
        &mut self,
        product_id: i32,
        rule_type: RuleType,
    ) -> Result<Vec<PricingRule>, DomainError> {
        let mut rules: Vec<PricingRule> = self
            .rules
            .values()
            .filter(|r| r.product_id == product_id && r.rule_type == rule_type && r.is_active)
            .cloned()
            .collect();
        rules.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.min_quantity.cmp(&b.min_quantity))
        });
        Ok(rules)
    }
}

impl OrderPort for State {
    fn order_code_exists(&mut self, code: &str) -> Result<bool, DomainError> {
        Ok(self.orders.values().any(|o| o.order_code == code))
    }

    fn insert_order(&mut self, order: &NewOrder) -> Result<i32, DomainError> {
        if self.order_code_exists(&order.order_code)? {
            return Err(DomainError::Conflict(format!(
                "order code {} already exists",
                order.order_code
            )));
        }
        let now = Utc::now();
        let order_id = self.next_id();
        self.orders.insert(
            order_id,
            Order {
                id: order_id,
                order_code: order.order_code.clone(),
                user_id: order.user_id,
                status: OrderStatus::Pending,
                total: order.total.clone(),
                delivery_charge: order.delivery_charge.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        for item in &order.items {
            let id = self.next_id();
            self.items.insert(
                id,
                OrderItem {
                    id,
                    order_id,
                    key: item.key,
                    quantity: item.quantity,
                    price: item.price.clone(),
                },
            );
        }
        let shipping_id = self.next_id();
        self.shipping.insert(
            shipping_id,
            ShippingRecord {
                id: shipping_id,
                order_id,
                details: order.shipping.clone(),
                delivery_charge: order.delivery_charge.clone(),
            },
        );
        Ok(order_id)
    }

    fn find_order(&mut self, id: i32) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.get(&id).cloned())
    }

    fn lock_order(&mut self, id: i32) -> Result<Option<Order>, DomainError> {
        self.find_order(id)
    }

    fn load_aggregate(&mut self, id: i32) -> Result<Option<OrderAggregate>, DomainError> {
        Ok(self.orders.get(&id).map(|o| self.aggregate(o, true)))
    }

    fn list_orders_for_user(&mut self, user_id: i32) -> Result<Vec<OrderAggregate>, DomainError> {
        Ok(self
            .newest_first(Some(user_id))
            .into_iter()
            .map(|o| self.aggregate(o, false))
            .collect())
    }

    fn list_all_orders(&mut self) -> Result<Vec<OrderAggregate>, DomainError> {
        Ok(self
            .newest_first(None)
            .into_iter()
            .map(|o| self.aggregate(o, true))
            .collect())
    }

    fn set_status(&mut self, id: i32, status: OrderStatus) -> Result<Order, DomainError> {
        let order = self.order_mut(id)?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    fn set_totals(
        &mut self,
        id: i32,
        total: &BigDecimal,
        delivery_charge: &BigDecimal,
    ) -> Result<Order, DomainError> {
        let order = self.order_mut(id)?;
        order.total = total.clone();
        order.delivery_charge = delivery_charge.clone();
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    fn find_item(&mut self, item_id: i32) -> Result<Option<OrderItem>, DomainError> {
        Ok(self.items.get(&item_id).cloned())
    }

    fn list_items(&mut self, order_id: i32) -> Result<Vec<OrderItem>, DomainError> {
        Ok(self
            .items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    fn set_item_quantity(&mut self, item_id: i32, quantity: i32) -> Result<OrderItem, DomainError> {
        let item = self
            .items
            .get_mut(&item_id)
            .ok_or_else(|| DomainError::not_found("Order item", item_id))?;
        item.quantity = quantity;
        Ok(item.clone())
    }

    fn find_shipping(&mut self, id: i32) -> Result<Option<ShippingRecord>, DomainError> {
        Ok(self.shipping.get(&id).cloned())
    }

    fn save_shipping(
        &mut self,
        id: i32,
        details: &ShippingDetails,
        delivery_charge: &BigDecimal,
    ) -> Result<ShippingRecord, DomainError> {
        let record = self
            .shipping
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Shipping record", id))?;
        record.details = details.clone();
        record.delivery_charge = delivery_charge.clone();
        Ok(record.clone())
    }

    fn append_event(
        &mut self,
        order: &Order,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), DomainError> {
        self.events.push(OrderEvent {
            id: Uuid::new_v4(),
            order_id: order.id,
            order_code: order.order_code.clone(),
            event_type: event_type.to_string(),
            payload,
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn list_events(&mut self, order_id: i32) -> Result<Vec<OrderEvent>, DomainError> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect())
    }
}
