use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};
use serde_json::json;

use crate::config::CheckoutPolicy;
use crate::domain::errors::DomainError;
use crate::domain::inventory::{append_note, VariantKey};
use crate::domain::order::{
    items_subtotal, Order, OrderAggregate, OrderEvent, OrderEventType, OrderItem, OrderStatus,
    ShippingPatch, ShippingRecord,
};
use crate::domain::ports::{Store, UnitOfWork};
use crate::domain::pricing::round_money;

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingUpdate {
    pub shipping: ShippingRecord,
    pub order: Order,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemQuantityUpdate {
    pub item: OrderItem,
    pub order: Order,
}

pub struct OrderService<S> {
    store: S,
    policy: CheckoutPolicy,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S, policy: CheckoutPolicy) -> Self {
        Self { store, policy }
    }

    /// With `user_id`, an order owned by someone else is reported as missing.
    pub fn get_order(&self, id: i32, user_id: Option<i32>) -> Result<OrderAggregate, DomainError> {
        self.store.transaction(|uow| {
            uow.load_aggregate(id)?
                .filter(|agg| user_id.map_or(true, |uid| agg.order.user_id == uid))
                .ok_or_else(|| DomainError::not_found("Order", id))
        })
    }

    pub fn list_orders_for_user(&self, user_id: i32) -> Result<Vec<OrderAggregate>, DomainError> {
        self.store
            .transaction(|uow| uow.list_orders_for_user(user_id))
    }

    pub fn list_all_orders(&self) -> Result<Vec<OrderAggregate>, DomainError> {
        self.store.transaction(|uow| uow.list_all_orders())
    }

    pub fn list_events(&self, order_id: i32) -> Result<Vec<OrderEvent>, DomainError> {
        self.store.transaction(|uow| {
            uow.find_order(order_id)?
                .ok_or_else(|| DomainError::not_found("Order", order_id))?;
            uow.list_events(order_id)
        })
    }

    /// Administrative status change. CANCELLED goes through the same path
    /// as a buyer cancellation, restock included.
    pub fn update_status(
        &self,
        id: i32,
        status: OrderStatus,
        note: Option<String>,
    ) -> Result<Order, DomainError> {
        let order = self.store.transaction(|uow| {
            let order = uow
                .lock_order(id)?
                .ok_or_else(|| DomainError::not_found("Order", id))?;
            order.status.transition_to(status)?;
            if status == OrderStatus::Cancelled {
                return self.cancel_in(uow, order, note.as_deref());
            }
            let updated = uow.set_status(id, status)?;
            uow.append_event(
                &updated,
                OrderEventType::OrderStatusChanged.as_str(),
                json!({
                    "order_id": updated.id,
                    "from": order.status.as_str(),
                    "to": updated.status.as_str(),
                    "note": note,
                }),
            )?;
            Ok(updated)
        });
        log_outcome(&order, |o| {
            format!("Order {} moved to {}", o.order_code, o.status)
        });
        order
    }

    /// Buyer cancellation: only the owner, only while PENDING.
    pub fn cancel_order(&self, id: i32, user_id: i32) -> Result<Order, DomainError> {
        let order = self.store.transaction(|uow| {
            let order = uow
                .lock_order(id)?
                .filter(|o| o.user_id == user_id)
                .ok_or_else(|| DomainError::not_found("Order", id))?;
            order.status.transition_to(OrderStatus::Cancelled)?;
            self.cancel_in(uow, order, None)
        });
        log_outcome(&order, |o| format!("Order {} cancelled", o.order_code));
        order
    }

    /// Applies address/contact edits. A new delivery charge replaces the old
    /// one in the order total without re-summing the items.
    pub fn update_shipping(
        &self,
        shipping_id: i32,
        patch: ShippingPatch,
    ) -> Result<ShippingUpdate, DomainError> {
        validate_shipping_patch(&patch)?;
        let update = self.store.transaction(|uow| {
            let shipping = uow
                .find_shipping(shipping_id)?
                .ok_or_else(|| DomainError::not_found("Shipping record", shipping_id))?;
            let order = uow
                .lock_order(shipping.order_id)?
                .ok_or_else(|| DomainError::not_found("Order", shipping.order_id))?;
            order.status.ensure_editable("edit shipping")?;

            let mut details = shipping.details.clone();
            patch.apply_to(&mut details);

            let (order, delivery_charge) = match &patch.delivery_charge {
                Some(charge) => {
                    let charge = round_money(charge);
                    let total = (&order.total - &order.delivery_charge) + &charge;
                    (uow.set_totals(order.id, &total, &charge)?, charge)
                }
                None => (order, shipping.delivery_charge.clone()),
            };
            let shipping = uow.save_shipping(shipping_id, &details, &delivery_charge)?;

            uow.append_event(
                &order,
                OrderEventType::ShippingUpdated.as_str(),
                json!({
                    "order_id": order.id,
                    "shipping_id": shipping.id,
                    "delivery_charge": order.delivery_charge.to_string(),
                    "total": order.total.to_string(),
                }),
            )?;
            Ok(ShippingUpdate { shipping, order })
        });
        log_outcome(&update, |u| {
            format!(
                "Shipping {} of order {} updated (total {})",
                u.shipping.id, u.order.order_code, u.order.total
            )
        });
        update
    }

    /// Moves the difference between old and new quantity through the
    /// variant's stock, then re-derives the order total from every item.
    pub fn update_item_quantity(
        &self,
        item_id: i32,
        quantity: i32,
    ) -> Result<ItemQuantityUpdate, DomainError> {
        if quantity < 1 {
            return Err(DomainError::InvalidInput(format!(
                "quantity must be at least 1, got {quantity}"
            )));
        }
        let update = self.store.transaction(|uow| {
            let item = uow
                .find_item(item_id)?
                .ok_or_else(|| DomainError::not_found("Order item", item_id))?;
            let order = uow
                .lock_order(item.order_id)?
                .ok_or_else(|| DomainError::not_found("Order", item.order_id))?;
            order.status.ensure_editable("change item quantity")?;

            let delta = quantity - item.quantity;
            if delta == 0 {
                return Ok(ItemQuantityUpdate { item, order });
            }

            let stock = uow
                .lock_stock(&item.key)?
                .filter(|r| r.is_active)
                .ok_or_else(|| DomainError::not_found("Inventory record", item.key))?;
            if delta > 0 && stock.available_quantity < delta {
                return Err(item.key.insufficient(delta, stock.available_quantity));
            }
            let reason = format!(
                "order {} item {} quantity {} -> {}",
                order.order_code, item.id, item.quantity, quantity
            );
            uow.apply_stock_delta(
                stock.id,
                -delta,
                append_note(stock.notes.as_deref(), Some(&reason)),
            )?
            .ok_or_else(|| item.key.insufficient(delta, stock.available_quantity))?;

            let updated_item = uow.set_item_quantity(item.id, quantity)?;
            let items: Vec<OrderItem> = uow
                .list_items(order.id)?
                .into_iter()
                .map(|i| if i.id == updated_item.id { updated_item.clone() } else { i })
                .collect();
            let total = items_subtotal(&items) + &order.delivery_charge;
            let order = uow.set_totals(order.id, &total, &order.delivery_charge)?;

            uow.append_event(
                &order,
                OrderEventType::OrderItemQuantityChanged.as_str(),
                json!({
                    "order_id": order.id,
                    "item_id": updated_item.id,
                    "from": item.quantity,
                    "to": updated_item.quantity,
                    "total": order.total.to_string(),
                }),
            )?;
            Ok(ItemQuantityUpdate {
                item: updated_item,
                order,
            })
        });
        if let Err(e @ DomainError::InsufficientStock { .. }) = &update {
            log::warn!("Quantity change on item {} rejected: {}", item_id, e);
        }
        log_outcome(&update, |u| {
            format!(
                "Item {} of order {} now x{} (total {})",
                u.item.id, u.order.order_code, u.item.quantity, u.order.total
            )
        });
        update
    }

    fn cancel_in(
        &self,
        uow: &mut dyn UnitOfWork,
        order: Order,
        note: Option<&str>,
    ) -> Result<Order, DomainError> {
        let mut restocked = Vec::new();
        if self.policy.restock_on_cancel {
            let reason = format!("order {} cancelled", order.order_code);
            // Same lock order as checkout: one row per variant, in key order.
            let mut returned: BTreeMap<VariantKey, i32> = BTreeMap::new();
            for item in uow.list_items(order.id)? {
                *returned.entry(item.key).or_insert(0) += item.quantity;
            }
            for (key, quantity) in returned {
                let Some(stock) = uow.lock_stock(&key)? else {
                    log::warn!(
                        "No inventory record for {}; skipping restock of order {}",
                        key,
                        order.order_code
                    );
                    continue;
                };
                uow.apply_stock_delta(
                    stock.id,
                    quantity,
                    append_note(stock.notes.as_deref(), Some(&reason)),
                )?
                .ok_or_else(|| DomainError::Internal(format!("restock of {key} was refused")))?;
                restocked.push(json!({
                    "product_id": key.product_id,
                    "color_id": key.color_id,
                    "size_id": key.size_id,
                    "quantity": quantity,
                }));
            }
        }

        let cancelled = uow.set_status(order.id, OrderStatus::Cancelled)?;
        uow.append_event(
            &cancelled,
            OrderEventType::OrderCancelled.as_str(),
            json!({
                "order_id": cancelled.id,
                "from": order.status.as_str(),
                "note": note,
                "restocked": restocked,
            }),
        )?;
        Ok(cancelled)
    }
}

fn validate_shipping_patch(patch: &ShippingPatch) -> Result<(), DomainError> {
    if patch.is_empty() {
        return Err(DomainError::InvalidInput(
            "no shipping fields to update".to_string(),
        ));
    }
    for (field, value) in [
        ("full_name", &patch.full_name),
        ("address1", &patch.address1),
        ("city", &patch.city),
        ("country", &patch.country),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(DomainError::InvalidInput(format!(
                "shipping {field} must not be empty"
            )));
        }
    }
    if let Some(charge) = &patch.delivery_charge {
        if charge < &BigDecimal::zero() {
            return Err(DomainError::InvalidInput(
                "delivery charge must not be negative".to_string(),
            ));
        }
    }
    Ok(())
}

fn log_outcome<T>(result: &Result<T, DomainError>, describe: impl FnOnce(&T) -> String) {
    match result {
        Ok(value) => log::info!("{}", describe(value)),
        Err(e @ (DomainError::InvalidTransition { .. } | DomainError::InvalidState { .. })) => {
            log::warn!("{}", e)
        }
        Err(DomainError::Internal(e)) => log::error!("Order mutation failed: {}", e),
        Err(_) => {}
    }
}
