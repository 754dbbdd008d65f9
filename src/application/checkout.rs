use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};
use chrono::{Datelike, Utc};
use serde_json::json;

use crate::config::CheckoutPolicy;
use crate::domain::errors::DomainError;
use crate::domain::inventory::{InventoryRecord, VariantKey};
use crate::domain::order::{NewOrder, NewOrderItem, OrderAggregate, OrderEventType, ShippingDetails};
use crate::domain::order_code::{generate_unique, random_code};
use crate::domain::ports::{BuyerIdentity, Store, UnitOfWork};
use crate::domain::pricing::round_money;

use super::pricing_service::resolve_price_in;

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutLine {
    pub key: VariantKey,
    pub quantity: i32,
    /// Unit price the client displayed; checked against the resolved price.
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub buyer: BuyerIdentity,
    pub items: Vec<CheckoutLine>,
    pub shipping: ShippingDetails,
    pub delivery_charge: Option<BigDecimal>,
    pub total: Option<BigDecimal>,
}

impl CheckoutRequest {
    fn validate(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::InvalidInput(
                "checkout needs at least one item".to_string(),
            ));
        }
        for line in &self.items {
            if line.quantity < 1 {
                return Err(DomainError::InvalidInput(format!(
                    "quantity for {} must be at least 1, got {}",
                    line.key, line.quantity
                )));
            }
            if line.price < BigDecimal::zero() {
                return Err(DomainError::InvalidInput(format!(
                    "price for {} must not be negative",
                    line.key
                )));
            }
        }
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        if blank(&self.buyer.phone) && blank(&self.buyer.email) {
            return Err(DomainError::InvalidInput(
                "buyer needs a phone number or an email".to_string(),
            ));
        }
        if let Some(charge) = &self.delivery_charge {
            if charge < &BigDecimal::zero() {
                return Err(DomainError::InvalidInput(
                    "delivery charge must not be negative".to_string(),
                ));
            }
        }
        self.shipping.validate()
    }

    /// Requested quantity per variant, in key order so locks are always
    /// taken in the same sequence.
    fn demand(&self) -> Result<BTreeMap<VariantKey, i32>, DomainError> {
        let mut demand = BTreeMap::new();
        for line in &self.items {
            let total: &mut i32 = demand.entry(line.key).or_insert(0);
            *total = total.checked_add(line.quantity).ok_or_else(|| {
                DomainError::InvalidInput(format!("quantity for {} overflows", line.key))
            })?;
        }
        Ok(demand)
    }
}

pub struct CheckoutService<S> {
    store: S,
    policy: CheckoutPolicy,
}

impl<S: Store> CheckoutService<S> {
    pub fn new(store: S, policy: CheckoutPolicy) -> Self {
        Self { store, policy }
    }

    /// Places an order atomically: stock for every line is checked before
    /// any is taken, prices and delivery are resolved server-side, and the
    /// order, items, shipping record and outbox event are written together.
    pub fn checkout(&self, request: CheckoutRequest) -> Result<OrderAggregate, DomainError> {
        request.validate()?;
        let demand = request.demand()?;

        let result = self
            .store
            .transaction(|uow| self.checkout_in(uow, &request, &demand));

        match &result {
            Ok(order) => log::info!(
                "Order {} placed by user {}: {} items, total {}",
                order.order.order_code,
                order.order.user_id,
                order.items.len(),
                order.order.total
            ),
            Err(
                e @ (DomainError::InsufficientStock { .. } | DomainError::PriceMismatch { .. }),
            ) => log::warn!("Checkout rejected: {}", e),
            Err(DomainError::Internal(e)) => log::error!("Checkout failed: {}", e),
            Err(_) => {}
        }
        result
    }

    fn checkout_in(
        &self,
        uow: &mut dyn UnitOfWork,
        request: &CheckoutRequest,
        demand: &BTreeMap<VariantKey, i32>,
    ) -> Result<OrderAggregate, DomainError> {
        let user = uow.find_or_create_user(&request.buyer)?;

        let mut reserved: Vec<(InventoryRecord, i32)> = Vec::with_capacity(demand.len());
        for (key, &requested) in demand {
            let record = uow
                .lock_stock(key)?
                .filter(|r| r.is_active)
                .ok_or_else(|| key.insufficient(requested, 0))?;
            if record.available_quantity < requested {
                return Err(key.insufficient(requested, record.available_quantity));
            }
            reserved.push((record, requested));
        }

        let mut items = Vec::with_capacity(request.items.len());
        let mut subtotal = BigDecimal::zero();
        for line in &request.items {
            let resolved = resolve_price_in(uow, &line.key, line.quantity)?;
            let price = resolved.effective_unit_price;
            self.check_quote(line.key.to_string(), &price, &line.price)?;
            subtotal += &price * BigDecimal::from(line.quantity);
            items.push(NewOrderItem {
                key: line.key,
                quantity: line.quantity,
                price,
            });
        }

        let delivery_charge = round_money(&self.resolve_delivery_charge(uow, request)?);
        let total = &subtotal + &delivery_charge;
        if let Some(quoted) = &request.total {
            self.check_quote("order total".to_string(), &total, quoted)?;
        }

        for (record, requested) in &reserved {
            uow.apply_stock_delta(record.id, -requested, record.notes.clone())?
                .ok_or_else(|| record.key.insufficient(*requested, record.available_quantity))?;
        }

        let year = Utc::now().year();
        let mut rng = rand::thread_rng();
        let order_code = generate_unique(
            self.policy.order_code_max_attempts,
            || random_code(&mut rng, year),
            |code| uow.order_code_exists(code),
        )?;

        let order_id = uow.insert_order(&NewOrder {
            order_code,
            user_id: user.id,
            total,
            delivery_charge,
            items,
            shipping: request.shipping.clone(),
        })?;

        let aggregate = uow
            .load_aggregate(order_id)?
            .ok_or_else(|| DomainError::Internal(format!("order {order_id} vanished after insert")))?;

        let lines: Vec<serde_json::Value> = aggregate
            .items
            .iter()
            .map(|i| {
                json!({
                    "product_id": i.key.product_id,
                    "color_id": i.key.color_id,
                    "size_id": i.key.size_id,
                    "quantity": i.quantity,
                    "price": i.price.to_string(),
                })
            })
            .collect();
        uow.append_event(
            &aggregate.order,
            OrderEventType::OrderPlaced.as_str(),
            json!({
                "order_id": aggregate.order.id,
                "order_code": aggregate.order.order_code,
                "user_id": aggregate.order.user_id,
                "status": aggregate.order.status.as_str(),
                "total": aggregate.order.total.to_string(),
                "delivery_charge": aggregate.order.delivery_charge.to_string(),
                "items": lines,
            }),
        )?;

        Ok(aggregate)
    }

    /// An active delivery area's charge is authoritative; otherwise the
    /// caller's figure stands.
    fn resolve_delivery_charge(
        &self,
        uow: &mut dyn UnitOfWork,
        request: &CheckoutRequest,
    ) -> Result<BigDecimal, DomainError> {
        let quoted = request.delivery_charge.clone();
        let area = match request.shipping.delivery_area.as_deref() {
            Some(name) if !name.trim().is_empty() => uow.find_delivery_area(name.trim())?,
            _ => None,
        };
        match area {
            Some(area) if !area.is_active => Err(DomainError::InvalidInput(format!(
                "delivery area '{}' is not active",
                area.area_name
            ))),
            Some(area) => {
                if let Some(quoted) = &quoted {
                    self.check_quote("delivery charge".to_string(), &area.charge, quoted)?;
                }
                Ok(area.charge)
            }
            None => Ok(quoted.unwrap_or_else(BigDecimal::zero)),
        }
    }

    fn check_quote(
        &self,
        subject: String,
        expected: &BigDecimal,
        supplied: &BigDecimal,
    ) -> Result<(), DomainError> {
        if (expected - supplied).abs() > self.policy.price_tolerance {
            return Err(DomainError::PriceMismatch {
                subject,
                expected: expected.clone(),
                supplied: supplied.clone(),
            });
        }
        Ok(())
    }
}
