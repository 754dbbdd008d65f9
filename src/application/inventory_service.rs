use crate::config::LedgerPolicy;
use crate::domain::errors::DomainError;
use crate::domain::inventory::{
    append_note, InventoryRecord, LowStockFilter, StockCounts, StockPatch, VariantKey,
};
use crate::domain::ports::{Store, UnitOfWork};

use super::BulkOutcome;

/// One entry of a bulk stock import for a product.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantStockInput {
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub counts: StockCounts,
}

pub struct InventoryService<S> {
    store: S,
    policy: LedgerPolicy,
}

impl<S: Store> InventoryService<S> {
    pub fn new(store: S, policy: LedgerPolicy) -> Self {
        Self { store, policy }
    }

    /// Exact-key lookup; a null color or size only matches a null column.
    pub fn get_variant_stock(&self, key: VariantKey) -> Result<InventoryRecord, DomainError> {
        self.store.transaction(|uow| {
            uow.find_stock(&key)?
                .ok_or_else(|| DomainError::not_found("Inventory record", key))
        })
    }

    pub fn get_stock_by_id(&self, id: i32) -> Result<InventoryRecord, DomainError> {
        self.store.transaction(|uow| {
            uow.find_stock_by_id(id)?
                .ok_or_else(|| DomainError::not_found("Inventory record", id))
        })
    }

    pub fn create_variant_stock(
        &self,
        key: VariantKey,
        counts: StockCounts,
    ) -> Result<InventoryRecord, DomainError> {
        let record = self
            .store
            .transaction(|uow| create_variant_stock_in(uow, &key, &counts))?;
        log::info!(
            "Created inventory record {} for {} with {} available",
            record.id,
            key,
            record.available_quantity
        );
        Ok(record)
    }

    /// Each variant is created in its own transaction; failures are
    /// collected next to the successes.
    pub fn bulk_create_variant_stock(
        &self,
        product_id: i32,
        variants: Vec<VariantStockInput>,
    ) -> Result<BulkOutcome<InventoryRecord, VariantStockInput>, DomainError> {
        self.store.transaction(|uow| {
            uow.find_product(product_id)?
                .ok_or_else(|| DomainError::not_found("Product", product_id))
        })?;

        let mut outcome = BulkOutcome::new();
        for variant in variants {
            let key = VariantKey::new(product_id, variant.color_id, variant.size_id);
            let result = self
                .store
                .transaction(|uow| create_variant_stock_in(uow, &key, &variant.counts));
            outcome.record(variant, result);
        }
        log::info!(
            "Bulk stock import for product {}: {} created, {} rejected",
            product_id,
            outcome.created.len(),
            outcome.errors.len()
        );
        Ok(outcome)
    }

    /// Positive `delta` restocks, negative sells. `reason` is appended to
    /// the record's notes.
    pub fn adjust_stock(
        &self,
        key: VariantKey,
        delta: i32,
        reason: Option<String>,
    ) -> Result<InventoryRecord, DomainError> {
        let record = self
            .store
            .transaction(|uow| adjust_stock_in(uow, &key, delta, reason.as_deref()))
            .inspect_err(|e| {
                if matches!(e, DomainError::InsufficientStock { .. }) {
                    log::warn!("Stock adjustment of {} on {} rejected: {}", delta, key, e);
                }
            })?;
        log::info!(
            "Adjusted {} by {} (now {} available)",
            key,
            delta,
            record.available_quantity
        );
        Ok(record)
    }

    pub fn update_variant_stock(
        &self,
        id: i32,
        patch: StockPatch,
    ) -> Result<InventoryRecord, DomainError> {
        patch.validate()?;
        self.store.transaction(|uow| {
            uow.find_stock_by_id(id)?
                .ok_or_else(|| DomainError::not_found("Inventory record", id))?;
            uow.update_stock(id, &patch)
        })
    }

    pub fn delete_variant_stock(&self, id: i32) -> Result<(), DomainError> {
        self.store.transaction(|uow| {
            if uow.delete_stock(id)? {
                Ok(())
            } else {
                Err(DomainError::not_found("Inventory record", id))
            }
        })?;
        log::info!("Deleted inventory record {}", id);
        Ok(())
    }

    pub fn list_variant_stock(&self, product_id: i32) -> Result<Vec<InventoryRecord>, DomainError> {
        self.store.transaction(|uow| {
            uow.find_product(product_id)?
                .ok_or_else(|| DomainError::not_found("Product", product_id))?;
            uow.list_stock_for_product(product_id)
        })
    }

    /// Without a threshold, the configured default and each record's own
    /// `minimum_threshold` both count.
    pub fn list_low_stock(&self, threshold: Option<i32>) -> Result<Vec<InventoryRecord>, DomainError> {
        let filter = match threshold {
            Some(t) if t < 0 => {
                return Err(DomainError::InvalidInput(format!(
                    "threshold must not be negative, got {t}"
                )))
            }
            Some(t) => LowStockFilter::AtMost(t),
            None => LowStockFilter::Default(self.policy.low_stock_default_threshold),
        };
        self.store.transaction(|uow| uow.list_low_stock(filter))
    }

    pub fn list_out_of_stock(&self) -> Result<Vec<InventoryRecord>, DomainError> {
        self.list_low_stock(Some(0))
    }
}

pub(crate) fn create_variant_stock_in(
    uow: &mut dyn UnitOfWork,
    key: &VariantKey,
    counts: &StockCounts,
) -> Result<InventoryRecord, DomainError> {
    counts.validate()?;
    uow.find_product(key.product_id)?
        .ok_or_else(|| DomainError::not_found("Product", key.product_id))?;
    ensure_dimensions_exist(uow, key)?;
    if uow.find_stock(key)?.is_some() {
        return Err(DomainError::Conflict(format!(
            "inventory record already exists for {key}"
        )));
    }
    uow.insert_stock(key, counts)
}

/// Applies `delta` under a row lock, failing without a write when the
/// result would go below zero.
pub(crate) fn adjust_stock_in(
    uow: &mut dyn UnitOfWork,
    key: &VariantKey,
    delta: i32,
    reason: Option<&str>,
) -> Result<InventoryRecord, DomainError> {
    let record = uow
        .lock_stock(key)?
        .ok_or_else(|| DomainError::not_found("Inventory record", key))?;
    let remaining = record
        .available_quantity
        .checked_add(delta)
        .ok_or_else(|| DomainError::InvalidInput(format!("stock delta {delta} overflows")))?;
    if remaining < 0 {
        return Err(key.insufficient(delta.saturating_neg(), record.available_quantity));
    }
    let notes = append_note(record.notes.as_deref(), reason);
    uow.apply_stock_delta(record.id, delta, notes)?
        .ok_or_else(|| key.insufficient(delta.saturating_neg(), record.available_quantity))
}

pub(crate) fn ensure_dimensions_exist(
    uow: &mut dyn UnitOfWork,
    key: &VariantKey,
) -> Result<(), DomainError> {
    if let Some(color_id) = key.color_id {
        if !uow.color_exists(color_id)? {
            return Err(DomainError::not_found("Color", color_id));
        }
    }
    if let Some(size_id) = key.size_id {
        if !uow.size_exists(size_id)? {
            return Err(DomainError::not_found("Size", size_id));
        }
    }
    Ok(())
}
