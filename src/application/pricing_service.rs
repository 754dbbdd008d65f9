use bigdecimal::BigDecimal;

use crate::domain::errors::DomainError;
use crate::domain::inventory::VariantKey;
use crate::domain::ports::{Store, UnitOfWork};
use crate::domain::pricing::{
    select_rule, PriceResult, PricingRule, PricingRuleDraft, PricingRulePatch, RuleType,
};

use super::inventory_service::ensure_dimensions_exist;
use super::BulkOutcome;

/// A quantity band of a per-variant price list.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTier {
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub unit_price: BigDecimal,
    pub discount_percentage: Option<BigDecimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantTiers {
    pub color_id: i32,
    pub size_id: i32,
    pub tiers: Vec<PricingTier>,
}

/// What a failed bulk entry refers to: a whole variant (unknown color or
/// size) or one of its tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct TierRef {
    pub color_id: i32,
    pub size_id: i32,
    pub tier: Option<PricingTier>,
}

pub struct PricingService<S> {
    store: S,
}

impl<S: Store> PricingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn create_rule(&self, draft: PricingRuleDraft) -> Result<PricingRule, DomainError> {
        let rule = self.store.transaction(|uow| create_rule_in(uow, &draft))?;
        log::info!(
            "Created {} pricing rule {} for product {} (min {}, price {})",
            rule.rule_type,
            rule.id,
            rule.product_id,
            rule.min_quantity,
            rule.unit_price
        );
        Ok(rule)
    }

    /// Every tier becomes a VARIANT rule with priority 1. A variant whose
    /// color or size is unknown is rejected as a whole; a bad tier only
    /// rejects itself.
    pub fn bulk_create_rules(
        &self,
        product_id: i32,
        variants: Vec<VariantTiers>,
    ) -> Result<BulkOutcome<PricingRule, TierRef>, DomainError> {
        self.store.transaction(|uow| {
            uow.find_product(product_id)?
                .ok_or_else(|| DomainError::not_found("Product", product_id))
        })?;

        let mut outcome = BulkOutcome::new();
        for variant in variants {
            let key = VariantKey::new(product_id, Some(variant.color_id), Some(variant.size_id));
            let dimensions = self
                .store
                .transaction(|uow| ensure_dimensions_exist(uow, &key));
            if let Err(error) = dimensions {
                outcome.record(
                    TierRef {
                        color_id: variant.color_id,
                        size_id: variant.size_id,
                        tier: None,
                    },
                    Err(error),
                );
                continue;
            }

            for tier in variant.tiers {
                let draft = PricingRuleDraft {
                    product_id,
                    color_id: key.color_id,
                    size_id: key.size_id,
                    min_quantity: tier.min_quantity,
                    max_quantity: tier.max_quantity,
                    unit_price: tier.unit_price.clone(),
                    discount_percentage: tier.discount_percentage.clone(),
                    rule_name: None,
                    rule_type: RuleType::Variant,
                    is_active: true,
                    priority: 1,
                };
                let result = self.store.transaction(|uow| create_rule_in(uow, &draft));
                outcome.record(
                    TierRef {
                        color_id: variant.color_id,
                        size_id: variant.size_id,
                        tier: Some(tier),
                    },
                    result,
                );
            }
        }
        log::info!(
            "Bulk pricing import for product {}: {} created, {} rejected",
            product_id,
            outcome.created.len(),
            outcome.errors.len()
        );
        Ok(outcome)
    }

    pub fn list_rules(&self, product_id: i32) -> Result<Vec<PricingRule>, DomainError> {
        self.store.transaction(|uow| {
            uow.find_product(product_id)?
                .ok_or_else(|| DomainError::not_found("Product", product_id))?;
            uow.list_rules(product_id)
        })
    }

    pub fn list_rules_by_type(
        &self,
        product_id: i32,
        rule_type: RuleType,
    ) -> Result<Vec<PricingRule>, DomainError> {
        self.store
            .transaction(|uow| uow.list_rules_by_type(product_id, rule_type))
    }

    pub fn update_rule(&self, id: i32, patch: PricingRulePatch) -> Result<PricingRule, DomainError> {
        self.store.transaction(|uow| {
            let current = uow
                .find_rule(id)?
                .ok_or_else(|| DomainError::not_found("Pricing rule", id))?;
            let merged = patch.merge(&current)?;
            if merged.is_active {
                let key = VariantKey::new(merged.product_id, merged.color_id, merged.size_id);
                if uow
                    .find_active_tier(&key, merged.min_quantity, Some(id))?
                    .is_some()
                {
                    return Err(duplicate_tier(&key, merged.min_quantity));
                }
            }
            uow.save_rule(&merged)
        })
    }

    pub fn delete_rule(&self, id: i32) -> Result<(), DomainError> {
        self.store.transaction(|uow| {
            if uow.delete_rule(id)? {
                Ok(())
            } else {
                Err(DomainError::not_found("Pricing rule", id))
            }
        })?;
        log::info!("Deleted pricing rule {}", id);
        Ok(())
    }

    pub fn calculate_price(&self, key: VariantKey, quantity: i32) -> Result<PriceResult, DomainError> {
        self.store
            .transaction(|uow| resolve_price_in(uow, &key, quantity))
    }
}

pub(crate) fn create_rule_in(
    uow: &mut dyn UnitOfWork,
    draft: &PricingRuleDraft,
) -> Result<PricingRule, DomainError> {
    draft.validate()?;
    uow.find_product(draft.product_id)?
        .ok_or_else(|| DomainError::not_found("Product", draft.product_id))?;
    let key = VariantKey::new(draft.product_id, draft.color_id, draft.size_id);
    ensure_dimensions_exist(uow, &key)?;
    if draft.is_active
        && uow
            .find_active_tier(&key, draft.min_quantity, None)?
            .is_some()
    {
        return Err(duplicate_tier(&key, draft.min_quantity));
    }
    uow.insert_rule(draft)
}

/// Highest priority wins, then the larger minimum quantity. Without a
/// matching rule the product's own price applies.
pub(crate) fn resolve_price_in(
    uow: &mut dyn UnitOfWork,
    key: &VariantKey,
    quantity: i32,
) -> Result<PriceResult, DomainError> {
    if quantity < 1 {
        return Err(DomainError::InvalidInput(format!(
            "quantity must be at least 1, got {quantity}"
        )));
    }
    let product = uow
        .find_product(key.product_id)?
        .ok_or_else(|| DomainError::not_found("Product", key.product_id))?;
    let candidates = uow.applicable_rules(key.product_id, quantity)?;
    let result = match select_rule(&candidates, quantity) {
        Some(rule) => {
            log::debug!(
                "Rule {} (priority {}, min {}) prices {} x{}",
                rule.id,
                rule.priority,
                rule.min_quantity,
                key,
                quantity
            );
            PriceResult::from_rule(rule, key.color_id, key.size_id, quantity)
        }
        None => PriceResult::fallback(&product, key.color_id, key.size_id, quantity),
    };
    Ok(result)
}

fn duplicate_tier(key: &VariantKey, min_quantity: i32) -> DomainError {
    DomainError::Conflict(format!(
        "pricing rule already exists for {key} with min_quantity {min_quantity}"
    ))
}
