use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    Standard,
    Bulk,
    Variant,
    Vip,
    Wholesale,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Standard => "STANDARD",
            RuleType::Bulk => "BULK",
            RuleType::Variant => "VARIANT",
            RuleType::Vip => "VIP",
            RuleType::Wholesale => "WHOLESALE",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STANDARD" => Ok(RuleType::Standard),
            "BULK" => Ok(RuleType::Bulk),
            "VARIANT" => Ok(RuleType::Variant),
            "VIP" => Ok(RuleType::Vip),
            "WHOLESALE" => Ok(RuleType::Wholesale),
            other => Err(DomainError::InvalidInput(format!(
                "unknown pricing rule type '{other}'"
            ))),
        }
    }
}

/// Read-only view of a catalog product, as far as pricing cares.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRef {
    pub id: i32,
    pub title: String,
    pub base_price: BigDecimal,
    pub discounted_price: Option<BigDecimal>,
}

impl ProductRef {
    pub fn list_price(&self) -> &BigDecimal {
        self.discounted_price.as_ref().unwrap_or(&self.base_price)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingRule {
    pub id: i32,
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub unit_price: BigDecimal,
    pub discount_percentage: Option<BigDecimal>,
    pub rule_name: Option<String>,
    pub rule_type: RuleType,
    pub is_active: bool,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PricingRule {
    pub fn covers(&self, quantity: i32) -> bool {
        self.is_active
            && self.min_quantity <= quantity
            && self.max_quantity.map_or(true, |max| max >= quantity)
    }
}

/// A rule as submitted for creation, before it has an id.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRuleDraft {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub unit_price: BigDecimal,
    pub discount_percentage: Option<BigDecimal>,
    pub rule_name: Option<String>,
    pub rule_type: RuleType,
    pub is_active: bool,
    pub priority: i32,
}

impl PricingRuleDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_terms(
            self.min_quantity,
            self.max_quantity,
            &self.unit_price,
            self.discount_percentage.as_ref(),
            self.priority,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingRulePatch {
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
    pub unit_price: Option<BigDecimal>,
    pub discount_percentage: Option<BigDecimal>,
    pub rule_name: Option<String>,
    pub rule_type: Option<RuleType>,
    pub is_active: Option<bool>,
    pub priority: Option<i32>,
}

impl PricingRulePatch {
    /// Applies the patch to a copy of `rule` and validates the result.
    pub fn merge(&self, rule: &PricingRule) -> Result<PricingRule, DomainError> {
        let mut merged = rule.clone();
        if let Some(v) = self.min_quantity {
            merged.min_quantity = v;
        }
        if let Some(v) = self.max_quantity {
            merged.max_quantity = Some(v);
        }
        if let Some(v) = &self.unit_price {
            merged.unit_price = v.clone();
        }
        if let Some(v) = &self.discount_percentage {
            merged.discount_percentage = Some(v.clone());
        }
        if let Some(v) = &self.rule_name {
            merged.rule_name = Some(v.clone());
        }
        if let Some(v) = self.rule_type {
            merged.rule_type = v;
        }
        if let Some(v) = self.is_active {
            merged.is_active = v;
        }
        if let Some(v) = self.priority {
            merged.priority = v;
        }
        validate_terms(
            merged.min_quantity,
            merged.max_quantity,
            &merged.unit_price,
            merged.discount_percentage.as_ref(),
            merged.priority,
        )?;
        Ok(merged)
    }
}

fn validate_terms(
    min_quantity: i32,
    max_quantity: Option<i32>,
    unit_price: &BigDecimal,
    discount_percentage: Option<&BigDecimal>,
    priority: i32,
) -> Result<(), DomainError> {
    if min_quantity < 1 {
        return Err(DomainError::InvalidInput(format!(
            "min_quantity must be at least 1, got {min_quantity}"
        )));
    }
    if let Some(max) = max_quantity {
        if max < min_quantity {
            return Err(DomainError::InvalidInput(format!(
                "max_quantity {max} is below min_quantity {min_quantity}"
            )));
        }
    }
    if unit_price < &BigDecimal::zero() {
        return Err(DomainError::InvalidInput(format!(
            "unit_price must not be negative, got {unit_price}"
        )));
    }
    if let Some(pct) = discount_percentage {
        if pct < &BigDecimal::zero() || pct > &BigDecimal::from(100) {
            return Err(DomainError::InvalidInput(format!(
                "discount_percentage must be between 0 and 100, got {pct}"
            )));
        }
    }
    if priority < 1 {
        return Err(DomainError::InvalidInput(format!(
            "priority must be at least 1, got {priority}"
        )));
    }
    Ok(())
}

/// Rounds an amount to cents, the scale money columns are stored at.
pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

/// Picks the winning rule among `rules` for `quantity`: highest priority,
/// then highest `min_quantity`, then lowest id.
pub fn select_rule(rules: &[PricingRule], quantity: i32) -> Option<&PricingRule> {
    rules.iter().filter(|r| r.covers(quantity)).min_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.min_quantity.cmp(&a.min_quantity))
            .then(a.id.cmp(&b.id))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRule {
    pub id: i32,
    pub rule_name: Option<String>,
    pub rule_type: String,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceResult {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    /// Unit price after the rule's discount; what a buyer pays per unit.
    pub effective_unit_price: BigDecimal,
    pub total_price: BigDecimal,
    pub discount_percentage: Option<BigDecimal>,
    pub discount_amount: BigDecimal,
    pub applied_rule: AppliedRule,
}

impl PriceResult {
    pub fn from_rule(
        rule: &PricingRule,
        color_id: Option<i32>,
        size_id: Option<i32>,
        quantity: i32,
    ) -> Self {
        let qty = BigDecimal::from(quantity);
        let unit_price = rule.unit_price.clone();
        let effective_unit_price = match &rule.discount_percentage {
            Some(pct) => round_money(&(&unit_price - &unit_price * pct / BigDecimal::from(100))),
            None => round_money(&unit_price),
        };
        // Totals follow the rounded unit price so they match the stored items.
        let total_price = &effective_unit_price * &qty;
        let discount_amount = &unit_price * &qty - &total_price;
        Self {
            product_id: rule.product_id,
            color_id,
            size_id,
            quantity,
            unit_price,
            effective_unit_price,
            total_price,
            discount_percentage: rule.discount_percentage.clone(),
            discount_amount,
            applied_rule: AppliedRule {
                id: rule.id,
                rule_name: rule.rule_name.clone(),
                rule_type: rule.rule_type.to_string(),
                priority: rule.priority,
            },
        }
    }

    pub fn fallback(
        product: &ProductRef,
        color_id: Option<i32>,
        size_id: Option<i32>,
        quantity: i32,
    ) -> Self {
        let unit_price = product.list_price().clone();
        let effective_unit_price = round_money(&unit_price);
        let total_price = &effective_unit_price * BigDecimal::from(quantity);
        Self {
            product_id: product.id,
            color_id,
            size_id,
            quantity,
            unit_price,
            effective_unit_price,
            total_price,
            discount_percentage: None,
            discount_amount: BigDecimal::zero(),
            applied_rule: AppliedRule {
                id: 0,
                rule_name: Some("Base Price".to_string()),
                rule_type: "FALLBACK".to_string(),
                priority: 0,
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.applied_rule.id == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: i32, min: i32, max: Option<i32>, price: i64, priority: i32) -> PricingRule {
        PricingRule {
            id,
            product_id: 1,
            color_id: None,
            size_id: None,
            min_quantity: min,
            max_quantity: max,
            unit_price: BigDecimal::from(price),
            discount_percentage: None,
            rule_name: None,
            rule_type: RuleType::Standard,
            is_active: true,
            priority,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn larger_min_quantity_wins_at_equal_priority() {
        let rules = vec![rule(1, 1, None, 10, 1), rule(2, 5, None, 8, 1)];
        assert_eq!(select_rule(&rules, 5).map(|r| r.id), Some(2));
        assert_eq!(select_rule(&rules, 4).map(|r| r.id), Some(1));
    }

    #[test]
    fn priority_beats_min_quantity() {
        let rules = vec![rule(1, 1, None, 10, 3), rule(2, 5, None, 8, 1)];
        assert_eq!(select_rule(&rules, 6).map(|r| r.id), Some(1));
    }

    #[test]
    fn max_quantity_is_inclusive_and_inactive_rules_are_skipped() {
        let mut capped = rule(1, 1, Some(3), 10, 1);
        assert!(capped.covers(3));
        assert!(!capped.covers(4));
        capped.is_active = false;
        assert!(select_rule(&[capped], 2).is_none());
    }

    #[test]
    fn discount_is_taken_off_the_gross() {
        let mut r = rule(4, 1, None, 20, 1);
        r.discount_percentage = Some(BigDecimal::from(25));
        let result = PriceResult::from_rule(&r, Some(1), None, 3);
        assert_eq!(result.discount_amount, BigDecimal::from(15));
        assert_eq!(result.total_price, BigDecimal::from(45));
        assert_eq!(result.effective_unit_price, BigDecimal::from(15));
        assert_eq!(result.applied_rule.rule_type, "STANDARD");
    }

    #[test]
    fn fractional_discount_is_rounded_to_cents() {
        let mut r = rule(5, 1, None, 10, 1);
        r.discount_percentage = Some("33.33".parse().unwrap());
        let result = PriceResult::from_rule(&r, None, None, 3);
        assert_eq!(result.effective_unit_price, "6.67".parse::<BigDecimal>().unwrap());
        assert_eq!(result.total_price, "20.01".parse::<BigDecimal>().unwrap());
        assert_eq!(result.discount_amount, "9.99".parse::<BigDecimal>().unwrap());
        assert_eq!(round_money(&"2.345".parse().unwrap()), "2.35".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn fallback_prefers_discounted_price() {
        let product = ProductRef {
            id: 9,
            title: "Mug".to_string(),
            base_price: BigDecimal::from(12),
            discounted_price: Some(BigDecimal::from(10)),
        };
        let result = PriceResult::fallback(&product, None, None, 2);
        assert!(result.is_fallback());
        assert_eq!(result.applied_rule.rule_type, "FALLBACK");
        assert_eq!(result.applied_rule.priority, 0);
        assert_eq!(result.total_price, BigDecimal::from(20));
    }

    #[test]
    fn patch_merge_revalidates() {
        let base = rule(1, 2, Some(10), 5, 1);
        let patch = PricingRulePatch {
            max_quantity: Some(1),
            ..PricingRulePatch::default()
        };
        assert!(matches!(patch.merge(&base), Err(DomainError::InvalidInput(_))));

        let ok = PricingRulePatch {
            unit_price: Some(BigDecimal::from(4)),
            ..PricingRulePatch::default()
        };
        assert_eq!(ok.merge(&base).map(|r| r.unit_price).ok(), Some(BigDecimal::from(4)));
    }

    #[test]
    fn rule_type_parses_case_insensitively() {
        assert_eq!("wholesale".parse::<RuleType>().ok(), Some(RuleType::Wholesale));
        assert!("GOLD".parse::<RuleType>().is_err());
    }
}
