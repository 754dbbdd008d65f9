use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// A sellable configuration of a product. `None` dimensions are part of the
/// key: `(1, None, None)` and `(1, Some(3), None)` are different variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
}

impl VariantKey {
    pub fn new(product_id: i32, color_id: Option<i32>, size_id: Option<i32>) -> Self {
        Self {
            product_id,
            color_id,
            size_id,
        }
    }

    pub fn insufficient(&self, requested: i32, available: i32) -> DomainError {
        DomainError::InsufficientStock {
            product_id: self.product_id,
            color_id: self.color_id,
            size_id: self.size_id,
            requested,
            available,
        }
    }
}

impl std::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "product {}", self.product_id)?;
        if let Some(color) = self.color_id {
            write!(f, "/color {}", color)?;
        }
        if let Some(size) = self.size_id {
            write!(f, "/size {}", size)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRecord {
    pub id: i32,
    pub key: VariantKey,
    pub available_quantity: i32,
    pub reserved_quantity: i32,
    pub minimum_threshold: i32,
    pub maximum_capacity: Option<i32>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    pub fn total_quantity(&self) -> i32 {
        self.available_quantity + self.reserved_quantity
    }

    pub fn is_low_stock(&self) -> bool {
        self.available_quantity <= self.minimum_threshold
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.available_quantity == 0
    }
}

/// Counts supplied when a record is created.
#[derive(Debug, Clone, PartialEq)]
pub struct StockCounts {
    pub available_quantity: i32,
    pub reserved_quantity: i32,
    pub minimum_threshold: i32,
    pub maximum_capacity: Option<i32>,
    pub is_active: bool,
    pub notes: Option<String>,
}

impl Default for StockCounts {
    fn default() -> Self {
        Self {
            available_quantity: 0,
            reserved_quantity: 0,
            minimum_threshold: 0,
            maximum_capacity: None,
            is_active: true,
            notes: None,
        }
    }
}

impl StockCounts {
    pub fn validate(&self) -> Result<(), DomainError> {
        non_negative("available_quantity", self.available_quantity)?;
        non_negative("reserved_quantity", self.reserved_quantity)?;
        non_negative("minimum_threshold", self.minimum_threshold)?;
        if let Some(capacity) = self.maximum_capacity {
            if capacity < 1 {
                return Err(DomainError::InvalidInput(format!(
                    "maximum_capacity must be at least 1, got {capacity}"
                )));
            }
        }
        Ok(())
    }
}

/// Administrative overwrite of a record; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockPatch {
    pub available_quantity: Option<i32>,
    pub reserved_quantity: Option<i32>,
    pub minimum_threshold: Option<i32>,
    pub maximum_capacity: Option<i32>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

impl StockPatch {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(v) = self.available_quantity {
            non_negative("available_quantity", v)?;
        }
        if let Some(v) = self.reserved_quantity {
            non_negative("reserved_quantity", v)?;
        }
        if let Some(v) = self.minimum_threshold {
            non_negative("minimum_threshold", v)?;
        }
        if let Some(capacity) = self.maximum_capacity {
            if capacity < 1 {
                return Err(DomainError::InvalidInput(format!(
                    "maximum_capacity must be at least 1, got {capacity}"
                )));
            }
        }
        Ok(())
    }

    pub fn apply_to(&self, record: &mut InventoryRecord) {
        if let Some(v) = self.available_quantity {
            record.available_quantity = v;
        }
        if let Some(v) = self.reserved_quantity {
            record.reserved_quantity = v;
        }
        if let Some(v) = self.minimum_threshold {
            record.minimum_threshold = v;
        }
        if let Some(v) = self.maximum_capacity {
            record.maximum_capacity = Some(v);
        }
        if let Some(v) = self.is_active {
            record.is_active = v;
        }
        if let Some(v) = &self.notes {
            record.notes = Some(v.clone());
        }
    }
}

/// Which records count as low on stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowStockFilter {
    /// `available <= threshold`.
    AtMost(i32),
    /// `available == 0`, `available <= default`, or `available <= minimum_threshold`.
    Default(i32),
}

impl LowStockFilter {
    pub fn matches(&self, record: &InventoryRecord) -> bool {
        if !record.is_active {
            return false;
        }
        match *self {
            LowStockFilter::AtMost(threshold) => record.available_quantity <= threshold,
            LowStockFilter::Default(default) => {
                record.is_out_of_stock()
                    || record.available_quantity <= default
                    || record.is_low_stock()
            }
        }
    }
}

/// Audit trail: the reason is appended, never replacing earlier notes.
pub fn append_note(existing: Option<&str>, reason: Option<&str>) -> Option<String> {
    match reason {
        Some(reason) => Some(format!("{} | {}", existing.unwrap_or(""), reason)),
        None => existing.map(str::to_string),
    }
}

fn non_negative(field: &str, value: i32) -> Result<(), DomainError> {
    if value < 0 {
        return Err(DomainError::InvalidInput(format!(
            "{field} must not be negative, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(available: i32, threshold: i32) -> InventoryRecord {
        InventoryRecord {
            id: 1,
            key: VariantKey::new(1, Some(2), Some(3)),
            available_quantity: available,
            reserved_quantity: 4,
            minimum_threshold: threshold,
            maximum_capacity: None,
            is_active: true,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn derived_fields() {
        let r = record(5, 5);
        assert_eq!(r.total_quantity(), 9);
        assert!(r.is_low_stock());
        assert!(!r.is_out_of_stock());
        assert!(record(0, 0).is_out_of_stock());
        assert!(!record(6, 5).is_low_stock());
    }

    #[test]
    fn append_note_keeps_history() {
        assert_eq!(
            append_note(Some("initial"), Some("restock")).as_deref(),
            Some("initial | restock")
        );
        assert_eq!(append_note(None, Some("sale")).as_deref(), Some(" | sale"));
        assert_eq!(append_note(Some("kept"), None).as_deref(), Some("kept"));
        assert_eq!(append_note(None, None), None);
    }

    #[test]
    fn default_low_stock_filter_honours_record_threshold() {
        let filter = LowStockFilter::Default(10);
        assert!(filter.matches(&record(0, 0)));
        assert!(filter.matches(&record(10, 0)));
        assert!(filter.matches(&record(25, 30)));
        assert!(!filter.matches(&record(11, 5)));
    }

    #[test]
    fn explicit_threshold_ignores_inactive_records() {
        let mut r = record(2, 0);
        assert!(LowStockFilter::AtMost(3).matches(&r));
        r.is_active = false;
        assert!(!LowStockFilter::AtMost(3).matches(&r));
    }

    #[test]
    fn counts_validation_rejects_negatives_and_zero_capacity() {
        let bad = StockCounts {
            available_quantity: -1,
            ..StockCounts::default()
        };
        assert!(matches!(bad.validate(), Err(DomainError::InvalidInput(_))));

        let bad_cap = StockCounts {
            maximum_capacity: Some(0),
            ..StockCounts::default()
        };
        assert!(bad_cap.validate().is_err());
        assert!(StockCounts::default().validate().is_ok());
    }

    #[test]
    fn variant_key_display() {
        assert_eq!(VariantKey::new(4, None, Some(9)).to_string(), "product 4/size 9");
    }
}
