use bigdecimal::BigDecimal;
use thiserror::Error;

use super::order::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "Insufficient stock for product {product_id} (color {color_id:?}, size {size_id:?}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: i32,
        color_id: Option<i32>,
        size_id: Option<i32>,
        requested: i32,
        available: i32,
    },

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Cannot {operation} while order is {status}")]
    InvalidState {
        status: OrderStatus,
        operation: &'static str,
    },

    #[error("Could not generate a unique order code after {attempts} attempts")]
    CodeGenerationExhausted { attempts: u32 },

    #[error("Price mismatch for {subject}: expected {expected}, got {supplied}")]
    PriceMismatch {
        subject: String,
        expected: BigDecimal,
        supplied: BigDecimal,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::NotFound { .. } => "NotFound",
            DomainError::Conflict(_) => "Conflict",
            DomainError::InvalidInput(_) => "InvalidInput",
            DomainError::InsufficientStock { .. } => "InsufficientStock",
            DomainError::InvalidTransition { .. } => "InvalidTransition",
            DomainError::InvalidState { .. } => "InvalidState",
            DomainError::CodeGenerationExhausted { .. } => "CodeGenerationExhausted",
            DomainError::PriceMismatch { .. } => "PriceMismatch",
            DomainError::Internal(_) => "Internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_names_product_and_counts() {
        let err = DomainError::InsufficientStock {
            product_id: 7,
            color_id: Some(2),
            size_id: None,
            requested: 5,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("product 7"));
        assert!(msg.contains("requested 5"));
        assert!(msg.contains("available 3"));
    }

    #[test]
    fn not_found_display() {
        assert_eq!(
            DomainError::not_found("Order", 12).to_string(),
            "Order 12 not found"
        );
    }

    #[test]
    fn invalid_transition_display_uses_status_names() {
        let err = DomainError::InvalidTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "Cannot move order from SHIPPED to CANCELLED");
    }
}
