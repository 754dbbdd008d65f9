pub mod checkout;
pub mod inventory_service;
pub mod order_service;
pub mod pricing_service;

use crate::domain::errors::DomainError;

/// Result of a bulk import: one bad entry never blocks the rest.
#[derive(Debug)]
pub struct BulkOutcome<T, I> {
    pub created: Vec<T>,
    pub errors: Vec<BulkFailure<I>>,
}

#[derive(Debug)]
pub struct BulkFailure<I> {
    pub input: I,
    pub error: DomainError,
}

impl<T, I> BulkOutcome<T, I> {
    fn new() -> Self {
        Self {
            created: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn record(&mut self, input: I, result: Result<T, DomainError>) {
        match result {
            Ok(item) => self.created.push(item),
            Err(error) => {
                log::warn!("Bulk entry rejected: {}", error);
                self.errors.push(BulkFailure { input, error })
            }
        }
    }
}
