pub mod inventory;
pub mod orders;
pub mod pricing;

use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::errors::AppError;

/// Money arrives as a decimal string, e.g. "9.99".
pub(crate) fn parse_money(field: &str, value: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(value.trim())
        .map_err(|e| AppError::BadRequest(format!("invalid {field} '{value}': {e}")))
}

pub(crate) fn parse_money_opt(
    field: &str,
    value: Option<&str>,
) -> Result<Option<BigDecimal>, AppError> {
    value.map(|v| parse_money(field, v)).transpose()
}
