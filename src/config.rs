use std::env;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::domain::order_code::DEFAULT_MAX_ATTEMPTS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Stock rules that are a matter of shop policy rather than data.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerPolicy {
    /// Used by the low-stock listing when the caller gives no threshold.
    pub low_stock_default_threshold: i32,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            low_stock_default_threshold: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutPolicy {
    pub order_code_max_attempts: u32,
    /// Largest accepted gap between a client-quoted and a resolved price.
    pub price_tolerance: BigDecimal,
    pub restock_on_cancel: bool,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            order_code_max_attempts: DEFAULT_MAX_ATTEMPTS,
            price_tolerance: BigDecimal::new(1.into(), 2),
            restock_on_cancel: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_pool_size: u32,
    pub ledger: LedgerPolicy,
    pub checkout: CheckoutPolicy,
}

impl Config {
    /// Reads the process environment; call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let ledger_defaults = LedgerPolicy::default();
        let checkout_defaults = CheckoutPolicy::default();

        let low_stock_default_threshold: i32 = parse_or(
            &lookup,
            "LOW_STOCK_DEFAULT_THRESHOLD",
            ledger_defaults.low_stock_default_threshold,
        )?;
        if low_stock_default_threshold < 0 {
            return Err(ConfigError::Invalid {
                name: "LOW_STOCK_DEFAULT_THRESHOLD",
                value: low_stock_default_threshold.to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        let order_code_max_attempts: u32 = parse_or(
            &lookup,
            "ORDER_CODE_MAX_ATTEMPTS",
            checkout_defaults.order_code_max_attempts,
        )?;
        if order_code_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "ORDER_CODE_MAX_ATTEMPTS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let price_tolerance: BigDecimal =
            parse_or(&lookup, "PRICE_TOLERANCE", checkout_defaults.price_tolerance)?;
        if price_tolerance < BigDecimal::from(0) {
            return Err(ConfigError::Invalid {
                name: "PRICE_TOLERANCE",
                value: price_tolerance.to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            db_pool_size: parse_or(&lookup, "DB_POOL_SIZE", 10)?,
            ledger: LedgerPolicy {
                low_stock_default_threshold,
            },
            checkout: CheckoutPolicy {
                order_code_max_attempts,
                price_tolerance,
                restock_on_cancel: parse_or(
                    &lookup,
                    "RESTOCK_ON_CANCEL",
                    checkout_defaults.restock_on_cancel,
                )?,
            },
        })
    }
}

fn parse_or<L, T>(lookup: &L, name: &'static str, default: T) -> Result<T, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
