pub mod errors;
pub mod inventory;
pub mod order;
pub mod order_code;
pub mod ports;
pub mod pricing;
