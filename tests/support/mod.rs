#![allow(dead_code)]

use std::str::FromStr;

use bigdecimal::BigDecimal;
use checkout_service::application::checkout::{CheckoutLine, CheckoutRequest, CheckoutService};
use checkout_service::application::inventory_service::InventoryService;
use checkout_service::application::order_service::OrderService;
use checkout_service::application::pricing_service::PricingService;
use checkout_service::config::{CheckoutPolicy, LedgerPolicy};
use checkout_service::domain::inventory::{InventoryRecord, StockCounts, VariantKey};
use checkout_service::domain::order::ShippingDetails;
use checkout_service::domain::ports::BuyerIdentity;
use checkout_service::domain::pricing::{PricingRuleDraft, ProductRef, RuleType};
use checkout_service::infrastructure::memory::MemoryStore;

pub const TOTE: i32 = 1;
pub const MUG: i32 = 2;
pub const RED: i32 = 1;
pub const BLUE: i32 = 2;
pub const SMALL: i32 = 1;
pub const LARGE: i32 = 2;
pub const INSIDE_CITY: &str = "Inside City";
pub const CLOSED_AREA: &str = "Closed Area";

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("decimal literal")
}

/// Catalog: a tote at 50 and a mug at 20 (discounted to 15), two colors,
/// two sizes, one active and one inactive delivery area.
pub struct World {
    pub store: MemoryStore,
    pub inventory: InventoryService<MemoryStore>,
    pub pricing: PricingService<MemoryStore>,
    pub checkout: CheckoutService<MemoryStore>,
    pub orders: OrderService<MemoryStore>,
}

impl World {
    pub fn new() -> Self {
        Self::with_policy(CheckoutPolicy::default())
    }

    pub fn with_policy(policy: CheckoutPolicy) -> Self {
        let store = MemoryStore::new();
        store
            .add_product(ProductRef {
                id: TOTE,
                title: "Canvas tote".to_string(),
                base_price: dec("50"),
                discounted_price: None,
            })
            .expect("seed tote");
        store
            .add_product(ProductRef {
                id: MUG,
                title: "Enamel mug".to_string(),
                base_price: dec("20"),
                discounted_price: Some(dec("15")),
            })
            .expect("seed mug");
        for id in [RED, BLUE] {
            store.add_color(id).expect("seed color");
        }
        for id in [SMALL, LARGE] {
            store.add_size(id).expect("seed size");
        }
        store
            .add_delivery_area(INSIDE_CITY, dec("10"), true)
            .expect("seed area");
        store
            .add_delivery_area(CLOSED_AREA, dec("30"), false)
            .expect("seed area");

        Self {
            inventory: InventoryService::new(store.clone(), LedgerPolicy::default()),
            pricing: PricingService::new(store.clone()),
            checkout: CheckoutService::new(store.clone(), policy.clone()),
            orders: OrderService::new(store.clone(), policy),
            store,
        }
    }

    pub fn stock(&self, key: VariantKey, available: i32) -> InventoryRecord {
        self.inventory
            .create_variant_stock(
                key,
                StockCounts {
                    available_quantity: available,
                    ..StockCounts::default()
                },
            )
            .expect("create stock")
    }

    pub fn available(&self, key: VariantKey) -> i32 {
        self.inventory
            .get_variant_stock(key)
            .expect("stock exists")
            .available_quantity
    }

    pub fn rule(&self, min: i32, max: Option<i32>, price: &str, priority: i32) -> i32 {
        self.pricing
            .create_rule(PricingRuleDraft {
                product_id: TOTE,
                color_id: None,
                size_id: None,
                min_quantity: min,
                max_quantity: max,
                unit_price: dec(price),
                discount_percentage: None,
                rule_name: Some(format!("from {min}")),
                rule_type: RuleType::Bulk,
                is_active: true,
                priority,
            })
            .expect("create rule")
            .id
    }
}

pub fn red_small_tote() -> VariantKey {
    VariantKey::new(TOTE, Some(RED), Some(SMALL))
}

pub fn line(key: VariantKey, quantity: i32, price: &str) -> CheckoutLine {
    CheckoutLine {
        key,
        quantity,
        price: dec(price),
    }
}

pub fn shipping() -> ShippingDetails {
    ShippingDetails {
        full_name: "Ada Lovelace".to_string(),
        address1: "12 Analytical Row".to_string(),
        city: "London".to_string(),
        country: "GB".to_string(),
        phone: Some("+4400".to_string()),
        ..ShippingDetails::default()
    }
}

pub fn request(phone: &str, items: Vec<CheckoutLine>, delivery: Option<&str>) -> CheckoutRequest {
    CheckoutRequest {
        buyer: BuyerIdentity {
            name: Some("Ada".to_string()),
            phone: Some(phone.to_string()),
            email: None,
        },
        items,
        shipping: shipping(),
        delivery_charge: delivery.map(dec),
        total: None,
    }
}
