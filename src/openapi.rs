use utoipa::OpenApi;

use crate::handlers::{inventory, orders, pricing};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Checkout service",
        description = "Checkout, order mutation, tiered pricing and variant inventory"
    ),
    paths(
        orders::checkout,
        orders::orders_by_user,
        orders::get_order,
        orders::list_orders,
        orders::order_events,
        orders::update_status,
        orders::cancel_order,
        orders::update_shipping,
        orders::update_item_quantity,
        pricing::create_rule,
        pricing::bulk_create_rules,
        pricing::calculate_price,
        pricing::list_rules,
        pricing::list_rules_by_type,
        pricing::update_rule,
        pricing::delete_rule,
        inventory::create_stock,
        inventory::bulk_create_stock,
        inventory::list_for_product,
        inventory::check_stock,
        inventory::adjust_stock,
        inventory::low_stock,
        inventory::out_of_stock,
        inventory::get_stock,
        inventory::update_stock,
        inventory::delete_stock,
    ),
    tags(
        (name = "orders", description = "Checkout and order lifecycle"),
        (name = "pricing", description = "Quantity-tiered pricing rules"),
        (name = "inventory", description = "Per-variant stock ledger"),
    )
)]
pub struct ApiDoc;
