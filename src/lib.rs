pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::checkout::CheckoutService;
use application::inventory_service::InventoryService;
use application::order_service::OrderService;
use application::pricing_service::PricingService;
use config::Config;
use errors::AppError;
use handlers::{inventory, orders, pricing};
use infrastructure::pg_store::PgStore;
use openapi::ApiDoc;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migrations", applied.len());
    Ok(())
}

/// Build and return an actix-web `Server` bound to the configured host and
/// port.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(config: &Config, pool: DbPool) -> std::io::Result<actix_web::dev::Server> {
    let store = PgStore::new(pool);
    let checkout = web::Data::new(CheckoutService::new(store.clone(), config.checkout.clone()));
    let order_service = web::Data::new(OrderService::new(store.clone(), config.checkout.clone()));
    let pricing_service = web::Data::new(PricingService::new(store.clone()));
    let inventory_service = web::Data::new(InventoryService::new(store, config.ledger.clone()));

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(checkout.clone())
            .app_data(order_service.clone())
            .app_data(pricing_service.clone())
            .app_data(inventory_service.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .service(
                web::scope("/orders")
                    .route("", web::get().to(orders::list_orders))
                    .route("/checkout", web::post().to(orders::checkout))
                    .route("/my", web::get().to(orders::orders_by_user))
                    .route("/shipping/{shippingId}", web::put().to(orders::update_shipping))
                    .route(
                        "/items/{itemId}/quantity",
                        web::put().to(orders::update_item_quantity),
                    )
                    .route("/{id}", web::get().to(orders::get_order))
                    .route("/{id}/events", web::get().to(orders::order_events))
                    .route("/{id}/status", web::put().to(orders::update_status))
                    .route("/{id}/cancel", web::put().to(orders::cancel_order)),
            )
            .service(
                web::scope("/pricing")
                    .route("/rules", web::post().to(pricing::create_rule))
                    .route("/rules/{id}", web::patch().to(pricing::update_rule))
                    .route("/rules/{id}", web::delete().to(pricing::delete_rule))
                    .route("/calculate", web::post().to(pricing::calculate_price))
                    .route(
                        "/product/{productId}/rules",
                        web::get().to(pricing::list_rules),
                    )
                    .route(
                        "/product/{productId}/rules/bulk",
                        web::post().to(pricing::bulk_create_rules),
                    )
                    .route(
                        "/product/{productId}/rules/type/{ruleType}",
                        web::get().to(pricing::list_rules_by_type),
                    ),
            )
            .service(
                web::scope("/inventory")
                    .route("", web::post().to(inventory::create_stock))
                    .route("/check", web::post().to(inventory::check_stock))
                    .route("/adjust", web::patch().to(inventory::adjust_stock))
                    .route("/low-stock", web::get().to(inventory::low_stock))
                    .route("/out-of-stock", web::get().to(inventory::out_of_stock))
                    .route(
                        "/product/{productId}",
                        web::get().to(inventory::list_for_product),
                    )
                    .route(
                        "/product/{productId}/bulk",
                        web::post().to(inventory::bulk_create_stock),
                    )
                    .route("/{id}", web::get().to(inventory::get_stock))
                    .route("/{id}", web::patch().to(inventory::update_stock))
                    .route("/{id}", web::delete().to(inventory::delete_stock)),
            )
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
