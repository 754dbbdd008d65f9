use checkout_service::config::Config;
use checkout_service::{build_server, create_pool, run_migrations};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;
    let pool = create_pool(&config.database_url, config.db_pool_size).map_err(startup_error)?;
    run_migrations(&pool).map_err(startup_error)?;

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(&config, pool)?.await
}

fn startup_error(e: impl std::fmt::Display) -> std::io::Error {
    log::error!("Startup failed: {}", e);
    std::io::Error::other(e.to_string())
}
