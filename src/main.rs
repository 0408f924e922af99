use anyhow::Result;
use axum::Router;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use scentra_backoffice::{app_state::AppState, bootstrap, config, db, routes, swagger};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::create_pool(&config.database.url).await?;
    let listen_addr = config.server.listen_addr.clone();
    let state = AppState::new(db_pool, config);

    let routes = routes::admin::orders::routes_with_openapi(state.clone())
        .merge(routes::admin::topups::routes_with_openapi(state.clone()))
        .merge(routes::admin::wallets::routes_with_openapi(state.clone()))
        .merge(routes::admin::promos::routes_with_openapi(state.clone()))
        .merge(routes::admin::gifts::routes_with_openapi(state.clone()))
        .merge(routes::storefront::orders::routes_with_openapi(state.clone()))
        .merge(routes::storefront::wallet::routes_with_openapi(state.clone()))
        .merge(routes::storefront::gifts::routes_with_openapi(state.clone()));

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Scentra Back-office API")
        .version("1.0.0")
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi)?;

    let app = Router::new()
        .merge(routes)
        .merge(swagger_ui)
        .with_state(state);

    bootstrap::serve("Backoffice", app, &listen_addr).await?;
    Ok(())
}
