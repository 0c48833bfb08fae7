//! # Houseboard Binary
//!
//! The entry point that assembles the application from the configured store
//! and the compiled-in plugins.

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use hb_api::{configure_routes, middleware, AppState};
use hb_core::config::{ForumConfig, StoreBackend};
use hb_core::traits::ForumRepo;

#[cfg(feature = "auth-tripcode")]
use hb_auth_tripcode::Sha256Tripcodes;

#[cfg(not(feature = "auth-tripcode"))]
compile_error!("houseboard needs an identity plugin: enable the `auth-tripcode` feature");

#[cfg(feature = "db-sqlite")]
use hb_db_sqlite::SqliteForumRepo;

#[cfg(feature = "db-postgres")]
use hb_db_postgres::PostgresForumRepo;

/// Opens the store named by the database URL, applying the schema.
async fn open_repo(config: &ForumConfig) -> anyhow::Result<Box<dyn ForumRepo>> {
    match config.backend {
        #[cfg(feature = "db-sqlite")]
        StoreBackend::Sqlite => Ok(Box::new(
            SqliteForumRepo::new(&config.database_url, config.max_connections).await?,
        )),
        #[cfg(feature = "db-postgres")]
        StoreBackend::Postgres => Ok(Box::new(
            PostgresForumRepo::new(&config.database_url, config.max_connections).await?,
        )),
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("{other:?} support is not compiled into this build"),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ForumConfig::from_env().context("invalid configuration")?;

    // 1. Initialize the store selected by DATABASE_URL
    let repo = open_repo(&config)
        .await
        .with_context(|| format!("failed to open {:?} store", config.backend))?;

    // 2. Wrap in AppState (dynamic dispatch over the store and identity ports)
    let state = web::Data::new(AppState {
        repo,
        identity: Box::new(Sha256Tripcodes::new()),
    });

    log::info!("Houseboard starting on http://{}:{}", config.host, config.port);

    let static_dir = config.static_dir.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::security_headers())
            .wrap(middleware::cors_policy())
            .wrap(middleware::standard_middleware())
            .service(Files::new("/static", static_dir.clone()))
            .configure(configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
