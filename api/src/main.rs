mod auth;
mod dto;
mod error;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use engine::config;
use state::AppState;
use store::{establish_connection_pool, run_migrations, PgStore};

#[derive(Debug, StructOpt)]
#[structopt(name = "exchange", about = "Spot-exchange order-matching engine")]
struct Opt {
    /// Run pending migrations then exit, instead of serving.
    #[structopt(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    let app_config = config::load_config().unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.logging.level)),
        )
        .init();

    let database_url = config::database_url();
    let pool = establish_connection_pool(&database_url, app_config.database.pool_size)?;

    if opt.migrate {
        tracing::info!("running pending migrations");
        run_migrations(&pool)?;
        return Ok(());
    }

    let store = Arc::new(PgStore::new(pool));
    let state = Arc::new(AppState::new(store, app_config.auth.token_ttl_seconds));
    let router = routes::build_router(state);

    let address = format!("{}:{}", app_config.server.host, app_config.server.port);
    tracing::info!("listening on {address}");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
