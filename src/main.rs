//! Lost-and-found backend server binary.

use anyhow::{Context, Result};
use dotenv::dotenv;
use lostnfound_backend::{
    api::{self, AppState},
    auth::JwtHandler,
    store::Store,
};
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let db_path = env::var("DB_PATH").unwrap_or_else(|_| "lostnfound.db".to_string());
    let jwt_secret = env::var("JWT_SECRET")
        .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());

    let store = Arc::new(Store::new(&db_path)?);
    info!("Database initialized at: {}", db_path);

    let jwt = Arc::new(JwtHandler::new(jwt_secret));
    let state = AppState::new(store, jwt);

    let app = api::router(state);

    let addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lostnfound_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
