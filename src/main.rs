use axum::middleware;
use axum::Router;
use cashboard::config::Config;
use cashboard::csrf::{csrf_middleware, CsrfToken};
use cashboard::db::{create_pool, migrations};
use cashboard::handlers;
use cashboard::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(version = cashboard::VERSION, "Starting cashboard on {}", config.address());

    let db = create_pool(&config.database_path).expect("Failed to create database pool");

    {
        let conn = db.get().expect("Failed to get database connection");
        migrations::run_migrations(&conn, &config.migrations_path)
            .expect("Failed to run migrations");
    }

    let csrf_token = CsrfToken::generate();
    tracing::info!("Generated CSRF token for session");

    let state = AppState {
        db,
        config: Arc::new(config.clone()),
        csrf_token: csrf_token.clone(),
    };

    let app = Router::new()
        .merge(handlers::routes())
        .layer(middleware::from_fn(move |req, next| {
            let token = csrf_token.clone();
            csrf_middleware(token, req, next)
        }))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = TcpListener::bind(config.address())
        .await
        .expect("Failed to bind address");

    tracing::info!("Listening on http://{}", config.address());

    axum::serve(listener, app).await.expect("Server error");
}
