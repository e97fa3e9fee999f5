use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinebook_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = cinebook_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    cinebook_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    let cancel = CancellationToken::new();
    let loop_cancel = cancel.clone();
    let poll = cinebook_worker::poll_interval_from_env();
    let worker = tokio::spawn(async move {
        cinebook_worker::run(pool, poll, loop_cancel).await;
    });

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl-C handler");
    tracing::info!("Received SIGINT (Ctrl-C), shutting down");

    cancel.cancel();
    let _ = worker.await;
    tracing::info!("Graceful shutdown complete");
}
