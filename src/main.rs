use portfolio_api::config::Config;
use portfolio_api::state::AppState;
use portfolio_api::storage::Storage;
use portfolio_api::{db, handlers};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("portfolio_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let db = db::establish_connection(&config.database_path)
        .expect("Failed to establish database connection");
    match &config.admin_password {
        Some(password) => {
            db::seed_admin(&db, &config.admin_name, &config.admin_email, password)
                .await
                .expect("Failed to seed admin user");
        }
        None => tracing::warn!("ADMIN_PASSWORD not set, skipping admin seeding"),
    }

    let storage = Storage::new(&config.storage_root);
    storage
        .ensure_layout()
        .await
        .expect("Failed to create storage directories");

    let app = handlers::router(AppState { db, storage });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!(addr = %config.bind_addr, "portfolio API listening");
    axum::serve(listener, app).await.expect("Server error");
}
