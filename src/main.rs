use authstore::{AuthDbConfig, AuthStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "authstore=debug".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AuthDbConfig::from_env()?;
    if let Err(e) = AuthStore::ensure(&config).await {
        tracing::error!(error = %e, source = ?std::error::Error::source(&e), "auth store bootstrap failed");
        return Err(e.into());
    }

    tracing::info!(
        database = %config.database,
        collection = %config.collection,
        "auth store bootstrapped"
    );
    Ok(())
}
