use genai_audit::config::{StoreConfig, StoreLocation};
use genai_audit::store::DataContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = StoreConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_target(false)
        .init();

    eprintln!("GenAI Audit v{}", env!("CARGO_PKG_VERSION"));
    match &config.location {
        StoreLocation::File(path) => eprintln!("   Database: {}", path.display()),
        StoreLocation::Memory => eprintln!("   Database: (in-memory)"),
    }

    // ── Database ─────────────────────────────────────────────────────────
    let ctx = DataContext::from_config(&config).await?;
    let version = ctx.schema_version().await?;
    let counts = ctx.active_counts().await?;

    let tables: serde_json::Map<String, serde_json::Value> = counts
        .into_iter()
        .map(|(table, count)| (table.to_string(), count.into()))
        .collect();
    let summary = serde_json::json!({
        "schema_version": version,
        "active_rows": tables,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
