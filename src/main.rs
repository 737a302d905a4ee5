use tracing::info;
use tracing_subscriber::EnvFilter;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::{ConfigLoader, ServerSettings};

/// Honours `RUST_LOG` when set and falls back to `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let settings = ServerSettings::from_env()?;
    let config = ConfigLoader::load(&settings.config_dir)?;
    info!(
        jurisdiction = %config.metadata().code,
        config_dir = %settings.config_dir.display(),
        "Configuration loaded"
    );

    let router = create_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    info!(bind_addr = %settings.bind_addr, "Payroll engine listening");
    axum::serve(listener, router).await?;

    Ok(())
}
