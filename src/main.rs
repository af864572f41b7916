use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use customs_docs::api::{configure_routes, json_config, ApiState};
use customs_docs::core::AppConfig;
use customs_docs::{metrics, templates};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    tracing::info!("Starting customs document service");

    // Initialize Prometheus metrics
    prometheus::default_registry()
        .register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))?;
    metrics::init();

    // Load configuration
    let config = AppConfig::from_env().context("invalid configuration")?;
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("cannot create {}", config.output_dir.display()))?;

    let checked = templates::layout::validate_blanks(&config.blanks_dir)
        .context("form layouts do not match the blanks")?;
    tracing::info!("Validated {} form layout(s) in {}", checked.len(), config.blanks_dir.display());

    // Initialize application state
    let state = web::Data::new(ApiState::new(config)?);
    let host = state.config.host.clone();
    let port = state.config.port;
    let json_limit = state.config.max_json_bytes;

    tracing::info!("Starting server on {}:{}", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(json_config(json_limit))
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
