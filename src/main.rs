use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use forms_core::{CoreConfig, OutputSpool};

/// Environment variable naming the REST listen address.
const REST_ADDR_ENV: &str = "FORMS_REST_ADDR";
const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Main entry point for the forms service
///
/// Resolves configuration once, clears output left over from a previous run and serves the REST
/// API (with Swagger UI) until Ctrl-C.
///
/// # Environment Variables
/// - `FORMS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `FORMS_DATA_DIR`: Document store root (default: "forms_data")
/// - `FORMS_TEMPLATE_DIR`: Directory holding the PDF templates
/// - `FORMS_OUTPUT_DIR`: Spool directory for rendered PDFs (default: "<data>/output")
/// - `FORMS_OUTPUT_TTL_SECS`: Seconds before a spooled PDF is deleted (default: 30)
/// - `FORMS_MAX_BULK_ROWS`: Upper bound on rows per bulk request (default: 500)
///
/// # Errors
/// Returns an error if configuration is invalid, the address cannot be bound or the server
/// fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("forms=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(CoreConfig::from_env()?);
    tracing::info!(
        data_dir = %cfg.data_dir().display(),
        template_dir = %cfg.template_dir().display(),
        "++ Configuration resolved"
    );

    for kind in cfg.missing_templates() {
        tracing::warn!(
            "Template for {} not found at {}; requests for it will fail",
            kind,
            cfg.template_path(kind).display()
        );
    }

    OutputSpool::from_config(&cfg).sweep_expired();

    let addr = std::env::var(REST_ADDR_ENV).unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    tracing::info!("++ Starting forms REST on {}", addr);

    let app = router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
