use anyhow::Context;
use attendly::logging::{init_tracing, shutdown_tracer};
use attendly::metrics::{init_metrics, metrics_app};
use attendly::router::init_router;
use attendly::state::init_app_state;
use attendly_config::ServerConfig;
use dotenvy::dotenv;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let server_config = ServerConfig::from_env();

    if let Some(handle) = init_metrics()? {
        let metrics_listener = tokio::net::TcpListener::bind(&server_config.metrics_addr)
            .await
            .with_context(|| format!("binding metrics listener on {}", server_config.metrics_addr))?;
        info!(addr = %server_config.metrics_addr, "Metrics endpoint listening");

        tokio::spawn(async move {
            if let Err(e) = axum::serve(metrics_listener, metrics_app(handle)).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let state = init_app_state().await?;
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind(&server_config.addr)
        .await
        .with_context(|| format!("binding API listener on {}", server_config.addr))?;

    info!(addr = %server_config.addr, "🚀 Server running");
    info!("📚 Swagger UI available at /swagger-ui, Scalar UI at /scalar");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tracer().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
