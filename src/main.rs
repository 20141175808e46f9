use std::sync::Arc;

use anyhow::Context;

use order_notifier::config::NotifierConfig;
use order_notifier::mail::{MailTransport, SmtpMailTransport};
use order_notifier::pipeline::{MailDispatcher, NotificationPipeline};
use order_notifier::server::event_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = NotifierConfig::from_env().context("invalid configuration")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        require_fields = config.pipeline.require_fields,
        render_template = config.pipeline.render_template,
        from = %config.identity.from,
        to = %config.identity.to,
        "Order notifier starting"
    );

    // ── Transport (shared, read-only) ───────────────────────────────────
    let transport: Arc<dyn MailTransport> = Arc::new(SmtpMailTransport::new(&config.smtp)?);

    let dispatcher = MailDispatcher::new(transport, config.identity.clone());
    let pipeline = Arc::new(NotificationPipeline::new(config.pipeline, dispatcher));

    // ── HTTP ────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Listening for order events");

    axum::serve(listener, event_routes(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Order notifier stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
