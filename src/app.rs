use std::sync::Arc;
use tracing::info;
use upscaler::config::Config;
use upscaler::queue;
use upscaler::storage::StorageClient;
use upscaler::upscale::UpscaleClient;
use upscaler::worker::ImageProcessor;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Wire the gateways together and run the processing loop until a shutdown signal
pub async fn run(config: Config) -> Result<(), AnyError> {
    let queue = queue::from_config(&config.queue)?;
    let storage = Arc::new(StorageClient::from_config(&config.storage)?);
    let upscaler = Arc::new(UpscaleClient::new(&config.upscale_url, config.api_key.clone())?);

    info!(upscale_url = %upscaler.upscale_url(), "Upscale client ready");

    let processor = ImageProcessor::new(queue, upscaler, storage, config.worker_settings());

    // Dropping the loop future abandons any in-flight message
    tokio::select! {
        result = processor.run() => result?,
        _ = shutdown_signal() => {
            let metrics = processor.metrics().snapshot();
            info!(
                received = metrics.messages_received,
                published = metrics.images_published,
                "Image processor stopped"
            );
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
    info!("Shutdown signal received");
}
