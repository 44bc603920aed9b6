use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use http::HeaderValue;
use tracing::{info, warn};

use raffbot_common::traits::{RaffleNotifier, SubscriptionVerifier};
use raffbot_core::api::{self, ApiState};
use raffbot_core::platforms::{TelegramClient, UnconfiguredPlatform};
use raffbot_core::services::{JoinService, RaffleService};
use raffbot_core::tasks::spawn_raffle_closer;
use raffbot_core::{DefaultHttpClient, Error, RaffleStore};

use crate::ServeArgs;

pub async fn run_server(store_path: PathBuf, args: ServeArgs) -> Result<(), Error> {
    let addr: SocketAddr = args.addr.parse()?;
    let allowed_origin = match args.cors_origin.as_deref() {
        Some(origin) => Some(
            HeaderValue::from_str(origin)
                .map_err(|e| Error::Config(format!("invalid --cors-origin '{}': {}", origin, e)))?,
        ),
        None => None,
    };

    // 1) Load the store
    let store = Arc::new(RaffleStore::open(store_path).await?);

    // 2) Chat platform
    let verify_timeout = Duration::from_secs(args.verify_timeout_secs.max(1));
    let (verifier, notifier): (Arc<dyn SubscriptionVerifier>, Option<Arc<dyn RaffleNotifier>>) =
        match args.bot_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => {
                let http = Arc::new(DefaultHttpClient::new(verify_timeout)?);
                let telegram = Arc::new(TelegramClient::new(http, &args.api_base, token));
                info!("Telegram integration enabled via {}", args.api_base);
                let verifier: Arc<dyn SubscriptionVerifier> = telegram.clone();
                let notifier: Arc<dyn RaffleNotifier> = telegram;
                (verifier, Some(notifier))
            }
            None => {
                warn!("No bot token configured; raffles with required channels will refuse joins");
                let verifier: Arc<dyn SubscriptionVerifier> = Arc::new(UnconfiguredPlatform);
                (verifier, None)
            }
        };

    // 3) Services
    let raffles = Arc::new(RaffleService::new(store.clone()));
    let joins = Arc::new(JoinService::new(store, verifier).with_verify_timeout(verify_timeout));

    // 4) Background closer
    let closer = if args.close_interval_secs > 0 {
        Some(spawn_raffle_closer(
            raffles.clone(),
            notifier,
            Duration::from_secs(args.close_interval_secs),
        ))
    } else {
        info!("Raffle closer disabled.");
        None
    };

    // 5) HTTP
    let app = api::router(ApiState::new(raffles, joins), allowed_origin);

    let handle = Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    info!("raffbot API listening on http://{}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    if let Some(closer) = closer {
        closer.abort();
    }
    info!("Server shut down.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
}
