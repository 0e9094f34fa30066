//! Node assembly: notifier pool, coordinator, HTTP server.

use std::sync::Arc;

use tracing::{info, warn};

use rsvgrid_api::{ApiState, InMemoryTicketStore, build_router};
use rsvgrid_coord::Coordinator;
use rsvgrid_notify::HttpNotifier;

use crate::config::NodeConfig;

/// Run one node until Ctrl-C.
pub async fn run_node(config: NodeConfig) -> anyhow::Result<()> {
    let peers = config.peer_directory()?;
    let notify = config.notifier_config()?;

    info!(
        node_id = %config.node_id,
        peers = peers.len(),
        "rsvgrid node starting"
    );
    for peer in peers.iter() {
        info!(peer = %peer.id, url = %peer.url, "peer configured");
    }
    for train in &config.trains {
        info!(train_id = %train.id, name = %train.name, seats = train.total_seats, "train configured");
    }

    // ── Coordination ───────────────────────────────────────────

    let (notifier, notifier_handle) = HttpNotifier::spawn(notify.clone());
    let coordinator = Arc::new(Coordinator::new(peers, Arc::new(notifier)));

    let state = ApiState {
        coordinator,
        tickets: Arc::new(InMemoryTicketStore::with_trains(config.trains.clone())),
    };

    // ── API server ─────────────────────────────────────────────

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(addr = %listener.local_addr()?, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last notifier handle; workers now flush what is
    // queued and exit.
    notifier_handle.drain(notify.timeout).await;

    info!(node_id = %config.node_id, "rsvgrid node stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "failed to install Ctrl-C handler, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
