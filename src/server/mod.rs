// Server module entry point
// Accept loop, connection handling and shutdown signals

pub mod connection;
pub mod listener;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;

pub use listener::create_reusable_listener;

/// Accept connections until the shutdown token is cancelled, then give open
/// connections up to `read_timeout` seconds to finish
///
/// Must run inside a `LocalSet`; connections are spawned with `spawn_local`.
pub async fn run(listener: TcpListener, state: Arc<AppState>) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = state.shutdown.cancelled() => {
                logger::log_shutdown();
                break;
            }
        }
    }

    drop(listener);
    let deadline = tokio::time::Instant::now()
        + Duration::from_secs(state.config.performance.read_timeout);
    while active_connections.load(Ordering::SeqCst) > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Cancel `state.shutdown` on Ctrl+C or SIGTERM
pub fn spawn_signal_handler(state: &Arc<AppState>) {
    let shutdown = state.shutdown.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
                    if tokio::signal::ctrl_c().await.is_ok() {
                        shutdown.cancel();
                    }
                    return;
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }

        #[cfg(not(unix))]
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
            return;
        }

        shutdown.cancel();
    });
}
