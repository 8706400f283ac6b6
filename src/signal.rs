use {super::*, tokio::signal::ctrl_c};

/// Returns a token cancelled on the first Ctrl-C or SIGTERM. Must be called
/// from within the runtime.
pub(crate) fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    tokio::spawn({
        let cancel_token = cancel_token.clone();

        async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let mut sigterm =
                    signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

                tokio::select! {
                    _ = ctrl_c() => info!("Received SIGINT, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }

            #[cfg(not(unix))]
            {
                ctrl_c().await.ok();
                info!("Received Ctrl-C, shutting down");
            }

            cancel_token.cancel();
        }
    });

    cancel_token
}
