use {super::*, tokio::net::TcpListener};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Shared state for every miner connection, plus the stratum accept loop.
pub(crate) struct Gateway {
    pub(crate) password: String,
    pub(crate) login_timeout: Duration,
    pub(crate) work_manager: Arc<WorkManager>,
    pub(crate) validator: Arc<Validator>,
    pub(crate) collector: Arc<Collector>,
}

impl Gateway {
    pub(crate) async fn bind(address: SocketAddr) -> Result<TcpListener> {
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("failed to bind stratum gateway to {address}"))?;

        info!(
            "Stratum gateway listening for miners on {}",
            listener.local_addr()?
        );

        Ok(listener)
    }

    pub(crate) fn spawn(
        self: Arc<Self>,
        listener: TcpListener,
        cancel_token: CancellationToken,
        tasks: &mut JoinSet<()>,
    ) {
        info!("Spawning stratum gateway task");

        tasks.spawn(async move {
            let mut connections = JoinSet::new();
            let listener = &listener;

            loop {
                tokio::select! {
                    (stream, peer) = accept_with_backoff(move || listener.accept()) => {
                        debug!("Accepted miner connection from {peer}");

                        let (reader, writer) = stream.into_split();

                        let connection = Connection::new(
                            self.clone(),
                            peer,
                            reader,
                            writer,
                            cancel_token.child_token(),
                        );

                        connections.spawn(async move {
                            if let Err(err) = connection.serve().await {
                                warn!("Connection with {peer} failed: {err:#}");
                            }
                        });
                    }
                    Some(_) = connections.join_next(), if !connections.is_empty() => {}
                    _ = cancel_token.cancelled() => {
                        info!("Shutting down stratum gateway");
                        break;
                    }
                }
            }

            info!("Waiting for {} connections to close...", connections.len());
            while connections.join_next().await.is_some() {}
            info!("Stratum gateway stopped");
        });
    }
}

/// Retries failed accepts after a pause, so running out of file descriptors
/// does not spin the loop.
async fn accept_with_backoff<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(err) => {
                warn!("Failed to accept miner connection: {err}");
                sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}
