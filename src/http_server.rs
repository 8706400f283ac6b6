use {super::*, axum_server::Handle};

pub(crate) mod error;

/// Binds `address` and serves `router` until `cancel_token` fires. Returns
/// the bound address, which differs from `address` when binding port 0.
pub(crate) fn spawn(
    name: &'static str,
    address: SocketAddr,
    router: Router,
    cancel_token: CancellationToken,
    tasks: &mut JoinSet<()>,
) -> Result<SocketAddr> {
    info!("Spawning {name} http server task");

    let listener = bind_listener(name, address)?;
    let local_addr = listener.local_addr()?;
    let server = axum_server::from_tcp(listener)?;

    let handle = Handle::new();

    let shutdown_handle = handle.clone();
    tasks.spawn(async move {
        cancel_token.cancelled().await;
        info!("Shutting down {name} http server");
        shutdown_handle.shutdown();
    });

    tasks.spawn(async move {
        let served = server
            .handle(handle)
            .serve(router.into_make_service())
            .await;

        if let Err(err) = served {
            error!("{name} http server error: {err}");
        }
    });

    Ok(local_addr)
}

fn bind_listener(name: &str, address: SocketAddr) -> Result<std::net::TcpListener> {
    let listener = std::net::TcpListener::bind(address)
        .with_context(|| format!("failed to bind {name} http server to {address}"))?;

    listener.set_nonblocking(true)?;

    info!("{name} http server listening on http://{}", listener.local_addr()?);

    Ok(listener)
}
