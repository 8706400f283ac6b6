use {super::*, api::Api};

/// Wires the gateway together and runs it until cancelled.
pub(crate) struct Engine {
    settings: Settings,
}

impl Engine {
    pub(crate) fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub(crate) async fn run(self, cancel_token: CancellationToken) -> Result {
        let settings = self.settings;
        let share_difficulty = settings.share_difficulty();

        let node: Arc<dyn Node> = Arc::new(RpcNode::new(settings.node_rpc().clone())?);

        let client_version = node
            .client_version()
            .await
            .with_context(|| format!("failed to reach node at {}", settings.node_rpc()))?;

        let dialect = NodeDialect::detect(&client_version);

        info!("Connected to {client_version}, expecting {dialect} work notifications");

        let verifier: Arc<dyn PowVerifier> =
            Arc::new(RpcVerifier::new(settings.verifier_rpc().clone())?);

        let store = Arc::new(
            Store::open(settings.db_path())
                .with_context(|| format!("failed to open store at {}", settings.db_path().display()))?,
        );

        let work_manager = Arc::new(WorkManager::new(share_difficulty));
        let collector = Arc::new(Collector::new(store.clone(), share_difficulty));

        info!(
            "Accepting shares at difficulty {}",
            Si(share_difficulty.as_f64(), "H")
        );

        let mut tasks = JoinSet::new();

        collector.clone().spawn(cancel_token.clone(), &mut tasks);

        let block_candidates = BlockSubmitter::new(
            node.clone(),
            store.clone(),
            share_difficulty,
            settings.harvest(),
        )
        .spawn(cancel_token.clone(), &mut tasks);

        Confirmer::new(
            node.clone(),
            store.clone(),
            settings.confirmations_required(),
        )
        .spawn(cancel_token.clone(), &mut tasks);

        let validator = Arc::new(Validator::new(
            work_manager.clone(),
            verifier,
            store.clone(),
            collector.clone(),
            block_candidates,
        ));

        let gateway = Arc::new(Gateway {
            password: settings.password().into(),
            login_timeout: settings.login_timeout(),
            work_manager: work_manager.clone(),
            validator,
            collector: collector.clone(),
        });

        let listener = Gateway::bind(settings.gateway_bind()).await?;

        gateway.spawn(listener, cancel_token.clone(), &mut tasks);

        http_server::spawn(
            "work notification",
            settings.notifications_bind(),
            ingest::router(work_manager.clone(), dialect),
            cancel_token.clone(),
            &mut tasks,
        )?;

        if let Some(api_bind) = settings.api_bind() {
            http_server::spawn(
                "api",
                api_bind,
                api::router(Api {
                    node,
                    store: store.clone(),
                    work_manager,
                    collector,
                }),
                cancel_token.clone(),
                &mut tasks,
            )?;
        }

        cancel_token.cancelled().await;

        info!("Waiting for {} tasks to complete...", tasks.len());
        while tasks.join_next().await.is_some() {}

        store.close().context("failed to close store")?;

        info!("All tasks stopped");

        Ok(())
    }
}
