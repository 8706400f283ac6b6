use super::*;

/// Re-checks recorded blocks once they are buried deep enough, settling
/// them as block, uncle or orphan.
pub(crate) struct Confirmer {
    node: Arc<dyn Node>,
    store: Arc<Store>,
    confirmations_required: u64,
}

impl Confirmer {
    pub(crate) fn new(node: Arc<dyn Node>, store: Arc<Store>, confirmations_required: u64) -> Self {
        Self {
            node,
            store,
            confirmations_required,
        }
    }

    pub(crate) fn spawn(self, cancel_token: CancellationToken, tasks: &mut JoinSet<()>) {
        info!("Spawning block confirmation task");

        tasks.spawn(async move {
            let mut ticker = interval(CONFIRMATION_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = self.confirm().await {
                            warn!("Block confirmation pass skipped: {err:#}");
                        }
                    }
                }
            }

            info!("Block confirmation task stopped");
        });
    }

    /// Runs one pass and returns the blocks confirmed in it.
    pub(crate) async fn confirm(&self) -> Result<Vec<BlockRecord>> {
        let pending = self
            .store
            .unconfirmed_blocks()
            .context("failed to read unconfirmed blocks")?;

        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let head = self.node.block_number().await?;

        let mut confirmed = Vec::new();

        for mut block in pending {
            if block.number.saturating_add(self.confirmations_required) > head {
                continue;
            }

            let canonical = self
                .node
                .block_by_number(block.number)
                .await?
                .with_context(|| format!("node has no block at height {}", block.number))?;

            if canonical.hash != block.hash {
                block.kind = match self.node.block_by_hash(block.hash).await? {
                    Some(_) => BlockKind::Uncle,
                    None => BlockKind::Orphan,
                };
            }

            block.confirmed = true;

            self.store.write_block(&block)?;

            info!(
                "Confirmed {} {} at height {}",
                block.kind, block.hash, block.number
            );

            confirmed.push(block);
        }

        Ok(confirmed)
    }
}
