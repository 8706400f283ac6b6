use super::*;

/// A share that also meets the network target.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BlockCandidate {
    pub(crate) submission: SubmitWork,
    pub(crate) work: Work,
    pub(crate) worker: String,
}

/// Bounds for locating a submitted block on chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HarvestConfig {
    pub(crate) passes: u32,
    pub(crate) depth: u64,
    pub(crate) backoff: Duration,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            passes: 10,
            depth: 100,
            backoff: Duration::from_secs(5),
        }
    }
}

/// Submits block solutions to the node one at a time, then finds the
/// resulting block or uncle and records it. Failures are logged and the
/// candidate is dropped.
pub(crate) struct BlockSubmitter {
    node: Arc<dyn Node>,
    store: Arc<Store>,
    share_difficulty: Difficulty,
    harvest: HarvestConfig,
}

impl BlockSubmitter {
    pub(crate) fn new(
        node: Arc<dyn Node>,
        store: Arc<Store>,
        share_difficulty: Difficulty,
        harvest: HarvestConfig,
    ) -> Self {
        Self {
            node,
            store,
            share_difficulty,
            harvest,
        }
    }

    pub(crate) fn spawn(
        self,
        cancel_token: CancellationToken,
        tasks: &mut JoinSet<()>,
    ) -> mpsc::Sender<BlockCandidate> {
        let (tx, mut rx) = mpsc::channel(BLOCK_CANDIDATE_CAPACITY);

        info!("Spawning block submitter task");

        tasks.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => break,
                    candidate = rx.recv() => {
                        let Some(candidate) = candidate else {
                            break;
                        };

                        self.submit(candidate, &cancel_token).await;
                    }
                }
            }

            info!("Block submitter stopped");
        });

        tx
    }

    pub(crate) async fn submit(
        &self,
        candidate: BlockCandidate,
        cancel_token: &CancellationToken,
    ) -> Option<BlockRecord> {
        let BlockCandidate {
            submission,
            work,
            worker,
        } = candidate;

        match self.node.submit_work(&submission).await {
            Ok(true) => info!(
                "Node accepted block solution from {worker} for {} at height {}",
                work.header_hash,
                work.block_number.as_u64()
            ),
            Ok(false) => {
                error!(
                    "Node rejected block solution from {worker} for {}",
                    work.header_hash
                );
                return None;
            }
            Err(err) => {
                error!("Failed to submit block solution from {worker}: {err:#}");
                return None;
            }
        }

        let Some((block, kind)) = self.harvest(submission.nonce, cancel_token).await else {
            error!(
                "Could not locate block with nonce {} from {worker} after {} passes",
                submission.nonce, self.harvest.passes
            );
            return None;
        };

        match self.record(block, kind, worker) {
            Ok(record) => {
                info!(
                    "Recorded {} {} at height {} with luck {:.2}",
                    record.kind, record.hash, record.number, record.luck
                );
                Some(record)
            }
            Err(err) => {
                error!("Failed to record {kind} {}: {err:#}", block.hash);
                None
            }
        }
    }

    async fn harvest(
        &self,
        nonce: Nonce,
        cancel_token: &CancellationToken,
    ) -> Option<(Block, BlockKind)> {
        for pass in 1..=self.harvest.passes {
            match self.scan(nonce).await {
                Ok(Some(found)) => return Some(found),
                Ok(None) => debug!("Harvest pass {pass} did not find nonce {nonce}"),
                Err(err) => warn!("Harvest pass {pass} failed: {err:#}"),
            }

            if pass < self.harvest.passes {
                tokio::select! {
                    _ = cancel_token.cancelled() => return None,
                    _ = sleep(self.harvest.backoff) => {}
                }
            }
        }

        None
    }

    /// Walks down from the chain head matching `nonce` against each block
    /// and its uncles.
    async fn scan(&self, nonce: Nonce) -> Result<Option<(Block, BlockKind)>> {
        let head = self.node.block_number().await?;
        let lowest = head.saturating_sub(self.harvest.depth.saturating_sub(1));

        for number in (lowest..=head).rev() {
            let Some(block) = self.node.block_by_number(number).await? else {
                continue;
            };

            if block.nonce == nonce {
                return Ok(Some((block, BlockKind::Block)));
            }

            let uncles = self.node.uncle_count_by_block_number(number).await?;

            for index in 0..uncles {
                if let Some(uncle) = self
                    .node
                    .uncle_by_block_number_and_index(number, index)
                    .await?
                    && uncle.nonce == nonce
                {
                    return Ok(Some((uncle, BlockKind::Uncle)));
                }
            }
        }

        Ok(None)
    }

    fn record(&self, block: Block, kind: BlockKind, worker: String) -> Result<BlockRecord> {
        let round_time = self.store.round_time(now())?;
        let valid_shares = self.store.valid_shares_then_reset()?;

        let mined_hashes = valid_shares as f64 * self.share_difficulty.as_f64();

        let luck = if mined_hashes > 0.0 {
            block.difficulty as f64 / mined_hashes
        } else {
            0.0
        };

        let record = BlockRecord {
            hash: block.hash,
            number: block.number.as_u64(),
            kind,
            worker_name: worker,
            difficulty: block.difficulty,
            timestamp: block.timestamp,
            confirmed: false,
            mined_hashes,
            round_time,
            luck,
        };

        self.store.write_block(&record)?;

        Ok(record)
    }
}
