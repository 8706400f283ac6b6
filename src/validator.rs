use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum Classification {
    #[display("valid")]
    Valid,
    #[display("stale")]
    Stale,
    #[display("invalid")]
    Invalid,
}

/// Classifies submitted shares, keeps the round's best share and hands full
/// block solutions to the block submitter.
pub(crate) struct Validator {
    work_manager: Arc<WorkManager>,
    verifier: Arc<dyn PowVerifier>,
    store: Arc<Store>,
    collector: Arc<Collector>,
    block_candidates: mpsc::Sender<BlockCandidate>,
}

impl Validator {
    pub(crate) fn new(
        work_manager: Arc<WorkManager>,
        verifier: Arc<dyn PowVerifier>,
        store: Arc<Store>,
        collector: Arc<Collector>,
        block_candidates: mpsc::Sender<BlockCandidate>,
    ) -> Self {
        Self {
            work_manager,
            verifier,
            store,
            collector,
            block_candidates,
        }
    }

    /// Validates a share and reports the outcome to the stats collector.
    /// Shares for unknown work are an error for the miner and count as
    /// invalid.
    pub(crate) async fn validate(
        &self,
        submission: &SubmitWork,
        worker: &str,
        ip: IpAddr,
    ) -> Result<Classification, StratumError> {
        let verdict = self.classify(submission, worker).await;

        self.collector
            .record_share(worker, ip, verdict.unwrap_or(Classification::Invalid));

        verdict
    }

    async fn classify(
        &self,
        submission: &SubmitWork,
        worker: &str,
    ) -> Result<Classification, StratumError> {
        let Some((work, stale)) = self.work_manager.lookup(&submission.header_hash) else {
            debug!(
                "Share from {worker} for unknown work {}",
                submission.header_hash
            );
            return Err(StratumError::WorkNotRequested);
        };

        let share_target = self.work_manager.share_target();

        let verification = match self
            .verifier
            .verify(&work, submission, share_target)
            .await
        {
            Ok(verification) => verification,
            Err(err) => {
                error!("Failed to verify share from {worker}: {err:#}");
                return Ok(Classification::Invalid);
            }
        };

        if !verification.valid {
            debug!(
                "Share from {worker} for {} misses the share target",
                submission.header_hash
            );
            return Ok(Classification::Invalid);
        }

        let actual_target = verification.actual_target;

        if actual_target <= work.target {
            info!(
                "Block solution from {worker} at height {} with difficulty {}",
                work.block_number.as_u64(),
                Si(actual_target.difficulty(), "H"),
            );

            self.work_manager.reset_best_share();

            let candidate = BlockCandidate {
                submission: *submission,
                work,
                worker: worker.into(),
            };

            if let Err(err) = self.block_candidates.try_send(candidate) {
                error!("Lost block candidate from {worker}: {err}");
            }
        } else if self.work_manager.update_best_share(actual_target) {
            let share = BestShare {
                worker_name: worker.into(),
                actual_share_difficulty: actual_target.difficulty(),
                timestamp: now(),
            };

            info!(
                "New best share from {worker} with difficulty {}",
                Si(share.actual_share_difficulty, "H"),
            );

            if let Err(err) = self.store.write_best_share(&share) {
                error!("Failed to persist best share from {worker}: {err}");
            }
        }

        Ok(if stale {
            Classification::Stale
        } else {
            Classification::Valid
        })
    }
}
