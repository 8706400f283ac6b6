use super::*;

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PendingStat {
    pub(crate) valid: u64,
    pub(crate) stale: u64,
    pub(crate) invalid: u64,
    pub(crate) reported_hashrate: HashRate,
    pub(crate) ip: Option<IpAddr>,
}

/// Aggregates over the retained stats, as served by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatsSummary {
    pub(crate) average_effective_hashrate: f64,
    pub(crate) valid_share_count: u64,
    pub(crate) stale_share_count: u64,
    pub(crate) invalid_share_count: u64,
    pub(crate) latest: Option<TotalStat>,
    pub(crate) workers: Vec<Stat>,
}

/// Per-worker share counters, rolled up into the store every
/// `STATS_INTERVAL`.
#[derive(Debug)]
pub(crate) struct Collector {
    store: Arc<Store>,
    share_difficulty: Difficulty,
    pending: Mutex<HashMap<String, PendingStat>>,
}

impl Collector {
    pub(crate) fn new(store: Arc<Store>, share_difficulty: Difficulty) -> Self {
        Self {
            store,
            share_difficulty,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn record_share(&self, worker: &str, ip: IpAddr, classification: Classification) {
        {
            let mut pending = self.pending.lock();
            let stat = pending.entry(worker.to_string()).or_default();

            match classification {
                Classification::Valid => stat.valid += 1,
                Classification::Stale => stat.stale += 1,
                Classification::Invalid => stat.invalid += 1,
            }

            stat.ip = Some(ip);
        }

        if classification == Classification::Valid
            && let Err(err) = self.store.incr_valid_shares()
        {
            error!("Failed to count valid share from {worker}: {err}");
        }
    }

    pub(crate) fn record_hashrate(&self, worker: &str, ip: IpAddr, hashrate: HashRate) {
        let mut pending = self.pending.lock();
        let stat = pending.entry(worker.to_string()).or_default();
        stat.reported_hashrate = hashrate;
        stat.ip = Some(ip);
    }

    /// Takes everything recorded so far, leaving an empty map behind.
    pub(crate) fn drain(&self) -> HashMap<String, PendingStat> {
        mem::take(&mut *self.pending.lock())
    }

    /// Drains the pending counters into the interval ending at `timestamp`
    /// and prunes stats past retention.
    pub(crate) fn rollup(&self, timestamp: u64) -> Result<TotalStat> {
        let interval = STATS_INTERVAL.as_secs_f64();

        let mut stats = self
            .drain()
            .into_iter()
            .map(|(worker_name, pending)| Stat {
                worker_name,
                valid_share_count: pending.valid,
                stale_share_count: pending.stale,
                invalid_share_count: pending.invalid,
                reported_hashrate: pending.reported_hashrate.0,
                effective_hashrate: pending.valid as f64 * self.share_difficulty.as_f64()
                    / interval,
                ip_address: pending.ip.map(|ip| ip.to_string()).unwrap_or_default(),
                timestamp,
            })
            .collect::<Vec<Stat>>();

        stats.sort_by(|a, b| a.worker_name.cmp(&b.worker_name));

        let total = self
            .store
            .write_stats(timestamp, &stats)
            .context("failed to write stats")?;

        let pruned = self
            .store
            .prune_stats(timestamp.saturating_sub(STATS_RETENTION.as_secs()))
            .context("failed to prune stats")?;

        info!(
            "Stats rollup at {timestamp}: {} workers, {} valid, {} stale, {} invalid, effective {}, reported {}, pruned {pruned}",
            total.worker_count,
            total.valid_share_count,
            total.stale_share_count,
            total.invalid_share_count,
            HashRate(total.effective_hashrate),
            HashRate(total.reported_hashrate),
        );

        Ok(total)
    }

    pub(crate) fn summary(&self) -> Result<StatsSummary> {
        let totals = self.store.total_stats()?;

        let active = totals
            .iter()
            .map(|total| total.effective_hashrate)
            .filter(|hashrate| *hashrate > 0.0)
            .collect::<Vec<f64>>();

        let average_effective_hashrate = if active.is_empty() {
            0.0
        } else {
            active.iter().sum::<f64>() / active.len() as f64
        };

        let latest = totals.last().cloned();

        let workers = match &latest {
            Some(latest) => self
                .store
                .worker_stats()?
                .into_iter()
                .filter(|stat| stat.timestamp == latest.timestamp)
                .collect(),
            None => Vec::new(),
        };

        Ok(StatsSummary {
            average_effective_hashrate,
            valid_share_count: totals.iter().map(|total| total.valid_share_count).sum(),
            stale_share_count: totals.iter().map(|total| total.stale_share_count).sum(),
            invalid_share_count: totals.iter().map(|total| total.invalid_share_count).sum(),
            latest,
            workers,
        })
    }

    /// Rolls up at every interval boundary of the wall clock, and once more
    /// on cancellation.
    pub(crate) fn spawn(self: Arc<Self>, cancel_token: CancellationToken, tasks: &mut JoinSet<()>) {
        info!("Spawning stats rollup task");

        tasks.spawn(async move {
            let interval = STATS_INTERVAL.as_secs();

            loop {
                let now = now();
                let boundary = (now / interval + 1) * interval;

                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = sleep(Duration::from_secs(boundary - now)) => {
                        if let Err(err) = self.rollup(boundary) {
                            error!("Stats rollup failed: {err:#}");
                        }
                    }
                }
            }

            let boundary = now().div_ceil(interval) * interval;

            if let Err(err) = self.rollup(boundary) {
                error!("Final stats rollup failed: {err:#}");
            }

            info!("Stats rollup task stopped");
        });
    }
}
