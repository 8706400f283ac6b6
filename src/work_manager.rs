use super::*;

/// A miner's feed of new jobs. Dropping the receiver is enough for the
/// manager to forget it on the next broadcast, but connections unsubscribe
/// explicitly when they close.
#[derive(Debug)]
pub(crate) struct Subscription {
    pub(crate) id: u64,
    pub(crate) receiver: mpsc::Receiver<Work>,
}

#[derive(Debug)]
struct Subscriber {
    id: u64,
    sender: mpsc::Sender<Work>,
}

#[derive(Debug)]
struct State {
    current: Option<Work>,
    history: WorkHistory,
    subscribers: Vec<Subscriber>,
    best_share_target: Target,
}

/// Owns the current job, recent job history, the set of subscribed miners
/// and the best share target of the round.
#[derive(Debug)]
pub(crate) struct WorkManager {
    share_difficulty: Difficulty,
    share_target: Target,
    next_subscriber_id: AtomicU64,
    state: Mutex<State>,
}

impl WorkManager {
    pub(crate) fn new(share_difficulty: Difficulty) -> Self {
        Self {
            share_difficulty,
            share_target: share_difficulty.to_target(),
            next_subscriber_id: AtomicU64::new(1),
            state: Mutex::new(State {
                current: None,
                history: WorkHistory::default(),
                subscribers: Vec::new(),
                best_share_target: Target::MAX,
            }),
        }
    }

    pub(crate) fn share_difficulty(&self) -> Difficulty {
        self.share_difficulty
    }

    pub(crate) fn share_target(&self) -> Target {
        self.share_target
    }

    /// Makes `work` the current job, pushes the share target variant to every
    /// subscriber and records the original in the history. Returns how many
    /// subscribers the job was delivered to.
    pub(crate) fn ingest(&self, work: Work) -> usize {
        let share_work = work.with_target(self.share_target);

        let mut state = self.state.lock();

        state.current = Some(work);

        let mut delivered = 0;
        let mut closed = Vec::new();

        for (index, subscriber) in state.subscribers.iter().enumerate() {
            match subscriber.sender.try_send(share_work) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(
                        "Subscriber {} is lagging, skipping job {}",
                        subscriber.id, work.header_hash
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(index),
            }
        }

        for index in closed.into_iter().rev() {
            let subscriber = state.subscribers.swap_remove(index);
            debug!("Pruned closed subscriber {}", subscriber.id);
        }

        state.history.insert(work);

        let subscribers = state.subscribers.len();

        drop(state);

        info!(
            "New job {} at block {} (network difficulty {}, {delivered}/{subscribers} subscribers)",
            work.header_hash,
            work.block_number.as_u64(),
            Si(work.target.difficulty(), "H"),
        );

        delivered
    }

    /// The current job, with the pool share target substituted when
    /// `apply_share_target` is set. `None` until the node pushed a job.
    pub(crate) fn current_work(&self, apply_share_target: bool) -> Option<Work> {
        let current = self.state.lock().current?;

        Some(if apply_share_target {
            current.with_target(self.share_target)
        } else {
            current
        })
    }

    pub(crate) fn subscribe(&self) -> Subscription {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(SUBSCRIPTION_CAPACITY);

        self.state.lock().subscribers.push(Subscriber { id, sender });

        Subscription { id, receiver }
    }

    pub(crate) fn unsubscribe(&self, id: u64) {
        let mut state = self.state.lock();

        if let Some(index) = state
            .subscribers
            .iter()
            .position(|subscriber| subscriber.id == id)
        {
            state.subscribers.swap_remove(index);
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Looks up a job by header hash and reports whether it is stale, i.e. no
    /// longer at the current job's block number.
    pub(crate) fn lookup(&self, header_hash: &Hash) -> Option<(Work, bool)> {
        let state = self.state.lock();

        let work = state.history.get(header_hash)?;

        let stale = state
            .current
            .is_none_or(|current| current.block_number != work.block_number);

        Some((work, stale))
    }

    pub(crate) fn best_share_target(&self) -> Target {
        self.state.lock().best_share_target
    }

    /// Records `actual` as the round's best share if it is strictly lower
    /// than the current best.
    pub(crate) fn update_best_share(&self, actual: Target) -> bool {
        let mut state = self.state.lock();

        if actual < state.best_share_target {
            state.best_share_target = actual;
            true
        } else {
            false
        }
    }

    pub(crate) fn reset_best_share(&self) {
        self.state.lock().best_share_target = Target::MAX;
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    fn difficulty() -> Difficulty {
        Difficulty::new(4_000_000_000).unwrap()
    }

    fn work(n: u8, block_number: u64) -> Work {
        Work {
            header_hash: Hash::from_byte_array([n; 32]),
            seed_hash: Hash::from_byte_array([0xbb; 32]),
            target: Target::new(U256::from(0x0400)),
            block_number: BlockNumber::new(block_number),
        }
    }

    #[test]
    fn no_work_before_first_ingest() {
        let manager = WorkManager::new(difficulty());
        assert_eq!(manager.current_work(true), None);
        assert_eq!(manager.current_work(false), None);
    }

    #[test]
    fn current_work_with_and_without_share_target() {
        let manager = WorkManager::new(difficulty());

        manager.ingest(work(1, 100));

        assert_eq!(manager.current_work(false), Some(work(1, 100)));
        assert_eq!(
            manager.current_work(true),
            Some(work(1, 100).with_target(difficulty().to_target()))
        );
    }

    #[test]
    fn history_keeps_network_target() {
        let manager = WorkManager::new(difficulty());

        manager.ingest(work(1, 100));

        let (found, stale) = manager.lookup(&work(1, 100).header_hash).unwrap();
        assert_eq!(found.target, Target::new(U256::from(0x0400)));
        assert!(!stale);
    }

    #[test]
    fn older_job_is_stale_but_found() {
        let manager = WorkManager::new(difficulty());

        manager.ingest(work(1, 100));
        manager.ingest(work(2, 101));

        assert_eq!(manager.lookup(&work(1, 100).header_hash).unwrap().1, true);
        assert_eq!(manager.lookup(&work(2, 101).header_hash).unwrap().1, false);
    }

    #[test]
    fn same_height_refresh_is_not_stale() {
        let manager = WorkManager::new(difficulty());

        manager.ingest(work(1, 100));
        manager.ingest(work(2, 100));

        assert_eq!(manager.lookup(&work(1, 100).header_hash).unwrap().1, false);
    }

    #[test]
    fn unknown_header_is_not_found() {
        let manager = WorkManager::new(difficulty());

        manager.ingest(work(1, 100));

        assert_eq!(manager.lookup(&work(7, 100).header_hash), None);
    }

    #[test]
    fn history_is_bounded() {
        let manager = WorkManager::new(difficulty());

        for n in 0..20 {
            manager.ingest(work(n, n.into()));
        }

        assert_eq!(manager.state.lock().history.len(), WORK_HISTORY_SIZE);
        assert_eq!(manager.lookup(&work(11, 11).header_hash), None);
        assert!(manager.lookup(&work(12, 12).header_hash).is_some());
        assert!(manager.lookup(&work(19, 19).header_hash).is_some());
    }

    #[tokio::test]
    async fn subscribers_receive_share_target_variant() {
        let manager = WorkManager::new(difficulty());

        let mut a = manager.subscribe();
        let mut b = manager.subscribe();

        assert_eq!(manager.ingest(work(1, 100)), 2);

        let expected = work(1, 100).with_target(difficulty().to_target());

        assert_eq!(a.receiver.recv().await, Some(expected));
        assert_eq!(b.receiver.recv().await, Some(expected));
    }

    #[tokio::test]
    async fn subscriber_sees_jobs_in_ingest_order() {
        let manager = WorkManager::new(difficulty());

        let mut subscription = manager.subscribe();

        manager.ingest(work(1, 100));
        manager.ingest(work(2, 101));
        manager.ingest(work(3, 102));

        for (n, height) in [(1, 100), (2, 101), (3, 102)] {
            assert_eq!(
                subscription.receiver.recv().await.unwrap().header_hash,
                work(n, height).header_hash
            );
        }
    }

    #[test]
    fn dead_subscriber_is_pruned_without_blocking() {
        let manager = WorkManager::new(difficulty());

        let live = (0..3).map(|_| manager.subscribe()).collect::<Vec<_>>();
        let dead = manager.subscribe();

        drop(dead);

        assert_eq!(manager.subscriber_count(), 4);
        assert_eq!(manager.ingest(work(1, 100)), 3);
        assert_eq!(manager.subscriber_count(), 3);

        drop(live);
    }

    #[test]
    fn lagging_subscriber_skips_jobs_but_stays_registered() {
        let manager = WorkManager::new(difficulty());

        let mut slow = manager.subscribe();

        for n in 0..SUBSCRIPTION_CAPACITY as u8 {
            assert_eq!(manager.ingest(work(n, n.into())), 1);
        }

        assert_eq!(manager.ingest(work(200, 200)), 0);
        assert_eq!(manager.subscriber_count(), 1);

        assert_eq!(slow.receiver.try_recv().unwrap().header_hash, work(0, 0).header_hash);

        assert_eq!(manager.ingest(work(201, 201)), 1);
    }

    #[test]
    fn unsubscribe_removes_only_that_subscriber() {
        let manager = WorkManager::new(difficulty());

        let a = manager.subscribe();
        let _b = manager.subscribe();

        manager.unsubscribe(a.id);
        manager.unsubscribe(a.id);

        assert_eq!(manager.subscriber_count(), 1);
    }

    #[test]
    fn best_share_only_decreases_until_reset() {
        let manager = WorkManager::new(difficulty());

        assert_eq!(manager.best_share_target(), Target::MAX);

        assert!(manager.update_best_share(Target::new(U256::from(0x0200))));
        assert!(!manager.update_best_share(Target::new(U256::from(0x0200))));
        assert!(!manager.update_best_share(Target::new(U256::from(0x0300))));
        assert_eq!(manager.best_share_target(), Target::new(U256::from(0x0200)));

        assert!(manager.update_best_share(Target::new(U256::from(0x0100))));
        assert_eq!(manager.best_share_target(), Target::new(U256::from(0x0100)));

        manager.reset_best_share();

        assert_eq!(manager.best_share_target(), Target::MAX);
    }

    #[test]
    fn concurrent_best_share_updates_keep_the_minimum() {
        let manager = Arc::new(WorkManager::new(difficulty()));

        let handles = (1..=8u64)
            .map(|t| {
                let manager = manager.clone();
                thread::spawn(move || {
                    for i in 0..1000u64 {
                        manager.update_best_share(Target::new(U256::from(1_000_000 - i * 8 - t)));
                    }
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            manager.best_share_target(),
            Target::new(U256::from(1_000_000 - 999 * 8 - 8))
        );
    }
}
