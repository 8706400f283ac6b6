use {
    derive_more::Display,
    error::{CorruptedSnafu, DatabaseSnafu, IoSnafu, Result, SerializationSnafu},
    parking_lot::Mutex,
    rocksdb::{DB, Direction, IteratorMode, Options as RocksDbOptions, WriteBatch},
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    snafu::{ResultExt, Snafu},
    std::{
        fs, io,
        path::{Path, PathBuf},
    },
    stratum::Hash,
    tracing::{debug, info},
};

pub use error::StoreError;

mod error;

const BEST_PREFIX: &str = "best__";
const BLOCK_PREFIX: &str = "block__";
const STAT_PREFIX: &str = "stat__";
const TOTAL_PREFIX: &str = "total__";
const VALID_SHARES_KEY: &str = "mined_valid_shares";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    #[display("block")]
    Block,
    #[display("uncle")]
    Uncle,
    #[display("orphan")]
    Orphan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestShare {
    pub worker_name: String,
    pub actual_share_difficulty: f64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub hash: Hash,
    pub number: u64,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub worker_name: String,
    pub difficulty: u64,
    /// Chain timestamp of the mined block or uncle.
    pub timestamp: u64,
    pub confirmed: bool,
    pub mined_hashes: f64,
    pub round_time: u64,
    pub luck: f64,
}

/// One worker's counters for one rollup interval. `timestamp` is the end of
/// the interval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    pub worker_name: String,
    pub valid_share_count: u64,
    pub stale_share_count: u64,
    pub invalid_share_count: u64,
    pub reported_hashrate: f64,
    pub effective_hashrate: f64,
    pub ip_address: String,
    pub timestamp: u64,
}

impl Stat {
    fn merge(&mut self, newer: &Stat) {
        self.valid_share_count += newer.valid_share_count;
        self.stale_share_count += newer.stale_share_count;
        self.invalid_share_count += newer.invalid_share_count;
        self.effective_hashrate += newer.effective_hashrate;
        self.reported_hashrate = newer.reported_hashrate;
        self.ip_address.clone_from(&newer.ip_address);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalStat {
    pub valid_share_count: u64,
    pub stale_share_count: u64,
    pub invalid_share_count: u64,
    pub reported_hashrate: f64,
    pub effective_hashrate: f64,
    pub worker_count: u64,
    pub timestamp: u64,
}

impl TotalStat {
    pub fn from_stats(timestamp: u64, stats: &[Stat]) -> Self {
        stats.iter().fold(
            Self {
                timestamp,
                ..Self::default()
            },
            |mut total, stat| {
                total.valid_share_count += stat.valid_share_count;
                total.stale_share_count += stat.stale_share_count;
                total.invalid_share_count += stat.invalid_share_count;
                total.reported_hashrate += stat.reported_hashrate;
                total.effective_hashrate += stat.effective_hashrate;
                total.worker_count += 1;
                total
            },
        )
    }

    fn merge(&mut self, newer: &TotalStat) {
        self.valid_share_count += newer.valid_share_count;
        self.stale_share_count += newer.stale_share_count;
        self.invalid_share_count += newer.invalid_share_count;
        self.effective_hashrate += newer.effective_hashrate;
        self.reported_hashrate = self.reported_hashrate.max(newer.reported_hashrate);
        self.worker_count = self.worker_count.max(newer.worker_count);
    }
}

/// Ordered key-value store for accounting records, backed by RocksDB in the
/// data directory. Every write goes straight to the database.
pub struct Store {
    path: PathBuf,
    db: DB,
    write_lock: Mutex<()>,
    #[cfg(test)]
    _tempdir: Option<tempfile::TempDir>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("path", &self.path).finish()
    }
}

impl Store {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).context(IoSnafu { path: dir })?;

        let mut options = RocksDbOptions::default();
        options.create_if_missing(true);

        let db = DB::open(&options, dir).context(DatabaseSnafu { path: dir })?;

        info!("Opened store at {}", dir.display());

        Ok(Self {
            path: dir.into(),
            db,
            write_lock: Mutex::new(()),
            #[cfg(test)]
            _tempdir: None,
        })
    }

    #[cfg(test)]
    pub(crate) fn temporary() -> Self {
        let tempdir = tempfile::TempDir::new().unwrap();
        let mut store = Self::open(tempdir.path()).unwrap();
        store._tempdir = Some(tempdir);
        store
    }

    pub fn write_best_share(&self, share: &BestShare) -> Result {
        let key = format!(
            "{BEST_PREFIX}{}_{}_{:016x}",
            share.worker_name,
            share.timestamp,
            rand::random::<u64>()
        );

        self.put(&key, share)
    }

    pub fn best_shares(&self) -> Result<Vec<BestShare>> {
        let mut shares = Vec::new();

        for (key, share) in self.scan::<BestShare>(BEST_PREFIX)? {
            let (worker, timestamp) = key
                .strip_prefix(BEST_PREFIX)
                .and_then(|rest| rest.rsplit_once('_'))
                .and_then(|(head, _suffix)| head.rsplit_once('_'))
                .ok_or_else(|| corrupted(&key, "malformed key"))?;

            if worker != share.worker_name || parse_timestamp(&key, timestamp)? != share.timestamp
            {
                return CorruptedSnafu {
                    key,
                    reason: "key does not match record",
                }
                .fail();
            }

            shares.push(share);
        }

        shares.sort_by_key(|share| share.timestamp);

        Ok(shares)
    }

    /// Inserts or replaces the record for `block.hash`.
    pub fn write_block(&self, block: &BlockRecord) -> Result {
        self.put(&format!("{BLOCK_PREFIX}{}", block.hash), block)
    }

    /// All blocks, newest first.
    pub fn blocks(&self) -> Result<Vec<BlockRecord>> {
        let mut blocks = Vec::new();

        for (key, block) in self.scan::<BlockRecord>(BLOCK_PREFIX)? {
            if key != format!("{BLOCK_PREFIX}{}", block.hash) {
                return CorruptedSnafu {
                    key,
                    reason: "key does not match block hash",
                }
                .fail();
            }

            blocks.push(block);
        }

        blocks.sort_by(|a, b| b.number.cmp(&a.number));

        Ok(blocks)
    }

    pub fn unconfirmed_blocks(&self) -> Result<Vec<BlockRecord>> {
        Ok(self
            .blocks()?
            .into_iter()
            .filter(|block| !block.confirmed)
            .collect())
    }

    pub fn incr_valid_shares(&self) -> Result<u64> {
        let _guard = self.write_lock.lock();
        let count = self.valid_shares()? + 1;
        self.put(VALID_SHARES_KEY, &count)?;
        Ok(count)
    }

    pub fn valid_shares(&self) -> Result<u64> {
        Ok(self.get::<u64>(VALID_SHARES_KEY)?.unwrap_or_default())
    }

    pub fn valid_shares_then_reset(&self) -> Result<u64> {
        let _guard = self.write_lock.lock();
        let count = self.valid_shares()?;
        self.put(VALID_SHARES_KEY, &0u64)?;
        Ok(count)
    }

    /// Seconds since the round started: the most recent block, or the first
    /// best share if no block was found yet.
    pub fn round_time(&self, now: u64) -> Result<u64> {
        let start = match self.blocks()?.iter().map(|block| block.timestamp).max() {
            Some(timestamp) => Some(timestamp),
            None => self
                .best_shares()?
                .iter()
                .map(|share| share.timestamp)
                .min(),
        };

        Ok(start
            .map(|start| now.saturating_sub(start))
            .unwrap_or_default())
    }

    /// Writes one interval's worker stats and their total in one batch,
    /// merging into records already present for the same interval.
    pub fn write_stats(&self, timestamp: u64, stats: &[Stat]) -> Result<TotalStat> {
        let _guard = self.write_lock.lock();

        let mut batch = WriteBatch::default();

        for stat in stats {
            let key = format!("{STAT_PREFIX}{}_{timestamp}", stat.worker_name);

            let mut stat = Stat {
                timestamp,
                ..stat.clone()
            };

            if let Some(mut existing) = self.get::<Stat>(&key)? {
                existing.merge(&stat);
                stat = existing;
            }

            batch.put(&key, encode(&key, &stat)?);
        }

        let key = format!("{TOTAL_PREFIX}{timestamp}");

        let mut total = TotalStat::from_stats(timestamp, stats);

        if let Some(mut existing) = self.get::<TotalStat>(&key)? {
            existing.merge(&total);
            total = existing;
        }

        batch.put(&key, encode(&key, &total)?);

        self.db.write(batch).context(DatabaseSnafu { path: &self.path })?;

        Ok(total)
    }

    /// Per-worker stats, oldest interval first.
    pub fn worker_stats(&self) -> Result<Vec<Stat>> {
        let mut stats = Vec::new();

        for (key, stat) in self.scan::<Stat>(STAT_PREFIX)? {
            let expected = format!("{STAT_PREFIX}{}_{}", stat.worker_name, stat.timestamp);

            if key != expected {
                return CorruptedSnafu {
                    key,
                    reason: "key does not match record",
                }
                .fail();
            }

            stats.push(stat);
        }

        stats.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.worker_name.cmp(&b.worker_name))
        });

        Ok(stats)
    }

    /// Interval totals, oldest first.
    pub fn total_stats(&self) -> Result<Vec<TotalStat>> {
        let mut totals = Vec::new();

        for (key, total) in self.scan::<TotalStat>(TOTAL_PREFIX)? {
            let timestamp = parse_timestamp(&key, &key[TOTAL_PREFIX.len()..])?;

            if timestamp != total.timestamp {
                return CorruptedSnafu {
                    key,
                    reason: "key does not match record",
                }
                .fail();
            }

            totals.push(total);
        }

        totals.sort_by_key(|total| total.timestamp);

        Ok(totals)
    }

    /// Drops worker and total stats for intervals ending before `cutoff`.
    pub fn prune_stats(&self, cutoff: u64) -> Result<usize> {
        let mut batch = WriteBatch::default();
        let mut expired = 0;

        for prefix in [STAT_PREFIX, TOTAL_PREFIX] {
            for key in self.keys(prefix)? {
                let rest = &key[prefix.len()..];

                let timestamp = if prefix == STAT_PREFIX {
                    let (_worker, timestamp) = rest
                        .rsplit_once('_')
                        .ok_or_else(|| corrupted(&key, "malformed key"))?;
                    parse_timestamp(&key, timestamp)?
                } else {
                    parse_timestamp(&key, rest)?
                };

                if timestamp < cutoff {
                    batch.delete(&key);
                    expired += 1;
                }
            }
        }

        if expired > 0 {
            self.db.write(batch).context(DatabaseSnafu { path: &self.path })?;
            debug!("Pruned {expired} stat records before {cutoff}");
        }

        Ok(expired)
    }

    /// Flushes memtables to disk. Writes are already durable in the WAL.
    pub fn flush(&self) -> Result {
        self.db.flush().context(DatabaseSnafu { path: &self.path })
    }

    pub fn close(&self) -> Result {
        self.flush()?;
        info!("Closed store at {}", self.path.display());
        Ok(())
    }

    fn put<T: Serialize>(&self, key: &str, record: &T) -> Result {
        self.db
            .put(key, encode(key, record)?)
            .context(DatabaseSnafu { path: &self.path })
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.db
            .get(key)
            .context(DatabaseSnafu { path: &self.path })?
            .map(|bytes| decode(key, &bytes))
            .transpose()
    }

    fn entries(&self, prefix: &str) -> Result<Vec<(String, Box<[u8]>)>> {
        let mut entries = Vec::new();

        for item in self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward))
        {
            let (key, value) = item.context(DatabaseSnafu { path: &self.path })?;

            if !key.starts_with(prefix.as_bytes()) {
                break;
            }

            let key = String::from_utf8(key.into_vec()).map_err(|err| {
                corrupted(
                    &String::from_utf8_lossy(err.as_bytes()),
                    "key is not utf-8",
                )
            })?;

            entries.push((key, value));
        }

        Ok(entries)
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries(prefix)?
            .into_iter()
            .map(|(key, _value)| key)
            .collect())
    }

    fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<(String, T)>> {
        self.entries(prefix)?
            .into_iter()
            .map(|(key, value)| {
                let record = decode(&key, &value)?;
                Ok((key, record))
            })
            .collect()
    }
}

fn encode<T: Serialize>(key: &str, record: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(record).context(SerializationSnafu { key })
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|err| corrupted(key, &err.to_string()))
}

fn parse_timestamp(key: &str, timestamp: &str) -> Result<u64> {
    timestamp
        .parse()
        .map_err(|_| corrupted(key, "bad timestamp in key"))
}

fn corrupted(key: &str, reason: &str) -> StoreError {
    CorruptedSnafu { key, reason }.build()
}
