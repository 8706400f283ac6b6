use {
    anyhow::{Context, Error, anyhow, bail, ensure},
    arguments::Arguments,
    async_trait::async_trait,
    axum::{Json, Router, routing::get},
    block_submitter::{BlockCandidate, BlockSubmitter, HarvestConfig},
    clap::Parser,
    confirmation::Confirmer,
    connection::Connection,
    derive_more::Display,
    engine::Engine,
    gateway::Gateway,
    node::{Block, Node, NodeDialect, RpcNode},
    options::Options,
    parking_lot::Mutex,
    reqwest::Url,
    rpc::RpcClient,
    serde::{
        Deserialize, Serialize,
        de::{DeserializeOwned, Deserializer},
    },
    serde_json::{Value, json},
    settings::Settings,
    stats::{Collector, StatsSummary},
    std::{
        collections::{BTreeMap, HashMap, VecDeque},
        env, io, mem,
        net::{IpAddr, SocketAddr},
        path::{Path, PathBuf},
        process,
        str::FromStr,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, SystemTime, UNIX_EPOCH},
    },
    store::{BestShare, BlockKind, BlockRecord, Stat, Store, StoreError, TotalStat},
    stratum::{
        BlockNumber, Difficulty, Hash, HashRate, Id, Message, Nonce, Si, StratumError,
        SubmitHashrate, SubmitLogin, SubmitWork, Target, Work,
    },
    tokio::{
        runtime::Runtime,
        sync::mpsc,
        task::JoinSet,
        time::{MissedTickBehavior, interval, sleep, timeout},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
    validator::{Classification, Validator},
    verifier::{PowVerifier, RpcVerifier},
    work_history::WorkHistory,
    work_manager::{Subscription, WorkManager},
};

#[cfg(test)]
use {
    primitive_types::U256,
    std::{sync::atomic::AtomicUsize, thread},
    verifier::Verification,
};

mod api;
mod arguments;
mod block_submitter;
mod confirmation;
mod connection;
mod engine;
mod gateway;
mod http_server;
mod ingest;
mod logs;
#[cfg(test)]
mod mock;
mod node;
mod options;
mod rpc;
mod settings;
mod signal;
mod stats;
mod store;
mod validator;
mod verifier;
mod work_history;
mod work_manager;

pub const USER_AGENT: &str = concat!("solo/", env!("CARGO_PKG_VERSION"));
pub const WORK_HISTORY_SIZE: usize = 8;
pub const MAX_MESSAGE_SIZE: usize = 32 * 1024;
/// Jobs queued per miner before new jobs are dropped for it.
pub const SUBSCRIPTION_CAPACITY: usize = 16;
pub const BLOCK_CANDIDATE_CAPACITY: usize = 64;
pub const STATS_INTERVAL: Duration = Duration::from_secs(600);
pub const STATS_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);
pub const CONFIRMATION_INTERVAL: Duration = Duration::from_secs(1);
pub const NODE_RPC_TIMEOUT: Duration = Duration::from_secs(10);
pub const VERIFIER_RPC_TIMEOUT: Duration = Duration::from_secs(5);

type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Seconds since the unix epoch.
fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn exit_with(err: Error) -> ! {
    eprintln!("error: {err}");

    for (i, cause) in err.chain().skip(1).enumerate() {
        if i == 0 {
            eprintln!();
            eprintln!("because:");
        }
        eprintln!("- {cause}");
    }

    if env::var_os("RUST_BACKTRACE")
        .map(|val| val == "1")
        .unwrap_or_default()
    {
        eprintln!();
        eprintln!("{}", err.backtrace());
    }

    process::exit(1);
}

pub fn main() {
    let settings = match Arguments::parse().settings() {
        Ok(settings) => settings,
        Err(err) => exit_with(err),
    };

    let guard = logs::init(settings.log_level());

    let result = Runtime::new()
        .expect("Failed to create tokio runtime")
        .block_on(async {
            let cancel_token = signal::setup_signal_handler();
            Engine::new(settings).run(cancel_token).await
        });

    drop(guard);

    if let Err(err) = result {
        exit_with(err);
    }
}
