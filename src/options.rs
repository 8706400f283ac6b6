use super::*;

/// Command line options. Every option can also be set through the
/// environment as `SOLO_<OPTION>`, e.g. `SOLO_GATEWAY_PASSWORD`; flags take
/// precedence.
#[derive(Clone, Default, Debug, PartialEq, Parser)]
pub(crate) struct Options {
    #[arg(
        long,
        help = "Receive work notifications from the node on <WORKMANAGER_NOTIFICATIONS_BIND>."
    )]
    pub(crate) workmanager_notifications_bind: Option<String>,

    #[arg(long, help = "Accept stratum miners on <GATEWAY_INSECURE_BIND>.")]
    pub(crate) gateway_insecure_bind: Option<String>,

    #[arg(long, help = "Require miners to log in with <GATEWAY_PASSWORD>.")]
    pub(crate) gateway_password: Option<String>,

    #[arg(long, help = "Accept shares at <SHARE_DIFFICULTY>. [default: 4000000000]")]
    pub(crate) share_difficulty: Option<u64>,

    #[arg(long, help = "Connect to node RPC at <NODE_HTTP_RPC>. [default: http://127.0.0.1:8545]")]
    pub(crate) node_http_rpc: Option<String>,

    #[arg(
        long,
        help = "Verify proof of work with the service at <VERIFIER_HTTP_RPC>. [default: http://127.0.0.1:8546]"
    )]
    pub(crate) verifier_http_rpc: Option<String>,

    #[arg(long, help = "Store data in <DB_PATH>. [default: ./solo_db]")]
    pub(crate) db_path: Option<PathBuf>,

    #[arg(long, help = "Log at <LOG_LEVEL> unless RUST_LOG is set. [default: info]")]
    pub(crate) log_level: Option<String>,

    #[arg(
        long,
        help = "Confirm blocks <BLOCK_CONFIRMATIONS_REQUIRED> blocks deep. [default: 60]"
    )]
    pub(crate) block_confirmations_required: Option<u64>,

    #[arg(long, help = "Serve the reporting API on <API_BIND>.")]
    pub(crate) api_bind: Option<String>,

    #[arg(
        long,
        help = "Disconnect miners that do not log in within <LOGIN_TIMEOUT> seconds. [default: 10]"
    )]
    pub(crate) login_timeout: Option<u64>,

    #[arg(
        long,
        help = "Search for a submitted block <HARVEST_PASSES> times. [default: 10]"
    )]
    pub(crate) harvest_passes: Option<u32>,

    #[arg(
        long,
        help = "Search <HARVEST_DEPTH> blocks below the head for a submitted block. [default: 100]"
    )]
    pub(crate) harvest_depth: Option<u64>,

    #[arg(
        long,
        help = "Wait <HARVEST_BACKOFF> seconds between block searches. [default: 5]"
    )]
    pub(crate) harvest_backoff: Option<u64>,
}

impl Options {
    /// Reads options from `env`, keyed without the `SOLO_` prefix.
    pub(crate) fn from_env(env: &BTreeMap<String, String>) -> Result<Self> {
        let get_string = |key: &str| env.get(key).cloned();

        Ok(Self {
            workmanager_notifications_bind: get_string("WORKMANAGER_NOTIFICATIONS_BIND"),
            gateway_insecure_bind: get_string("GATEWAY_INSECURE_BIND"),
            gateway_password: get_string("GATEWAY_PASSWORD"),
            share_difficulty: parse_env(env, "SHARE_DIFFICULTY")?,
            node_http_rpc: get_string("NODE_HTTP_RPC"),
            verifier_http_rpc: get_string("VERIFIER_HTTP_RPC"),
            db_path: get_string("DB_PATH").map(PathBuf::from),
            log_level: get_string("LOG_LEVEL"),
            block_confirmations_required: parse_env(env, "BLOCK_CONFIRMATIONS_REQUIRED")?,
            api_bind: get_string("API_BIND"),
            login_timeout: parse_env(env, "LOGIN_TIMEOUT")?,
            harvest_passes: parse_env(env, "HARVEST_PASSES")?,
            harvest_depth: parse_env(env, "HARVEST_DEPTH")?,
            harvest_backoff: parse_env(env, "HARVEST_BACKOFF")?,
        })
    }

    /// Fills every unset option in `self` from `other`.
    pub(crate) fn or(self, other: Self) -> Self {
        Self {
            workmanager_notifications_bind: self
                .workmanager_notifications_bind
                .or(other.workmanager_notifications_bind),
            gateway_insecure_bind: self.gateway_insecure_bind.or(other.gateway_insecure_bind),
            gateway_password: self.gateway_password.or(other.gateway_password),
            share_difficulty: self.share_difficulty.or(other.share_difficulty),
            node_http_rpc: self.node_http_rpc.or(other.node_http_rpc),
            verifier_http_rpc: self.verifier_http_rpc.or(other.verifier_http_rpc),
            db_path: self.db_path.or(other.db_path),
            log_level: self.log_level.or(other.log_level),
            block_confirmations_required: self
                .block_confirmations_required
                .or(other.block_confirmations_required),
            api_bind: self.api_bind.or(other.api_bind),
            login_timeout: self.login_timeout.or(other.login_timeout),
            harvest_passes: self.harvest_passes.or(other.harvest_passes),
            harvest_depth: self.harvest_depth.or(other.harvest_depth),
            harvest_backoff: self.harvest_backoff.or(other.harvest_backoff),
        }
    }
}

fn parse_env<T>(env: &BTreeMap<String, String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env.get(key)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("invalid value `{value}` for SOLO_{key}"))
        })
        .transpose()
}
