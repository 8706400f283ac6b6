use super::*;

const DEFAULT_SHARE_DIFFICULTY: u64 = 4_000_000_000;
const DEFAULT_NODE_HTTP_RPC: &str = "http://127.0.0.1:8545";
const DEFAULT_VERIFIER_HTTP_RPC: &str = "http://127.0.0.1:8546";
const DEFAULT_DB_PATH: &str = "./solo_db";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_CONFIRMATIONS_REQUIRED: u64 = 60;
const DEFAULT_LOGIN_TIMEOUT: u64 = 10;

/// Validated configuration, resolved from flags, then `SOLO_*` environment
/// variables, then defaults.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    notifications_bind: SocketAddr,
    gateway_bind: SocketAddr,
    password: String,
    share_difficulty: Difficulty,
    node_rpc: Url,
    verifier_rpc: Url,
    db_path: PathBuf,
    log_level: String,
    confirmations_required: u64,
    api_bind: Option<SocketAddr>,
    login_timeout: Duration,
    harvest: HarvestConfig,
}

impl Settings {
    pub(crate) fn load(options: Options) -> Result<Self> {
        let mut env = BTreeMap::<String, String>::new();

        for (var, value) in std::env::vars_os() {
            let Some(var) = var.to_str() else {
                continue;
            };

            let Some(key) = var.strip_prefix("SOLO_") else {
                continue;
            };

            env.insert(
                key.into(),
                value.into_string().map_err(|value| {
                    anyhow!(
                        "environment variable `{var}` not valid unicode: `{}`",
                        value.to_string_lossy()
                    )
                })?,
            );
        }

        Self::merge(options, env)
    }

    pub(crate) fn merge(options: Options, env: BTreeMap<String, String>) -> Result<Self> {
        Self::resolve(options.or(Options::from_env(&env)?))
    }

    fn resolve(options: Options) -> Result<Self> {
        let harvest_defaults = HarvestConfig::default();

        let password = options
            .gateway_password
            .context("missing gateway password, set --gateway-password or SOLO_GATEWAY_PASSWORD")?;

        ensure!(!password.is_empty(), "gateway password must not be empty");

        let share_difficulty = options.share_difficulty.unwrap_or(DEFAULT_SHARE_DIFFICULTY);

        Ok(Self {
            notifications_bind: socket_addr(
                "work notifications",
                options.workmanager_notifications_bind.as_deref(),
            )?
            .context(
                "missing work notification address, set --workmanager-notifications-bind or SOLO_WORKMANAGER_NOTIFICATIONS_BIND",
            )?,
            gateway_bind: socket_addr("gateway", options.gateway_insecure_bind.as_deref())?
                .context(
                    "missing gateway address, set --gateway-insecure-bind or SOLO_GATEWAY_INSECURE_BIND",
                )?,
            password,
            share_difficulty: Difficulty::new(share_difficulty)
                .context("share difficulty must be greater than zero")?,
            node_rpc: url(
                "node",
                options.node_http_rpc.as_deref().unwrap_or(DEFAULT_NODE_HTTP_RPC),
            )?,
            verifier_rpc: url(
                "verifier",
                options
                    .verifier_http_rpc
                    .as_deref()
                    .unwrap_or(DEFAULT_VERIFIER_HTTP_RPC),
            )?,
            db_path: options
                .db_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            log_level: options
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.into()),
            confirmations_required: options
                .block_confirmations_required
                .unwrap_or(DEFAULT_CONFIRMATIONS_REQUIRED),
            api_bind: socket_addr("API", options.api_bind.as_deref())?,
            login_timeout: Duration::from_secs(
                options.login_timeout.unwrap_or(DEFAULT_LOGIN_TIMEOUT),
            ),
            harvest: HarvestConfig {
                passes: options.harvest_passes.unwrap_or(harvest_defaults.passes),
                depth: options.harvest_depth.unwrap_or(harvest_defaults.depth),
                backoff: options
                    .harvest_backoff
                    .map(Duration::from_secs)
                    .unwrap_or(harvest_defaults.backoff),
            },
        })
    }

    pub(crate) fn notifications_bind(&self) -> SocketAddr {
        self.notifications_bind
    }

    pub(crate) fn gateway_bind(&self) -> SocketAddr {
        self.gateway_bind
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    pub(crate) fn share_difficulty(&self) -> Difficulty {
        self.share_difficulty
    }

    pub(crate) fn node_rpc(&self) -> &Url {
        &self.node_rpc
    }

    pub(crate) fn verifier_rpc(&self) -> &Url {
        &self.verifier_rpc
    }

    pub(crate) fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub(crate) fn log_level(&self) -> &str {
        &self.log_level
    }

    pub(crate) fn confirmations_required(&self) -> u64 {
        self.confirmations_required
    }

    pub(crate) fn api_bind(&self) -> Option<SocketAddr> {
        self.api_bind
    }

    pub(crate) fn login_timeout(&self) -> Duration {
        self.login_timeout
    }

    pub(crate) fn harvest(&self) -> HarvestConfig {
        self.harvest
    }
}

fn socket_addr(name: &str, address: Option<&str>) -> Result<Option<SocketAddr>> {
    address
        .map(|address| {
            address
                .parse::<SocketAddr>()
                .with_context(|| format!("invalid {name} address `{address}`"))
        })
        .transpose()
}

fn url(name: &str, url: &str) -> Result<Url> {
    url.parse::<Url>()
        .with_context(|| format!("invalid {name} RPC url `{url}`"))
}
