use super::*;

/// The node family, which decides the shape of pushed work notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum NodeDialect {
    #[display("geth")]
    Geth,
    #[display("openethereum")]
    OpenEthereum,
}

impl NodeDialect {
    /// Maps a `web3_clientVersion` string such as `Geth/v1.10.8-stable/linux`
    /// to a dialect by its first path segment.
    pub(crate) fn detect(client_version: &str) -> Self {
        let name = client_version
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match name.as_str() {
            "geth" => Self::Geth,
            "openethereum" => Self::OpenEthereum,
            _ => {
                warn!("Unrecognized node client {client_version:?}, assuming geth notifications");
                Self::Geth
            }
        }
    }
}

/// The subset of a block or uncle header the gateway cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) struct Block {
    pub(crate) number: BlockNumber,
    pub(crate) hash: Hash,
    pub(crate) nonce: Nonce,
    #[serde(deserialize_with = "quantity")]
    pub(crate) difficulty: u64,
    #[serde(deserialize_with = "quantity")]
    pub(crate) timestamp: u64,
}

fn quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    BlockNumber::deserialize(deserializer).map(BlockNumber::as_u64)
}

#[async_trait]
pub(crate) trait Node: Send + Sync {
    async fn client_version(&self) -> Result<String>;

    async fn block_number(&self) -> Result<u64>;

    async fn submit_work(&self, submission: &SubmitWork) -> Result<bool>;

    async fn block_by_number(&self, number: u64) -> Result<Option<Block>>;

    async fn block_by_hash(&self, hash: Hash) -> Result<Option<Block>>;

    async fn uncle_count_by_block_number(&self, number: u64) -> Result<u64>;

    async fn uncle_by_block_number_and_index(
        &self,
        number: u64,
        index: u64,
    ) -> Result<Option<Block>>;
}

#[derive(Debug)]
pub(crate) struct RpcNode {
    rpc: RpcClient,
}

impl RpcNode {
    pub(crate) fn new(url: Url) -> Result<Self> {
        Ok(Self {
            rpc: RpcClient::new(url, NODE_RPC_TIMEOUT)?,
        })
    }
}

#[async_trait]
impl Node for RpcNode {
    async fn client_version(&self) -> Result<String> {
        self.rpc.call("web3_clientVersion", json!([])).await
    }

    async fn block_number(&self) -> Result<u64> {
        self.rpc
            .call::<BlockNumber>("eth_blockNumber", json!([]))
            .await
            .map(BlockNumber::as_u64)
    }

    async fn submit_work(&self, submission: &SubmitWork) -> Result<bool> {
        self.rpc.call("eth_submitWork", json!(submission)).await
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<Block>> {
        self.rpc
            .call(
                "eth_getBlockByNumber",
                json!([BlockNumber::new(number), false]),
            )
            .await
    }

    async fn block_by_hash(&self, hash: Hash) -> Result<Option<Block>> {
        self.rpc
            .call("eth_getBlockByHash", json!([hash, false]))
            .await
    }

    async fn uncle_count_by_block_number(&self, number: u64) -> Result<u64> {
        self.rpc
            .call::<BlockNumber>(
                "eth_getUncleCountByBlockNumber",
                json!([BlockNumber::new(number)]),
            )
            .await
            .map(BlockNumber::as_u64)
    }

    async fn uncle_by_block_number_and_index(
        &self,
        number: u64,
        index: u64,
    ) -> Result<Option<Block>> {
        self.rpc
            .call(
                "eth_getUncleByBlockNumberAndIndex",
                json!([BlockNumber::new(number), format!("{index:#x}")]),
            )
            .await
    }
}
