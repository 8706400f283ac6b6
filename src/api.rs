use {
    super::*,
    axum::extract::{Path, State},
    http_server::error::{OptionExt, ServerError, ServerResult},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CurrentBlock {
    pub(crate) number: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Stats {
    #[serde(flatten)]
    pub(crate) summary: StatsSummary,
    pub(crate) share_difficulty: u64,
    pub(crate) best_share_difficulty: Option<f64>,
    pub(crate) connected_miners: usize,
    pub(crate) current_work: Option<Work>,
}

#[derive(Clone)]
pub(crate) struct Api {
    pub(crate) node: Arc<dyn Node>,
    pub(crate) store: Arc<Store>,
    pub(crate) work_manager: Arc<WorkManager>,
    pub(crate) collector: Arc<Collector>,
}

pub(crate) fn router(api: Api) -> Router {
    Router::new()
        .route("/api/v1/currentBlock", get(current_block))
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/blocks", get(blocks))
        .route("/api/v1/blocks/{hash}", get(block))
        .route("/api/v1/bestShares", get(best_shares))
        .with_state(api)
}

async fn current_block(State(api): State<Api>) -> ServerResult<Json<CurrentBlock>> {
    Ok(Json(CurrentBlock {
        number: api.node.block_number().await?,
    }))
}

async fn stats(State(api): State<Api>) -> ServerResult<Json<Stats>> {
    let best = api.work_manager.best_share_target();

    Ok(Json(Stats {
        summary: api.collector.summary()?,
        share_difficulty: api.work_manager.share_difficulty().as_u64(),
        best_share_difficulty: (best != Target::MAX).then(|| best.difficulty()),
        connected_miners: api.work_manager.subscriber_count(),
        current_work: api.work_manager.current_work(false),
    }))
}

async fn blocks(State(api): State<Api>) -> ServerResult<Json<Vec<BlockRecord>>> {
    Ok(Json(api.store.blocks()?))
}

async fn block(
    State(api): State<Api>,
    Path(hash): Path<String>,
) -> ServerResult<Json<BlockRecord>> {
    let hash = hash
        .parse::<Hash>()
        .map_err(|err| ServerError::BadRequest(format!("invalid block hash {hash}: {err}")))?;

    Ok(Json(
        api.store
            .blocks()?
            .into_iter()
            .find(|block| block.hash == hash)
            .ok_or_not_found(|| format!("block {hash}"))?,
    ))
}

async fn best_shares(State(api): State<Api>) -> ServerResult<Json<Vec<BestShare>>> {
    Ok(Json(api.store.best_shares()?))
}
