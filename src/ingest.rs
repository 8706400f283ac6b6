use {
    super::*,
    axum::{body::Bytes, extract::State, http::Method},
};

#[derive(Deserialize)]
struct OpenEthereumNotification {
    result: Vec<String>,
}

#[derive(Clone)]
struct Ingest {
    work_manager: Arc<WorkManager>,
    dialect: NodeDialect,
}

/// Receives the node's pushed work notifications. The node does not care
/// about the answer, so every request gets a 200.
pub(crate) fn router(work_manager: Arc<WorkManager>, dialect: NodeDialect) -> Router {
    Router::new().fallback(notify).with_state(Ingest {
        work_manager,
        dialect,
    })
}

async fn notify(State(ingest): State<Ingest>, method: Method, body: Bytes) {
    if method != Method::POST {
        debug!("Ignoring {method} work notification");
        return;
    }

    match parse_work(ingest.dialect, &body) {
        Ok(work) => {
            ingest.work_manager.ingest(work);
        }
        Err(err) => warn!(
            "Ignoring malformed {} work notification: {err:#}",
            ingest.dialect
        ),
    }
}

pub(crate) fn parse_work(dialect: NodeDialect, body: &[u8]) -> Result<Work> {
    let fields = match dialect {
        NodeDialect::Geth => serde_json::from_slice::<Vec<String>>(body)?,
        NodeDialect::OpenEthereum => {
            serde_json::from_slice::<OpenEthereumNotification>(body)?.result
        }
    };

    Ok(Work::from_fields(fields.as_slice())?)
}
