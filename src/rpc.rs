use super::*;

/// JSON-RPC 2.0 over HTTP. Transport failures, non-2xx statuses and
/// `error` members all come back as errors; nothing is retried.
#[derive(Debug)]
pub(crate) struct RpcClient {
    client: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl RpcClient {
    pub(crate) fn new(url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    pub(crate) fn url(&self) -> &Url {
        &self.url
    }

    pub(crate) async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request = Message::Request {
            id: Id::Number(self.next_id.fetch_add(1, Ordering::Relaxed)),
            method: method.into(),
            params,
            worker: None,
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .with_context(|| format!("failed to send {method} to {}", self.url))?
            .error_for_status()
            .with_context(|| format!("{method} rejected by {}", self.url))?;

        let message = response
            .json::<Message>()
            .await
            .with_context(|| format!("failed to decode {method} response"))?;

        let Message::Response { result, error, .. } = message else {
            bail!("expected a response to {method}, got a request");
        };

        if let Some(error) = error {
            bail!("{method} failed: {error}");
        }

        serde_json::from_value(result).with_context(|| format!("unexpected {method} result"))
    }
}
