use {
    super::*,
    futures::{SinkExt, StreamExt},
    tokio::{
        io::{AsyncRead, AsyncWrite},
        time::error::Elapsed,
    },
    tokio_util::codec::{FramedRead, FramedWrite, LinesCodec},
};

use codec::{Line, MinerCodec};

mod codec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum State {
    Unauthenticated,
    Authenticated { worker: String },
    Closed,
}

/// One miner speaking EthProxy stratum. Until the miner logs in only
/// `eth_submitLogin` is accepted; afterwards new jobs are pushed as they
/// arrive from the work manager.
pub(crate) struct Connection<R, W> {
    gateway: Arc<Gateway>,
    peer: SocketAddr,
    reader: FramedRead<R, MinerCodec>,
    writer: FramedWrite<W, LinesCodec>,
    cancel_token: CancellationToken,
    state: State,
    subscription: Option<Subscription>,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub(crate) fn new(
        gateway: Arc<Gateway>,
        peer: SocketAddr,
        reader: R,
        writer: W,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            peer,
            reader: FramedRead::new(reader, MinerCodec::new(MAX_MESSAGE_SIZE)),
            writer: FramedWrite::new(writer, LinesCodec::new()),
            cancel_token,
            state: State::Unauthenticated,
            subscription: None,
        }
    }

    pub(crate) async fn serve(mut self) -> Result {
        let result = self.run().await;

        if let Some(subscription) = self.subscription.take() {
            self.gateway.work_manager.unsubscribe(subscription.id);
        }

        if let State::Authenticated { worker } = &self.state {
            info!("Worker {worker} at {} disconnected", self.peer);
        }

        self.state = State::Closed;

        result
    }

    async fn run(&mut self) -> Result {
        loop {
            let deadline = match self.state {
                State::Unauthenticated => Some(self.gateway.login_timeout),
                State::Authenticated { .. } => None,
                State::Closed => break,
            };

            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    debug!("Closing connection with {} on shutdown", self.peer);
                    break;
                }
                Some(work) = next_work(&mut self.subscription) => {
                    self.send(Message::work_notification(&work)).await?;
                }
                line = read_line(&mut self.reader, deadline) => {
                    let Ok(line) = line else {
                        info!("Login timeout for {}", self.peer);
                        break;
                    };

                    let open = match line {
                        Some(Ok(Line::Text(line))) => self.handle_line(&line).await?,
                        Some(Ok(Line::NotUtf8)) => {
                            warn!("Non UTF-8 line from {}", self.peer);
                            self.reject_line().await?
                        }
                        Some(Ok(Line::TooLong)) => {
                            warn!("Line over {MAX_MESSAGE_SIZE} bytes from {}", self.peer);
                            self.reject_line().await?
                        }
                        Some(Err(err)) => {
                            warn!("Read error from {}: {err}", self.peer);
                            break;
                        }
                        None => break,
                    };

                    if !open {
                        self.state = State::Closed;
                    }
                }
            }
        }

        Ok(())
    }

    /// Answers one line from the miner. Returns false when the connection
    /// must be closed.
    async fn handle_line(&mut self, line: &str) -> Result<bool> {
        let Ok(Message::Request {
            id, method, params, ..
        }) = serde_json::from_str::<Message>(line)
        else {
            warn!("Invalid JSONRPC request from {}", self.peer);
            return self.reject_line().await;
        };

        let worker = match &self.state {
            State::Authenticated { worker } => worker.clone(),
            State::Unauthenticated if method == "eth_submitLogin" => {
                return self.login(id, params).await;
            }
            State::Unauthenticated => {
                debug!("{method} from unauthenticated {}", self.peer);
                self.send(StratumError::Unauthorized.into_response(id))
                    .await?;
                return Ok(false);
            }
            State::Closed => return Ok(false),
        };

        match method.as_str() {
            "eth_getWork" => self.get_work(id).await?,
            "eth_submitWork" => self.submit_work(id, params, &worker).await?,
            "eth_submitHashrate" => self.submit_hashrate(id, params, &worker).await?,
            method => {
                debug!("Unknown method {method} from {worker}");
                self.send(StratumError::MethodNotFound.into_response(id))
                    .await?;
            }
        }

        Ok(true)
    }

    /// Answers a line that is not a request. Only authenticated miners get
    /// to keep the connection.
    async fn reject_line(&mut self) -> Result<bool> {
        self.send(StratumError::InvalidRequest.into_response(Id::Null))
            .await?;
        Ok(self.is_authenticated())
    }

    async fn login(&mut self, id: Id, params: Value) -> Result<bool> {
        let Ok(login) = serde_json::from_value::<SubmitLogin>(params) else {
            warn!("Malformed login from {}", self.peer);
            self.send(StratumError::InvalidCredentials.into_response(id))
                .await?;
            return Ok(false);
        };

        if login.password != self.gateway.password {
            warn!("Invalid password for {} from {}", login.worker, self.peer);
            self.send(StratumError::InvalidCredentials.into_response(id))
                .await?;
            return Ok(false);
        }

        info!("Authenticated worker {} from {}", login.worker, self.peer);

        self.send(Message::response(id, true)).await?;

        self.subscription = Some(self.gateway.work_manager.subscribe());
        self.state = State::Authenticated {
            worker: login.worker,
        };

        Ok(true)
    }

    async fn get_work(&mut self, id: Id) -> Result {
        let message = match self.gateway.work_manager.current_work(true) {
            Some(work) => Message::response(id, work),
            None => StratumError::NoWork.into_response(id),
        };

        self.send(message).await
    }

    async fn submit_work(&mut self, id: Id, params: Value, worker: &str) -> Result {
        let Ok(submission) = serde_json::from_value::<SubmitWork>(params) else {
            debug!("Malformed share from {worker}");
            return self
                .send(StratumError::InvalidParameters.into_response(id))
                .await;
        };

        let verdict = self
            .gateway
            .validator
            .validate(&submission, worker, self.peer.ip())
            .await;

        if let Ok(classification) = verdict {
            debug!("Received {classification} share from {worker}");
        }

        let message = match verdict {
            Ok(Classification::Valid | Classification::Stale) => Message::response(id, true),
            Ok(Classification::Invalid) => StratumError::InvalidShare.into_response(id),
            Err(err) => err.into_response(id),
        };

        self.send(message).await
    }

    async fn submit_hashrate(&mut self, id: Id, params: Value, worker: &str) -> Result {
        match SubmitHashrate::from_params(&params) {
            Ok(report) => {
                self.gateway
                    .collector
                    .record_hashrate(worker, self.peer.ip(), report.hashrate)
            }
            Err(err) => debug!("Ignoring hashrate report from {worker}: {err}"),
        }

        self.send(Message::response(id, true)).await
    }

    fn is_authenticated(&self) -> bool {
        matches!(self.state, State::Authenticated { .. })
    }

    async fn send(&mut self, message: Message) -> Result {
        let frame = serde_json::to_string(&message)?;
        self.writer
            .send(frame)
            .await
            .with_context(|| format!("failed to write to {}", self.peer))?;
        Ok(())
    }
}

async fn next_work(subscription: &mut Option<Subscription>) -> Option<Work> {
    match subscription {
        Some(subscription) => subscription.receiver.recv().await,
        None => std::future::pending().await,
    }
}

async fn read_line<R: AsyncRead + Unpin>(
    reader: &mut FramedRead<R, MinerCodec>,
    deadline: Option<Duration>,
) -> Result<Option<io::Result<Line>>, Elapsed> {
    match deadline {
        Some(deadline) => timeout(deadline, reader.next()).await,
        None => Ok(reader.next().await),
    }
}
