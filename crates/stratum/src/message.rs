use super::*;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Clone)]
#[serde(untagged)]
pub enum Id {
    #[display("null")]
    Null,
    Number(u64),
    String(String),
}

/// A line of EthProxy stratum. Miners send requests, the gateway answers
/// with responses and pushes new work as responses with `id: 0`.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request {
        id: Id,
        method: String,
        params: Value,
        worker: Option<String>,
    },
    Response {
        id: Id,
        result: Value,
        error: Option<String>,
    },
}

impl Message {
    pub fn response(id: Id, result: impl Serialize) -> Self {
        Self::Response {
            id,
            result: serde_json::to_value(result).unwrap_or(Value::Null),
            error: None,
        }
    }

    pub fn work_notification(work: &Work) -> Self {
        Self::response(Id::Number(0), work)
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Request {
                id,
                method,
                params,
                worker,
            } => {
                let len = if worker.is_some() { 5 } else { 4 };
                let mut state = serializer.serialize_struct("Request", len)?;
                state.serialize_field("id", id)?;
                state.serialize_field("jsonrpc", JSONRPC_VERSION)?;
                state.serialize_field("method", method)?;
                state.serialize_field("params", params)?;
                if let Some(worker) = worker {
                    state.serialize_field("worker", worker)?;
                }
                state.end()
            }
            Self::Response { id, result, error } => {
                let mut state = serializer.serialize_struct("Response", 4)?;
                state.serialize_field("id", id)?;
                state.serialize_field("jsonrpc", JSONRPC_VERSION)?;
                state.serialize_field("result", result)?;
                state.serialize_field("error", error)?;
                state.end()
            }
        }
    }
}

/// Miners are sloppy about `jsonrpc`, `id` and `params`, so only `method`
/// (requests) or `result`/`error` (responses) are required.
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        let Value::Object(mut object) = value else {
            return Err(de::Error::custom("expected a JSON object"));
        };

        let id = match object.remove("id") {
            Some(id) => serde_json::from_value(id).map_err(de::Error::custom)?,
            None => Id::Null,
        };

        if let Some(method) = object.remove("method") {
            let Value::String(method) = method else {
                return Err(de::Error::custom("method must be a string"));
            };

            let params = match object.remove("params") {
                None | Some(Value::Null) => Value::Array(Vec::new()),
                Some(params) => params,
            };

            let worker = match object.remove("worker") {
                Some(Value::String(worker)) => Some(worker),
                _ => None,
            };

            Ok(Message::Request {
                id,
                method,
                params,
                worker,
            })
        } else if object.contains_key("result") || object.contains_key("error") {
            let result = object.remove("result").unwrap_or(Value::Null);

            let error = match object.remove("error") {
                None | Some(Value::Null) => None,
                Some(Value::String(error)) => Some(error),
                Some(other) => Some(other.to_string()),
            };

            Ok(Message::Response { id, result, error })
        } else {
            Err(de::Error::custom("unknown message format"))
        }
    }
}
