use super::*;

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub))]
pub enum ParseError {
    #[snafu(display("missing 0x prefix in '{input}'"))]
    MissingPrefix { input: String },

    #[snafu(display("invalid hex string '{input}': {source}"))]
    Hex {
        input: String,
        source: hex::FromHexError,
    },

    #[snafu(display("invalid hex integer '{input}'"))]
    Integer { input: String },

    #[snafu(display("expected {expected} hex digits but got {actual} in '{input}'"))]
    Length {
        input: String,
        expected: usize,
        actual: usize,
    },

    #[snafu(display("expected {expected} fields but got {actual}"))]
    FieldCount { expected: usize, actual: usize },

    #[snafu(display("invalid value: {reason}"))]
    InvalidValue { reason: String },
}

/// Errors reported to miners. EthProxy carries the error as a bare string in
/// the `error` field of the response, so the display text is the wire format.
#[derive(Debug, Clone, Copy, Snafu, PartialEq, Eq)]
pub enum StratumError {
    #[snafu(display("Invalid JSONRPC Request"))]
    InvalidRequest,

    #[snafu(display("Unauthorized"))]
    Unauthorized,

    #[snafu(display("Invalid Parameters"))]
    InvalidParameters,

    #[snafu(display("Invalid credentials"))]
    InvalidCredentials,

    #[snafu(display("Work is outdated, or not requested"))]
    WorkNotRequested,

    #[snafu(display("Provided POW solution is invalid"))]
    InvalidShare,

    #[snafu(display("No work available yet"))]
    NoWork,

    #[snafu(display("Method not found"))]
    MethodNotFound,
}

impl StratumError {
    /// The `result` value sent alongside the error. Rejected shares answer
    /// `false`, everything else `null`.
    pub fn result(self) -> Value {
        match self {
            Self::InvalidShare => Value::Bool(false),
            _ => Value::Null,
        }
    }

    pub fn into_response(self, id: Id) -> Message {
        Message::Response {
            id,
            result: self.result(),
            error: Some(self.to_string()),
        }
    }
}
