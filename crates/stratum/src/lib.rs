use {
    derive_more::Display,
    primitive_types::{U256, U512},
    serde::{
        Deserialize, Serialize, Serializer,
        de::{self, Deserializer},
        ser::{SerializeSeq, SerializeStruct},
    },
    serde_json::Value,
    serde_with::{DeserializeFromStr, SerializeDisplay},
    snafu::{ResultExt, Snafu, ensure},
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

pub use {
    block_number::BlockNumber,
    difficulty::Difficulty,
    error::{ParseError, Result, StratumError},
    hash::Hash,
    hash_rate::HashRate,
    message::{Id, Message},
    nonce::Nonce,
    si::{Si, format_si, parse_si},
    submit_hashrate::SubmitHashrate,
    submit_login::SubmitLogin,
    submit_work::SubmitWork,
    target::Target,
    work::Work,
};

pub const JSONRPC_VERSION: &str = "2.0";

mod block_number;
mod difficulty;
mod error;
mod hash;
mod hash_rate;
mod message;
mod nonce;
mod si;
mod submit_hashrate;
mod submit_login;
mod submit_work;
mod target;
mod work;

fn strip_hex_prefix(s: &str) -> Result<&str> {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| ParseError::MissingPrefix {
            input: s.to_string(),
        })
}

fn hex_integer_digits(s: &str) -> Result<&str> {
    let digits = strip_hex_prefix(s)?;

    ensure!(
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit()),
        error::IntegerSnafu { input: s }
    );

    Ok(digits)
}
