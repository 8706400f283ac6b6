use super::*;

pub type Result<T = (), E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    #[snafu(display("I/O error at {}", path.display()))]
    Io { path: PathBuf, source: io::Error },

    #[snafu(display("database error at {}", path.display()))]
    Database {
        path: PathBuf,
        source: rocksdb::Error,
    },

    #[snafu(display("failed to encode record {key}"))]
    Serialization {
        key: String,
        source: serde_json::Error,
    },

    #[snafu(display("corrupted record {key}: {reason}"))]
    Corrupted { key: String, reason: String },
}

impl StoreError {
    pub fn is_corrupted(&self) -> bool {
        matches!(self, Self::Corrupted { .. })
    }
}
