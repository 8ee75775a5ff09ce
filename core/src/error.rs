use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A malformed source record. During a build this is logged and the file
    /// is skipped; it never aborts the pass.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An index artifact could not be read or written. Fatal for the
    /// operation that attempted it.
    #[error("storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An index artifact contained bytes that do not decode as the expected
    /// structure.
    #[error("corrupt index artifact {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A malformed query filter, e.g. a non-positive duration. The query is
    /// rejected; nothing crashes.
    #[error("invalid query: {0}")]
    Query(String),
}

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage { path: path.into(), source }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Corrupt { path: path.into(), source }
    }
}
