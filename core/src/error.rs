use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed document in collection '{collection}': {source}")]
    MalformedDocument {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Document in collection '{collection}' has no string key field '{field}'")]
    MissingKey { collection: String, field: String },

    #[error("Unknown collection '{name}'")]
    UnknownCollection { name: String },

    #[error("Field '{field}' in collection '{collection}' is not a decimal")]
    NotDecimal { collection: String, field: String },

    #[error("Conflicting lock config for job {job}: read and write locks both requested")]
    ConflictingLockConfig { job: String },

    #[error("{mode} lock on '{resource}' refused: held by {holder}")]
    LockHeld {
        resource: String,
        mode: &'static str,
        holder: String,
    },

    #[error("Transaction still conflicting after {attempts} attempts: {source}")]
    CommitConflict {
        attempts: u32,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ReconResult<T> = Result<T, ReconError>;
