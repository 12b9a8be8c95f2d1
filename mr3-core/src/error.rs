use thiserror::Error;

#[derive(Error, Debug)]
pub enum Mr3Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid number for '{field}' on line {line}: {value:?}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        line: usize,
    },

    #[error("Unknown {kind} ordinal: {id}")]
    UnknownOrdinal { kind: &'static str, id: u32 },

    #[error("Unknown region: {0:?}")]
    UnknownRegion(String),

    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("No wiki data for {monster}: {reason}")]
    MissingWikiData { monster: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Mr3Error>;
