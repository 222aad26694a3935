use std::path::PathBuf;

use rusqlite::ErrorCode;
use snafu::Snafu;

use crate::item::{DeckId, ItemId, WordId};

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum SchedulerError {
    #[snafu(display("`{value}` is not a rating (expected Forgot, Hard, Good or Easy)"))]
    InvalidRating { value: String },
    #[snafu(display("review item {id} not found"))]
    UnknownItem { id: ItemId },
    #[snafu(display("word {id} not found"))]
    UnknownWord { id: WordId },
    #[snafu(display("deck {id} not found"))]
    UnknownDeck { id: DeckId },
    #[snafu(display("a deck named `{name}` already exists"))]
    DeckExists { name: String },
    #[snafu(display("store still unavailable after {attempts} attempts"))]
    StoreUnavailable { attempts: u32 },
    #[snafu(display("corrupt review record: {reason}"))]
    StoreCorrupt { reason: String },
    #[snafu(display("invalid scheduler parameters: {reason}"))]
    InvalidParameters { reason: String },
    #[snafu(display("database error: {source}"))]
    Database { source: rusqlite::Error },
    #[snafu(display("csv error: {source}"))]
    Csv { source: csv::Error },
    #[snafu(display("cannot read {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot read vocabulary input: {source}"))]
    Read { source: std::io::Error },
    #[snafu(display("invalid configuration: {source}"))]
    Config { source: serde_json::Error },
}

impl SchedulerError {
    /// Lock contention on the database; worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Database {
                source: rusqlite::Error::SqliteFailure(err, _),
            } => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

pub type Result<T, E = SchedulerError> = std::result::Result<T, E>;
