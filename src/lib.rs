mod config;
mod error;
mod export;
mod import;
mod inference;
mod item;
mod memory_store;
mod model;
mod parameter_clipper;
mod provisioning;
mod retry;
mod service;
mod session;
mod sqlite_store;
mod store;
#[cfg(test)]
mod test_helpers;

pub use config::Config;
pub use error::{Result, SchedulerError};
pub use export::{MissedAnswer, export_missed_answers, write_missed_answers};
pub use import::{deck_name, is_phonetic_script, load_words, read_words};
pub use inference::NextStates;
pub use item::{
    DAY_MS, DeckId, DeckSummary, ItemId, PromptKind, Rating, ReviewItem, ScheduleFields, State,
    Word, WordId, WordRecord,
};
pub use memory_store::MemoryStore;
pub use model::{
    DEFAULT_MAXIMUM_INTERVAL, DEFAULT_PARAMETERS, DEFAULT_REQUEST_RETENTION, FSRS,
    PARAMETER_COUNT, Parameters, SchedulerConfig, retrievability,
};
pub use provisioning::{
    ImportSummary, add_word, import_deck, import_file, import_words, prompt_variants,
};
pub use retry::RetryPolicy;
pub use service::{ReviewService, parse_rating_label};
pub use session::{DEFAULT_BATCH_SIZE, DueCard, due_batch, due_items};
pub use sqlite_store::SqliteStore;
pub use store::ItemStore;
