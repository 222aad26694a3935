//! SQLite-backed [`ItemStore`].
//!
//! All decks share one set of tables keyed by `deck_id`; the due query is
//! served by the `(deck_id, next_review)` index. Every call runs under the
//! store's [`RetryPolicy`], so lock contention from other connections is
//! retried with backoff and surfaces as `StoreUnavailable` once exhausted.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use snafu::ResultExt;

use crate::error::{
    DatabaseSnafu, DeckExistsSnafu, Result, SchedulerError, StoreCorruptSnafu, UnknownDeckSnafu,
    UnknownItemSnafu, UnknownWordSnafu,
};
use crate::item::{
    DeckId, DeckSummary, ItemId, ReviewItem, State, Word, WordId, WordRecord,
};
use crate::retry::RetryPolicy;
use crate::store::ItemStore;

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS decks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS words (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deck_id INTEGER NOT NULL REFERENCES decks (id) ON DELETE CASCADE,
        native TEXT NOT NULL,
        phonetic TEXT NOT NULL,
        translated TEXT NOT NULL,
        is_phonetic INTEGER NOT NULL,
        UNIQUE (deck_id, native, phonetic, translated)
    );

    CREATE TABLE IF NOT EXISTS review_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deck_id INTEGER NOT NULL REFERENCES decks (id) ON DELETE CASCADE,
        word_id INTEGER NOT NULL REFERENCES words (id) ON DELETE CASCADE,
        question TEXT NOT NULL,
        state INTEGER NOT NULL,
        difficulty REAL NOT NULL,
        stability REAL NOT NULL,
        retrievability REAL NOT NULL,
        reps INTEGER NOT NULL,
        lapses INTEGER NOT NULL,
        scheduled_days INTEGER NOT NULL,
        next_review INTEGER NOT NULL,
        last_review INTEGER NOT NULL,
        UNIQUE (word_id, question)
    );

    CREATE INDEX IF NOT EXISTS review_items_due ON review_items (deck_id, next_review);
";

const ITEM_COLUMNS: &str = "id, deck_id, word_id, question, state, difficulty, stability, \
     retrievability, reps, lapses, scheduled_days, next_review, last_review";

/// A review item as stored, before its values are checked.
#[derive(Debug, Clone, PartialEq)]
struct ItemRow {
    id: i64,
    deck_id: i64,
    word_id: i64,
    question: String,
    state: i64,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    reps: i64,
    lapses: i64,
    scheduled_days: i64,
    next_review: i64,
    last_review: i64,
}

impl TryFrom<&Row<'_>> for ItemRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ItemRow {
            id: row.get(0)?,
            deck_id: row.get(1)?,
            word_id: row.get(2)?,
            question: row.get(3)?,
            state: row.get(4)?,
            difficulty: row.get(5)?,
            stability: row.get(6)?,
            retrievability: row.get(7)?,
            reps: row.get(8)?,
            lapses: row.get(9)?,
            scheduled_days: row.get(10)?,
            next_review: row.get(11)?,
            last_review: row.get(12)?,
        })
    }
}

fn counter(id: i64, name: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        StoreCorruptSnafu {
            reason: format!("item {id} has {name} = {value}"),
        }
        .build()
    })
}

impl TryFrom<ItemRow> for ReviewItem {
    type Error = SchedulerError;

    fn try_from(row: ItemRow) -> Result<Self> {
        let state = u8::try_from(row.state)
            .ok()
            .and_then(State::from_repr)
            .ok_or_else(|| {
                StoreCorruptSnafu {
                    reason: format!("item {} has unknown state {}", row.id, row.state),
                }
                .build()
            })?;
        let item = ReviewItem {
            id: ItemId(row.id),
            deck_id: DeckId(row.deck_id),
            word_id: WordId(row.word_id),
            state,
            difficulty: row.difficulty,
            stability: row.stability,
            retrievability: row.retrievability,
            reps: counter(row.id, "reps", row.reps)?,
            lapses: counter(row.id, "lapses", row.lapses)?,
            scheduled_days: counter(row.id, "scheduled_days", row.scheduled_days)?,
            next_review: row.next_review,
            last_review: row.last_review,
            question: row.question,
        };
        item.check_invariants()?;
        Ok(item)
    }
}

fn word_from_row(row: &Row<'_>) -> rusqlite::Result<WordRecord> {
    Ok(WordRecord {
        id: WordId(row.get(0)?),
        deck_id: DeckId(row.get(1)?),
        word: Word {
            native: row.get(2)?,
            phonetic: row.get(3)?,
            translated: row.get(4)?,
            is_phonetic: row.get(5)?,
        },
    })
}

fn collect_items(rows: Vec<ItemRow>) -> Result<Vec<ReviewItem>> {
    rows.into_iter().map(ReviewItem::try_from).collect()
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
    retry: RetryPolicy,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>, retry: RetryPolicy) -> Result<Self> {
        let conn = Connection::open(path).context(DatabaseSnafu)?;
        Self::from_connection(conn, retry)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context(DatabaseSnafu)?;
        Self::from_connection(conn, RetryPolicy::default())
    }

    /// Takes ownership of `conn` and creates any missing tables.
    pub fn from_connection(conn: Connection, retry: RetryPolicy) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            retry,
        };
        store.retry.run("initialize schema", || {
            store.conn().execute_batch(SCHEMA).context(DatabaseSnafu)
        })?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ItemStore for SqliteStore {
    fn create_deck(&self, name: &str) -> Result<DeckId> {
        self.retry.run("create deck", || {
            let conn = self.conn();
            let inserted = conn
                .execute(
                    "INSERT INTO decks (name, created_at) VALUES (?1, ?2)
                     ON CONFLICT (name) DO NOTHING",
                    params![name, chrono::Utc::now().timestamp_millis()],
                )
                .context(DatabaseSnafu)?;
            if inserted == 0 {
                return DeckExistsSnafu { name }.fail();
            }
            Ok(DeckId(conn.last_insert_rowid()))
        })
    }

    fn find_deck(&self, name: &str) -> Result<Option<DeckId>> {
        self.retry.run("find deck", || {
            self.conn()
                .query_row("SELECT id FROM decks WHERE name = ?1", [name], |row| {
                    row.get(0).map(DeckId)
                })
                .optional()
                .context(DatabaseSnafu)
        })
    }

    fn delete_deck(&self, deck: DeckId) -> Result<()> {
        self.retry.run("delete deck", || {
            let mut conn = self.conn();
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .context(DatabaseSnafu)?;
            tx.execute("DELETE FROM review_items WHERE deck_id = ?1", [deck.0])
                .context(DatabaseSnafu)?;
            tx.execute("DELETE FROM words WHERE deck_id = ?1", [deck.0])
                .context(DatabaseSnafu)?;
            let removed = tx
                .execute("DELETE FROM decks WHERE id = ?1", [deck.0])
                .context(DatabaseSnafu)?;
            if removed == 0 {
                return UnknownDeckSnafu { id: deck }.fail();
            }
            tx.commit().context(DatabaseSnafu)
        })
    }

    fn decks(&self, now: i64) -> Result<Vec<DeckSummary>> {
        self.retry.run("list decks", || {
            let conn = self.conn();
            let mut stmt = conn
                .prepare_cached(
                    "SELECT d.id, d.name, d.created_at,
                        (SELECT COUNT(*) FROM words w WHERE w.deck_id = d.id),
                        (SELECT COUNT(DISTINCT i.word_id) FROM review_items i
                         WHERE i.deck_id = d.id AND (i.next_review <= ?1 OR i.state = ?2))
                     FROM decks d
                     ORDER BY d.created_at ASC, d.id ASC",
                )
                .context(DatabaseSnafu)?;
            stmt.query_map(params![now, State::New as u8], |row| {
                let total: i64 = row.get(3)?;
                let due: i64 = row.get(4)?;
                Ok(DeckSummary {
                    id: DeckId(row.get(0)?),
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                    total_words: total.max(0) as usize,
                    memorized_words: (total - due).max(0) as usize,
                })
            })
            .context(DatabaseSnafu)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context(DatabaseSnafu)
        })
    }

    fn insert_word(&self, deck: DeckId, word: &Word) -> Result<WordId> {
        self.retry.run("insert word", || {
            let mut conn = self.conn();
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .context(DatabaseSnafu)?;
            let deck_exists: bool = tx
                .query_row(
                    "SELECT EXISTS (SELECT 1 FROM decks WHERE id = ?1)",
                    [deck.0],
                    |row| row.get(0),
                )
                .context(DatabaseSnafu)?;
            if !deck_exists {
                return UnknownDeckSnafu { id: deck }.fail();
            }
            let inserted = tx
                .execute(
                    "INSERT INTO words (deck_id, native, phonetic, translated, is_phonetic)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (deck_id, native, phonetic, translated) DO NOTHING",
                    params![
                        deck.0,
                        word.native,
                        word.phonetic,
                        word.translated,
                        word.is_phonetic
                    ],
                )
                .context(DatabaseSnafu)?;
            let id: i64 = tx
                .query_row(
                    "SELECT id FROM words
                     WHERE deck_id = ?1 AND native = ?2 AND phonetic = ?3 AND translated = ?4",
                    params![deck.0, word.native, word.phonetic, word.translated],
                    |row| row.get(0),
                )
                .context(DatabaseSnafu)?;
            tx.commit().context(DatabaseSnafu)?;
            if inserted == 0 {
                debug!("word `{}` already in deck {deck}", word.native);
            }
            Ok(WordId(id))
        })
    }

    fn get_word(&self, word: WordId) -> Result<WordRecord> {
        self.retry.run("get word", || {
            self.conn()
                .query_row(
                    "SELECT id, deck_id, native, phonetic, translated, is_phonetic
                     FROM words WHERE id = ?1",
                    [word.0],
                    word_from_row,
                )
                .optional()
                .context(DatabaseSnafu)?
                .ok_or_else(|| UnknownWordSnafu { id: word }.build())
        })
    }

    fn get_item(&self, item: ItemId) -> Result<ReviewItem> {
        self.retry.run("get item", || {
            let row = self
                .conn()
                .query_row(
                    &format!("SELECT {ITEM_COLUMNS} FROM review_items WHERE id = ?1"),
                    [item.0],
                    |row| ItemRow::try_from(row),
                )
                .optional()
                .context(DatabaseSnafu)?;
            match row {
                Some(row) => ReviewItem::try_from(row),
                None => UnknownItemSnafu { id: item }.fail(),
            }
        })
    }

    fn put_item(&self, item: &ReviewItem) -> Result<()> {
        self.retry.run("put item", || {
            let updated = self
                .conn()
                .execute(
                    "UPDATE review_items
                     SET state = ?1, difficulty = ?2, stability = ?3, retrievability = ?4,
                         reps = ?5, lapses = ?6, scheduled_days = ?7, next_review = ?8,
                         last_review = ?9
                     WHERE id = ?10",
                    params![
                        item.state as u8,
                        item.difficulty,
                        item.stability,
                        item.retrievability,
                        item.reps,
                        item.lapses,
                        item.scheduled_days,
                        item.next_review,
                        item.last_review,
                        item.id.0
                    ],
                )
                .context(DatabaseSnafu)?;
            if updated == 0 {
                return UnknownItemSnafu { id: item.id }.fail();
            }
            Ok(())
        })
    }

    fn query_due(&self, deck: DeckId, now: i64, limit: usize) -> Result<Vec<ReviewItem>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = self.retry.run("query due items", || {
            let conn = self.conn();
            let mut stmt = conn
                .prepare_cached(&format!(
                    "SELECT {ITEM_COLUMNS} FROM review_items
                     WHERE deck_id = ?1 AND (next_review <= ?2 OR state = ?3)
                     ORDER BY next_review ASC, id ASC
                     LIMIT ?4"
                ))
                .context(DatabaseSnafu)?;
            stmt.query_map(params![deck.0, now, State::New as u8, limit], |row| {
                ItemRow::try_from(row)
            })
            .context(DatabaseSnafu)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context(DatabaseSnafu)
        })?;
        collect_items(rows)
    }

    fn create_item(&self, word: WordId, question: &str) -> Result<ItemId> {
        self.retry.run("create item", || {
            let mut conn = self.conn();
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .context(DatabaseSnafu)?;
            let deck: i64 = tx
                .query_row("SELECT deck_id FROM words WHERE id = ?1", [word.0], |row| {
                    row.get(0)
                })
                .optional()
                .context(DatabaseSnafu)?
                .ok_or_else(|| UnknownWordSnafu { id: word }.build())?;
            let fresh = ReviewItem::new(ItemId(0), DeckId(deck), word, question);
            let inserted = tx
                .execute(
                    "INSERT INTO review_items (
                        deck_id, word_id, question, state, difficulty, stability,
                        retrievability, reps, lapses, scheduled_days, next_review, last_review
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT (word_id, question) DO NOTHING",
                    params![
                        deck,
                        word.0,
                        fresh.question,
                        fresh.state as u8,
                        fresh.difficulty,
                        fresh.stability,
                        fresh.retrievability,
                        fresh.reps,
                        fresh.lapses,
                        fresh.scheduled_days,
                        fresh.next_review,
                        fresh.last_review
                    ],
                )
                .context(DatabaseSnafu)?;
            let id: i64 = tx
                .query_row(
                    "SELECT id FROM review_items WHERE word_id = ?1 AND question = ?2",
                    params![word.0, question],
                    |row| row.get(0),
                )
                .context(DatabaseSnafu)?;
            tx.commit().context(DatabaseSnafu)?;
            if inserted == 0 {
                debug!("review item for word {word} / `{question}` already exists");
            }
            Ok(ItemId(id))
        })
    }
}
