use crate::error::Result;
use crate::item::{DeckId, DeckSummary, ItemId, ReviewItem, Word, WordId, WordRecord};

/// Durable keyed storage for decks, words and review items.
///
/// Implementations must be safe to share between threads. `put_item` must be
/// atomic per item, `create_item` and `insert_word` idempotent on their
/// natural keys, and `query_due` ordered by `next_review` then creation order.
pub trait ItemStore: Send + Sync {
    /// Fails with `DeckExists` when the name is taken.
    fn create_deck(&self, name: &str) -> Result<DeckId>;

    fn find_deck(&self, name: &str) -> Result<Option<DeckId>>;

    /// Removes the deck with all of its words and review items.
    fn delete_deck(&self, deck: DeckId) -> Result<()>;

    /// Every deck, oldest first, with word counts evaluated at `now`.
    fn decks(&self, now: i64) -> Result<Vec<DeckSummary>>;

    /// Returns the existing id when a word with the same native, phonetic and
    /// translated text is already in the deck.
    fn insert_word(&self, deck: DeckId, word: &Word) -> Result<WordId>;

    fn get_word(&self, word: WordId) -> Result<WordRecord>;

    fn get_item(&self, item: ItemId) -> Result<ReviewItem>;

    /// Overwrites the schedule of an existing item.
    fn put_item(&self, item: &ReviewItem) -> Result<()>;

    /// Items of `deck` with `next_review <= now` or still New, soonest first,
    /// at most `limit` of them.
    fn query_due(&self, deck: DeckId, now: i64, limit: usize) -> Result<Vec<ReviewItem>>;

    /// Creates a New item for the prompt, or returns the one that exists.
    fn create_item(&self, word: WordId, question: &str) -> Result<ItemId>;
}
