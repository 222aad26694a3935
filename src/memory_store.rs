use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use itertools::Itertools;
use log::debug;
use priority_queue::PriorityQueue;

use crate::error::{
    DeckExistsSnafu, Result, UnknownDeckSnafu, UnknownItemSnafu, UnknownWordSnafu,
};
use crate::item::{DeckId, DeckSummary, ItemId, ReviewItem, Word, WordId, WordRecord};
use crate::store::ItemStore;

#[derive(Debug)]
struct DeckRow {
    id: DeckId,
    name: String,
    created_at: i64,
}

#[derive(Debug, Default)]
struct Tables {
    last_deck: i64,
    last_word: i64,
    last_item: i64,
    decks: Vec<DeckRow>,
    words: BTreeMap<WordId, WordRecord>,
    items: BTreeMap<ItemId, ReviewItem>,
}

/// Words are keyed on their text; `is_phonetic` is derived from it.
fn same_text(a: &Word, b: &Word) -> bool {
    a.native == b.native && a.phonetic == b.phonetic && a.translated == b.translated
}

/// An `ItemStore` kept in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ItemStore for MemoryStore {
    fn create_deck(&self, name: &str) -> Result<DeckId> {
        let mut tables = self.tables();
        if tables.decks.iter().any(|d| d.name == name) {
            return DeckExistsSnafu { name }.fail();
        }
        tables.last_deck += 1;
        let id = DeckId(tables.last_deck);
        tables.decks.push(DeckRow {
            id,
            name: name.to_string(),
            created_at: chrono::Utc::now().timestamp_millis(),
        });
        Ok(id)
    }

    fn find_deck(&self, name: &str) -> Result<Option<DeckId>> {
        Ok(self
            .tables()
            .decks
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.id))
    }

    fn delete_deck(&self, deck: DeckId) -> Result<()> {
        let mut tables = self.tables();
        let before = tables.decks.len();
        tables.decks.retain(|d| d.id != deck);
        if tables.decks.len() == before {
            return UnknownDeckSnafu { id: deck }.fail();
        }
        tables.items.retain(|_, item| item.deck_id != deck);
        tables.words.retain(|_, word| word.deck_id != deck);
        Ok(())
    }

    fn decks(&self, now: i64) -> Result<Vec<DeckSummary>> {
        let tables = self.tables();
        let due_words = tables
            .items
            .values()
            .filter(|item| item.is_due(now))
            .map(|item| item.word_id)
            .collect::<std::collections::HashSet<_>>();
        Ok(tables
            .decks
            .iter()
            .sorted_by_key(|d| (d.created_at, d.id))
            .map(|deck| {
                let words = tables
                    .words
                    .values()
                    .filter(|w| w.deck_id == deck.id)
                    .collect_vec();
                DeckSummary {
                    id: deck.id,
                    name: deck.name.clone(),
                    created_at: deck.created_at,
                    total_words: words.len(),
                    memorized_words: words.iter().filter(|w| !due_words.contains(&w.id)).count(),
                }
            })
            .collect())
    }

    fn insert_word(&self, deck: DeckId, word: &Word) -> Result<WordId> {
        let mut tables = self.tables();
        if !tables.decks.iter().any(|d| d.id == deck) {
            return UnknownDeckSnafu { id: deck }.fail();
        }
        if let Some(existing) = tables
            .words
            .values()
            .find(|w| w.deck_id == deck && same_text(&w.word, word))
        {
            debug!("word `{}` already in deck {deck}", word.native);
            return Ok(existing.id);
        }
        tables.last_word += 1;
        let id = WordId(tables.last_word);
        tables.words.insert(
            id,
            WordRecord {
                id,
                deck_id: deck,
                word: word.clone(),
            },
        );
        Ok(id)
    }

    fn get_word(&self, word: WordId) -> Result<WordRecord> {
        match self.tables().words.get(&word) {
            Some(record) => Ok(record.clone()),
            None => UnknownWordSnafu { id: word }.fail(),
        }
    }

    fn get_item(&self, item: ItemId) -> Result<ReviewItem> {
        match self.tables().items.get(&item) {
            Some(found) => Ok(found.clone()),
            None => UnknownItemSnafu { id: item }.fail(),
        }
    }

    fn put_item(&self, item: &ReviewItem) -> Result<()> {
        let mut tables = self.tables();
        match tables.items.get_mut(&item.id) {
            Some(stored) => {
                stored.apply(item.schedule());
                Ok(())
            }
            None => UnknownItemSnafu { id: item.id }.fail(),
        }
    }

    fn query_due(&self, deck: DeckId, now: i64, limit: usize) -> Result<Vec<ReviewItem>> {
        let tables = self.tables();
        let mut queue = PriorityQueue::new();
        for item in tables
            .items
            .values()
            .filter(|item| item.deck_id == deck && item.is_due(now))
        {
            queue.push(item.id, Reverse((item.next_review, item.id)));
        }
        Ok(std::iter::from_fn(|| queue.pop())
            .take(limit)
            .filter_map(|(id, _)| tables.items.get(&id).cloned())
            .collect())
    }

    fn create_item(&self, word: WordId, question: &str) -> Result<ItemId> {
        let mut tables = self.tables();
        let Some(deck) = tables.words.get(&word).map(|w| w.deck_id) else {
            return UnknownWordSnafu { id: word }.fail();
        };
        if let Some(existing) = tables
            .items
            .values()
            .find(|item| item.word_id == word && item.question == question)
        {
            debug!("review item for word {word} / `{question}` already exists");
            return Ok(existing.id);
        }
        tables.last_item += 1;
        let id = ItemId(tables.last_item);
        tables
            .items
            .insert(id, ReviewItem::new(id, deck, word, question));
        Ok(id)
    }
}
