use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::item::{DeckId, ItemId, PromptKind, ReviewItem, ScheduleFields, Word};
use crate::store::ItemStore;

pub const DEFAULT_BATCH_SIZE: usize = 20;

/// A due item joined with the word it asks about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueCard {
    pub item_id: ItemId,
    pub question: String,
    pub kind: PromptKind,
    /// The word's other forms, any of which counts as correct.
    pub answers: Vec<String>,
    pub word: Word,
    pub schedule: ScheduleFields,
}

/// Items of `deck` that are New or whose `next_review` has passed, soonest
/// first. Never writes.
pub fn due_items<S: ItemStore + ?Sized>(
    store: &S,
    deck: DeckId,
    now: i64,
    limit: usize,
) -> Result<Vec<ReviewItem>> {
    store.query_due(deck, now, limit)
}

pub fn due_batch<S: ItemStore + ?Sized>(
    store: &S,
    deck: DeckId,
    now: i64,
    limit: usize,
) -> Result<Vec<DueCard>> {
    let items = due_items(store, deck, now, limit)?;
    let mut words: HashMap<_, Word> = HashMap::new();
    let mut cards = Vec::with_capacity(items.len());
    for item in items {
        let word = match words.entry(item.word_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(store.get_word(item.word_id)?.word),
        };
        let Some(kind) = word.prompt_kind(&item.question) else {
            warn!(
                "item {} asks `{}`, which is no longer a form of word {}",
                item.id, item.question, item.word_id
            );
            continue;
        };
        cards.push(DueCard {
            item_id: item.id,
            kind,
            answers: word.answers(kind),
            word: word.clone(),
            schedule: item.schedule(),
            question: item.question,
        });
    }
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::State;
    use crate::memory_store::MemoryStore;
    use crate::provisioning::add_word;
    use crate::test_helpers::{NOW, cat};
    use itertools::Itertools;

    #[test]
    fn due_items_orders_new_first() {
        let store = MemoryStore::new();
        let deck = store.create_deck("n5").unwrap();
        let word = store.insert_word(deck, &cat()).unwrap();
        let a = store.create_item(word, "猫").unwrap();
        let b = store.create_item(word, "ねこ").unwrap();
        let c = store.create_item(word, "cat").unwrap();
        for (id, next_review) in [(a, NOW - 1000), (c, NOW + 999_999)] {
            let mut item = store.get_item(id).unwrap();
            item.state = State::Review;
            item.next_review = next_review;
            store.put_item(&item).unwrap();
        }
        let before = store.get_item(a).unwrap();

        let due = due_items(&store, deck, NOW, DEFAULT_BATCH_SIZE).unwrap();
        assert_eq!(due.iter().map(|i| i.id).collect_vec(), [b, a]);
        assert_eq!(store.get_item(a).unwrap(), before);
    }

    #[test]
    fn batch_classifies_prompts() {
        let store = MemoryStore::new();
        let deck = store.create_deck("n5").unwrap();
        add_word(&store, deck, &cat()).unwrap();

        let cards = due_batch(&store, deck, NOW, 10).unwrap();
        let kinds = cards.iter().map(|c| c.kind).collect_vec();
        assert_eq!(
            kinds,
            [PromptKind::Native, PromptKind::Translated, PromptKind::Phonetic]
        );
        assert_eq!(cards[0].answers, ["ねこ", "cat"]);
        assert_eq!(cards[1].answers, ["猫", "ねこ"]);
        assert_eq!(cards[2].answers, ["猫", "cat"]);
        assert_eq!(cards[1].schedule.state, State::New);
    }

    #[test]
    fn batch_skips_orphaned_prompts() {
        let store = MemoryStore::new();
        let deck = store.create_deck("n5").unwrap();
        let word = store.insert_word(deck, &cat()).unwrap();
        store.create_item(word, "いぬ").unwrap();
        let kept = store.create_item(word, "cat").unwrap();

        let cards = due_batch(&store, deck, NOW, 10).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].item_id, kept);
    }

    #[test]
    fn batch_respects_limit() {
        let store = MemoryStore::new();
        let deck = store.create_deck("n5").unwrap();
        let word = store.insert_word(deck, &cat()).unwrap();
        for question in ["猫", "ねこ", "cat"] {
            store.create_item(word, question).unwrap();
        }
        assert_eq!(due_batch(&store, deck, NOW, 2).unwrap().len(), 2);
    }
}
