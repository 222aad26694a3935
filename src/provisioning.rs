use std::io::BufRead;
use std::path::Path;

use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use snafu::IntoError;

use crate::error::{IoSnafu, Result, SchedulerError};
use crate::import::{deck_name, load_words, read_words};
use crate::item::{DeckId, ReviewItem, Word};
use crate::store::ItemStore;

/// The distinct prompts a word is reviewed under, in creation order: native,
/// translated, phonetic. The translated prompt merges into the native one
/// when both read the same, and a phonetic prompt only exists when the
/// native form is not already phonetic.
pub fn prompt_variants(word: &Word) -> Vec<&str> {
    let phonetic = (!word.is_phonetic).then_some(word.phonetic.as_str());
    [Some(word.native.as_str()), Some(word.translated.as_str()), phonetic]
        .into_iter()
        .flatten()
        .unique()
        .collect()
}

/// Stores `word` in `deck` with one New item per prompt variant.
///
/// Safe to call again with the same word: existing rows are returned rather
/// than duplicated.
pub fn add_word<S: ItemStore + ?Sized>(
    store: &S,
    deck: DeckId,
    word: &Word,
) -> Result<Vec<ReviewItem>> {
    let word_id = store.insert_word(deck, word)?;
    prompt_variants(word)
        .into_iter()
        .map(|question| {
            let id = store.create_item(word_id, question)?;
            store.get_item(id)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub deck: DeckId,
    pub words: usize,
    pub items: usize,
}

/// Fills deck `name` with `words`, creating the deck if needed. Returns
/// `None` without creating a deck when there is nothing to import.
///
/// Rerunning an interrupted import finishes it: the deck is found by name and
/// words or items that already exist are left alone.
pub fn import_words<S: ItemStore + ?Sized>(
    store: &S,
    name: &str,
    words: &[Word],
) -> Result<Option<ImportSummary>> {
    if words.is_empty() {
        info!("nothing to import into `{name}`");
        return Ok(None);
    }
    let deck = resolve_deck(store, name)?;
    let mut items = 0;
    for word in words {
        items += add_word(store, deck, word)?.len();
    }
    info!(
        "imported {} words as {items} review items into deck `{name}` ({deck})",
        words.len()
    );
    Ok(Some(ImportSummary {
        deck,
        words: words.len(),
        items,
    }))
}

fn resolve_deck<S: ItemStore + ?Sized>(store: &S, name: &str) -> Result<DeckId> {
    if let Some(deck) = store.find_deck(name)? {
        warn!("deck `{name}` already exists, importing into it");
        return Ok(deck);
    }
    match store.create_deck(name) {
        Err(SchedulerError::DeckExists { .. }) => match store.find_deck(name)? {
            Some(deck) => Ok(deck),
            None => store.create_deck(name),
        },
        other => other,
    }
}

pub fn import_deck<S: ItemStore + ?Sized>(
    store: &S,
    name: &str,
    reader: impl BufRead,
) -> Result<Option<ImportSummary>> {
    let words = read_words(reader)?;
    import_words(store, name, &words)
}

/// Imports a vocabulary file as a deck named after the file.
pub fn import_file<S: ItemStore + ?Sized>(
    store: &S,
    path: impl AsRef<Path>,
) -> Result<Option<ImportSummary>> {
    let path = path.as_ref();
    let name = deck_name(path).ok_or_else(|| {
        IoSnafu { path }.into_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "no file name to name the deck after",
        ))
    })?;
    let words = load_words(path)?;
    import_words(store, &name, &words)
}
