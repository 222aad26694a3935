use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::info;

use crate::config::Config;
use crate::error::{InvalidRatingSnafu, Result};
use crate::inference::NextStates;
use crate::item::{DeckId, DeckSummary, ItemId, Rating, ReviewItem, ScheduleFields, Word};
use crate::model::FSRS;
use crate::provisioning::{self, ImportSummary};
use crate::session::{self, DEFAULT_BATCH_SIZE, DueCard};
use crate::store::ItemStore;

const LOCK_STRIPES: usize = 64;

/// Turns a button label such as `Good (G)` or `3` into a [`Rating`].
pub fn parse_rating_label(label: &str) -> Result<Rating> {
    let trimmed = label.trim();
    let name = match trimmed.rfind('(') {
        Some(open) if trimmed.ends_with(')') => trimmed[..open].trim_end(),
        _ => trimmed,
    };
    if let Ok(value) = name.parse::<u8>() {
        return Rating::try_from(value);
    }
    Rating::from_str(name).map_err(|_| InvalidRatingSnafu { value: label }.build())
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The entry point a presentation layer talks to.
///
/// Grades of the same item are serialized, so two concurrent grades never
/// both read the old schedule.
pub struct ReviewService<S> {
    store: S,
    fsrs: FSRS,
    batch_size: usize,
    locks: Vec<Mutex<()>>,
}

impl<S: ItemStore> ReviewService<S> {
    pub fn new(store: S, fsrs: FSRS) -> Self {
        Self {
            store,
            fsrs,
            batch_size: DEFAULT_BATCH_SIZE,
            locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn from_config(store: S, config: &Config) -> Result<Self> {
        Ok(Self::new(store, config.scheduler()?).with_batch_size(config.batch_size))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheduler(&self) -> &FSRS {
        &self.fsrs
    }

    fn lock(&self, item: ItemId) -> MutexGuard<'_, ()> {
        let stripe = item.0.rem_euclid(LOCK_STRIPES as i64) as usize;
        self.locks[stripe]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn grade(&self, item: ItemId, label: &str, now: i64) -> Result<ScheduleFields> {
        self.grade_rating(item, parse_rating_label(label)?, now)
    }

    pub fn grade_rating(&self, item: ItemId, rating: Rating, now: i64) -> Result<ScheduleFields> {
        let _guard = self.lock(item);
        let current = self.store.get_item(item)?;
        let graded = self.fsrs.grade(&current, rating, now)?;
        self.store.put_item(&graded)?;
        info!(
            "graded item {item} {rating}: {} -> {}, due in {} days",
            current.state, graded.state, graded.scheduled_days
        );
        Ok(graded.schedule())
    }

    pub fn grade_now(&self, item: ItemId, label: &str) -> Result<ScheduleFields> {
        self.grade(item, label, now_millis())
    }

    /// What each rating would do to `item`, without saving anything.
    pub fn preview(&self, item: ItemId, now: i64) -> Result<NextStates> {
        let current = self.store.get_item(item)?;
        self.fsrs.next_states(&current, now)
    }

    pub fn due_batch(&self, deck: DeckId, now: i64) -> Result<Vec<DueCard>> {
        session::due_batch(&self.store, deck, now, self.batch_size)
    }

    pub fn due_batch_now(&self, deck: DeckId) -> Result<Vec<DueCard>> {
        self.due_batch(deck, now_millis())
    }

    pub fn add_word(&self, deck: DeckId, word: &Word) -> Result<Vec<ReviewItem>> {
        provisioning::add_word(&self.store, deck, word)
    }

    pub fn import_deck(&self, name: &str, reader: impl BufRead) -> Result<Option<ImportSummary>> {
        provisioning::import_deck(&self.store, name, reader)
    }

    pub fn import_file(&self, path: impl AsRef<Path>) -> Result<Option<ImportSummary>> {
        provisioning::import_file(&self.store, path)
    }

    pub fn decks(&self, now: i64) -> Result<Vec<DeckSummary>> {
        self.store.decks(now)
    }

    pub fn decks_now(&self) -> Result<Vec<DeckSummary>> {
        self.decks(now_millis())
    }

    pub fn delete_deck(&self, deck: DeckId) -> Result<()> {
        self.store.delete_deck(deck)?;
        info!("deleted deck {deck}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::error::SchedulerError;
    use crate::item::{DAY_MS, State};
    use crate::memory_store::MemoryStore;
    use crate::sqlite_store::SqliteStore;
    use crate::test_helpers::{NOW, cat};

    fn service() -> (ReviewService<MemoryStore>, DeckId) {
        let service = ReviewService::new(MemoryStore::new(), FSRS::default());
        let deck = service.store().create_deck("n5").unwrap();
        (service, deck)
    }

    #[test]
    fn labels() {
        assert_eq!(parse_rating_label("Good").unwrap(), Rating::Good);
        assert_eq!(parse_rating_label(" easy (E) ").unwrap(), Rating::Easy);
        assert_eq!(parse_rating_label("Forgot(F)").unwrap(), Rating::Forgot);
        assert_eq!(parse_rating_label("困难 (H)").unwrap(), Rating::Hard);
        assert_eq!(parse_rating_label("1").unwrap(), Rating::Forgot);
        for bad in ["", "5", "0", "Great", "(G)"] {
            assert!(
                matches!(
                    parse_rating_label(bad),
                    Err(SchedulerError::InvalidRating { .. })
                ),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn grade_saves_the_new_schedule() {
        let (service, deck) = service();
        let items = service.add_word(deck, &cat()).unwrap();
        let fields = service.grade(items[0].id, "Good (G)", NOW).unwrap();
        assert_eq!(fields.state, State::Review);
        assert_eq!(fields.next_review, NOW + 2 * DAY_MS);
        assert_eq!(service.store().get_item(items[0].id).unwrap().schedule(), fields);

        let due = service.due_batch(deck, NOW).unwrap();
        assert_eq!(due.len(), 2);
        assert!(due.iter().all(|card| card.item_id != items[0].id));
    }

    #[test]
    fn invalid_label_changes_nothing() {
        let (service, deck) = service();
        let item = service.add_word(deck, &cat()).unwrap()[0].clone();
        assert!(matches!(
            service.grade(item.id, "Perfect", NOW),
            Err(SchedulerError::InvalidRating { .. })
        ));
        assert_eq!(service.store().get_item(item.id).unwrap(), item);
        assert!(matches!(
            service.grade(ItemId(404), "Good", NOW),
            Err(SchedulerError::UnknownItem { .. })
        ));
    }

    #[test]
    fn preview_matches_grade() {
        let (service, deck) = service();
        let item = service.add_word(deck, &cat()).unwrap()[0].id;
        let preview = service.preview(item, NOW).unwrap();
        let graded = service.grade(item, "Hard", NOW).unwrap();
        assert_eq!(preview.hard, graded);
    }

    #[test]
    fn concurrent_grades_are_not_lost() {
        let service = ReviewService::new(SqliteStore::open_in_memory().unwrap(), FSRS::default());
        let deck = service.store().create_deck("n5").unwrap();
        let item = service.add_word(deck, &cat()).unwrap()[0].id;

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..10 {
                        service.grade(item, "Good", NOW).unwrap();
                    }
                });
            }
        });
        assert_eq!(service.store().get_item(item).unwrap().reps, 80);
    }

    #[test]
    fn config_batch_size_caps_due_batch() {
        let store = MemoryStore::new();
        let deck = store.create_deck("n5").unwrap();
        let config = Config {
            batch_size: 1,
            ..Config::default()
        };
        let service = ReviewService::from_config(store, &config).unwrap();
        service.add_word(deck, &cat()).unwrap();
        assert_eq!(service.due_batch(deck, NOW).unwrap().len(), 1);
    }
}
