use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr};

use crate::error::{InvalidRatingSnafu, SchedulerError, StoreCorruptSnafu};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Assigned by the store; increases with creation order.
    ItemId
);
id_type!(WordId);
id_type!(DeckId);

pub const DAY_MS: i64 = 86_400_000;

/// Where an item sits in the review cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, FromRepr,
)]
#[repr(u8)]
pub enum State {
    New = 0,
    Learning = 1,
    Review = 2,
    Relearning = 3,
}

/// Recall quality reported by the learner.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    FromRepr,
)]
#[repr(u8)]
#[strum(ascii_case_insensitive)]
pub enum Rating {
    #[strum(to_string = "Forgot", serialize = "Again", serialize = "重来")]
    Forgot = 1,
    #[strum(to_string = "Hard", serialize = "困难")]
    Hard = 2,
    #[strum(to_string = "Good", serialize = "良好")]
    Good = 3,
    #[strum(to_string = "Easy", serialize = "简单")]
    Easy = 4,
}

impl TryFrom<u8> for Rating {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::from_repr(value).ok_or_else(|| {
            InvalidRatingSnafu {
                value: value.to_string(),
            }
            .build()
        })
    }
}

/// The fields a grade produces, as handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleFields {
    pub state: State,
    pub difficulty: f64,
    pub stability: f64,
    pub retrievability: f64,
    pub reps: u32,
    pub lapses: u32,
    pub scheduled_days: u32,
    /// Milliseconds since the epoch.
    pub next_review: i64,
    /// Milliseconds since the epoch; 0 until the first grade.
    pub last_review: i64,
}

/// One schedulable prompt of a word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: ItemId,
    pub deck_id: DeckId,
    pub word_id: WordId,
    pub question: String,
    pub state: State,
    pub difficulty: f64,
    pub stability: f64,
    pub retrievability: f64,
    pub reps: u32,
    pub lapses: u32,
    pub scheduled_days: u32,
    pub next_review: i64,
    pub last_review: i64,
}

impl ReviewItem {
    pub const INITIAL_DIFFICULTY: f64 = 3.0;

    pub fn new(id: ItemId, deck_id: DeckId, word_id: WordId, question: impl Into<String>) -> Self {
        Self {
            id,
            deck_id,
            word_id,
            question: question.into(),
            state: State::New,
            difficulty: Self::INITIAL_DIFFICULTY,
            stability: 0.0,
            retrievability: 1.0,
            reps: 0,
            lapses: 0,
            scheduled_days: 0,
            next_review: 0,
            last_review: 0,
        }
    }

    pub fn schedule(&self) -> ScheduleFields {
        ScheduleFields {
            state: self.state,
            difficulty: self.difficulty,
            stability: self.stability,
            retrievability: self.retrievability,
            reps: self.reps,
            lapses: self.lapses,
            scheduled_days: self.scheduled_days,
            next_review: self.next_review,
            last_review: self.last_review,
        }
    }

    pub(crate) fn apply(&mut self, fields: ScheduleFields) {
        self.state = fields.state;
        self.difficulty = fields.difficulty;
        self.stability = fields.stability;
        self.retrievability = fields.retrievability;
        self.reps = fields.reps;
        self.lapses = fields.lapses;
        self.scheduled_days = fields.scheduled_days;
        self.next_review = fields.next_review;
        self.last_review = fields.last_review;
    }

    pub fn is_due(&self, now: i64) -> bool {
        self.state == State::New || self.next_review <= now
    }

    /// Rejects values no sequence of grades can produce.
    pub fn check_invariants(&self) -> Result<(), SchedulerError> {
        if !(1.0..=5.0).contains(&self.difficulty) {
            return StoreCorruptSnafu {
                reason: format!(
                    "item {} has difficulty {} outside [1, 5]",
                    self.id, self.difficulty
                ),
            }
            .fail();
        }
        if !self.stability.is_finite() || self.stability < 0.0 {
            return StoreCorruptSnafu {
                reason: format!("item {} has stability {}", self.id, self.stability),
            }
            .fail();
        }
        if !(0.0..=1.0).contains(&self.retrievability) {
            return StoreCorruptSnafu {
                reason: format!(
                    "item {} has retrievability {}",
                    self.id, self.retrievability
                ),
            }
            .fail();
        }
        Ok(())
    }
}

/// Which form of a word an item asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Native,
    Phonetic,
    Translated,
}

/// A vocabulary entry. `is_phonetic` marks a native form written purely in
/// phonetic script, which makes the phonetic prompt redundant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word {
    pub native: String,
    pub phonetic: String,
    pub translated: String,
    pub is_phonetic: bool,
}

impl Word {
    pub fn new(
        native: impl Into<String>,
        phonetic: impl Into<String>,
        translated: impl Into<String>,
        is_phonetic: bool,
    ) -> Self {
        Self {
            native: native.into(),
            phonetic: phonetic.into(),
            translated: translated.into(),
            is_phonetic,
        }
    }

    pub fn prompt_kind(&self, question: &str) -> Option<PromptKind> {
        if question == self.native {
            Some(PromptKind::Native)
        } else if question == self.phonetic && !self.is_phonetic {
            Some(PromptKind::Phonetic)
        } else if question == self.translated && self.native != self.translated {
            Some(PromptKind::Translated)
        } else {
            None
        }
    }

    /// The forms a learner should produce when shown `kind`.
    pub fn answers(&self, kind: PromptKind) -> Vec<String> {
        let phonetic = (!self.is_phonetic).then_some(&self.phonetic);
        let forms: Vec<&String> = match kind {
            PromptKind::Native => phonetic.into_iter().chain([&self.translated]).collect(),
            PromptKind::Phonetic => vec![&self.native, &self.translated],
            PromptKind::Translated => [&self.native].into_iter().chain(phonetic).collect(),
        };
        let question = match kind {
            PromptKind::Native => &self.native,
            PromptKind::Phonetic => &self.phonetic,
            PromptKind::Translated => &self.translated,
        };
        let mut answers: Vec<String> = Vec::with_capacity(forms.len());
        for form in forms {
            if form != question && !answers.contains(form) {
                answers.push(form.clone());
            }
        }
        answers
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub id: WordId,
    pub deck_id: DeckId,
    pub word: Word,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSummary {
    pub id: DeckId,
    pub name: String,
    pub created_at: i64,
    pub total_words: usize,
    /// Words none of whose items is due.
    pub memorized_words: usize,
}
