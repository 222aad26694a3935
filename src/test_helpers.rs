use crate::item::{DeckId, ItemId, ReviewItem, State, Word, WordId};

/// 2024-01-01T00:00:00Z
pub const NOW: i64 = 1_704_067_200_000;

pub fn new_item() -> ReviewItem {
    ReviewItem::new(ItemId(1), DeckId(1), WordId(1), "猫")
}

pub fn review_item(stability: f64, difficulty: f64, reps: u32) -> ReviewItem {
    ReviewItem {
        state: State::Review,
        stability,
        difficulty,
        retrievability: crate::model::retrievability(stability),
        reps,
        lapses: 1,
        scheduled_days: stability.ceil() as u32,
        last_review: NOW - 3 * crate::item::DAY_MS,
        next_review: NOW,
        ..new_item()
    }
}

pub fn cat() -> Word {
    Word::new("猫", "ねこ", "cat", false)
}
