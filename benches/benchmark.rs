use std::hint::black_box;

use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use itertools::Itertools;
use vocab_fsrs::{
    DAY_MS, DeckId, FSRS, ItemId, MemoryStore, NextStates, Rating, ReviewItem, SchedulerConfig,
    State, Word, WordId, add_word, due_items,
};
use vocab_fsrs::{ItemStore, prompt_variants};

const NOW: i64 = 1_704_067_200_000;

fn review_item() -> ReviewItem {
    ReviewItem {
        state: State::Review,
        stability: 51.344814,
        difficulty: 3.505062,
        retrievability: 0.0045,
        reps: 12,
        lapses: 1,
        scheduled_days: 51,
        next_review: NOW,
        last_review: NOW - 51 * DAY_MS,
        ..ReviewItem::new(ItemId(1), DeckId(1), WordId(1), "猫")
    }
}

pub(crate) fn grade_history(fsrs: &FSRS, reviews: usize) -> ReviewItem {
    let ratings = [Rating::Good, Rating::Good, Rating::Hard, Rating::Forgot, Rating::Easy];
    let mut item = ReviewItem::new(ItemId(1), DeckId(1), WordId(1), "猫");
    let mut now = NOW;
    for rating in ratings.into_iter().cycle().take(reviews) {
        item = fsrs.grade(&item, rating, now).unwrap();
        now = item.next_review.max(now + DAY_MS);
    }
    item
}

pub(crate) fn next_states(fsrs: &FSRS, item: &ReviewItem) -> NextStates {
    fsrs.next_states(item, NOW).unwrap()
}

pub(crate) fn fill_deck(words: usize) -> MemoryStore {
    let store = MemoryStore::new();
    let deck = store.create_deck("bench").unwrap();
    for i in 0..words {
        let word = Word::new(format!("単語{i}"), format!("たんご{i}"), format!("word {i}"), false);
        add_word(&store, deck, &word).unwrap();
    }
    store
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let fsrs = FSRS::new(&SchedulerConfig {
        parameters: vec![
            0.81497127,
            1.5411042,
            4.007436,
            5.045982,
            4.9264183,
            1.039322,
            0.93803364,
            0.0,
            1.5530516,
            0.10299722,
            0.9981442,
            2.210701,
            0.018248068,
            0.3422524,
            1.3384504,
            0.22278537,
            2.6646678,
        ],
        ..Default::default()
    })
    .unwrap();
    let item = review_item();
    c.bench_function("grade_100", |b| b.iter(|| black_box(grade_history(&fsrs, 100))));
    c.bench_function("next_states", |b| {
        b.iter(|| black_box(next_states(&fsrs, &item)))
    });

    let words = (0..100)
        .map(|i| Word::new(format!("{i}"), "よみ", format!("{i}"), false))
        .collect_vec();
    c.bench_function("prompt_variants", |b| {
        b.iter(|| black_box(words.iter().map(prompt_variants).collect_vec()))
    });

    let store = fill_deck(2_000);
    c.bench_function("due_items_20_of_6000", |b| {
        b.iter(|| black_box(due_items(&store, DeckId(1), NOW, 20).unwrap()))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
