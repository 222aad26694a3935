use chrono::{DateTime, Duration, Utc};
use vocab_fsrs::{DeckId, FSRS, ItemId, Rating, ReviewItem, State, WordId};

fn print_options(
    fsrs: &FSRS,
    item: &ReviewItem,
    now: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let next_states = fsrs.next_states(item, now)?;
    for rating in [Rating::Forgot, Rating::Hard, Rating::Good, Rating::Easy] {
        let next = next_states.get(rating);
        println!(
            "{rating} interval: {} days ({}, stability {:.2}, difficulty {:.2})",
            next.scheduled_days, next.state, next.stability, next.difficulty
        );
    }
    Ok(())
}

fn due_date(item: &ReviewItem) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(item.next_review)
}

fn schedule_new_item() -> Result<(), Box<dyn std::error::Error>> {
    // A freshly provisioned prompt
    let item = ReviewItem::new(ItemId(1), DeckId(1), WordId(1), "猫");
    let fsrs = FSRS::default();
    let now = Utc::now().timestamp_millis();

    print_options(&fsrs, &item, now)?;

    // The learner answered `good`
    let item = fsrs.grade(&item, Rating::Good, now)?;
    println!("Next review due: {:?}", due_date(&item));
    println!("Schedule: {:?}", item.schedule());
    Ok(())
}

fn schedule_existing_item() -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    // Reviewed 7 days ago and due today
    let item = ReviewItem {
        state: State::Review,
        stability: 7.0,
        difficulty: 4.0,
        retrievability: vocab_fsrs::retrievability(7.0),
        reps: 4,
        scheduled_days: 7,
        last_review: (now - Duration::days(7)).timestamp_millis(),
        next_review: now.timestamp_millis(),
        ..ReviewItem::new(ItemId(2), DeckId(1), WordId(2), "cat")
    };
    let fsrs = FSRS::default();

    print_options(&fsrs, &item, now.timestamp_millis())?;

    // The learner forgot it
    let item = fsrs.grade(&item, Rating::Forgot, now.timestamp_millis())?;
    println!("Next review due: {:?}", due_date(&item));
    println!("Schedule: {:?}", item.schedule());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Scheduling a new item:");
    schedule_new_item()?;

    println!("\nScheduling an existing item:");
    schedule_existing_item()?;

    Ok(())
}
