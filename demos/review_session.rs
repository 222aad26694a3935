//! Imports a small vocabulary list into a SQLite database, runs one review
//! session with scripted answers and exports the misses.
//!
//! cargo run --example review_session -- [config.json]

use log::LevelFilter;
use vocab_fsrs::{Config, MissedAnswer, ReviewService, write_missed_answers};

const WORDS: &str = "日文,中文,假名
猫,cat,ねこ
犬,dog,いぬ
テスト,test
中国,中国,ちゅうごく
";

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {:<5} {}: {}",
                chrono::Utc::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Debug)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger()?;

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config {
            database: std::env::temp_dir().join("vocab-fsrs-demo.db"),
            ..Config::default()
        },
    };
    let service = ReviewService::from_config(config.open_store()?, &config)?;

    let deck = match service.import_deck("demo", WORDS.as_bytes())? {
        Some(summary) => summary.deck,
        None => return Ok(()),
    };

    // Pretend the learner misses every other card.
    let mut missed = Vec::new();
    for (i, card) in service.due_batch_now(deck)?.iter().enumerate() {
        let label = if i % 2 == 0 { "Good (G)" } else { "Forgot (A)" };
        let fields = service.grade_now(card.item_id, label)?;
        println!(
            "{:<12} {:<10} -> {} in {} days",
            card.question,
            format!("{:?}", card.kind),
            fields.state,
            fields.scheduled_days
        );
        if i % 2 == 1 {
            missed.push(MissedAnswer::from_card(card));
        }
    }

    for summary in service.decks_now()? {
        println!(
            "{}: {}/{} words memorized",
            summary.name, summary.memorized_words, summary.total_words
        );
    }

    let rows = write_missed_answers(std::io::stdout(), &missed)?;
    println!("exported {rows} missed answers");

    service.delete_deck(deck)?;
    Ok(())
}
