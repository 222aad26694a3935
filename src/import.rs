//! Vocabulary list parsing.
//!
//! A list starts with a header line. Every other non-empty line holds the
//! native form, its translation and optionally the phonetic reading, split by
//! the first of `,` `\t` `;` `|` that gives at least two fields.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use snafu::ResultExt;

use crate::error::{IoSnafu, ReadSnafu, Result};
use crate::item::Word;

const DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}')
}

/// True when `text` is written entirely in hiragana or katakana.
pub fn is_phonetic_script(text: &str) -> bool {
    text.chars().all(is_kana)
}

fn split_line(line: &str) -> Option<csv::StringRecord> {
    DELIMITERS.iter().find_map(|&delimiter| {
        let record = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(delimiter)
            .from_reader(line.as_bytes())
            .records()
            .next()?
            .ok()?;
        (record.len() >= 2).then_some(record)
    })
}

fn parse_line(line: &str) -> Option<Word> {
    let record = split_line(line)?;
    let native = record.get(0)?;
    let translated = record.get(1)?;
    let phonetic = record.get(2).unwrap_or(native);
    Some(Word::new(
        native,
        phonetic,
        translated,
        is_phonetic_script(native),
    ))
}

/// Parses a vocabulary list, skipping its header and any malformed lines.
pub fn read_words(reader: impl BufRead) -> Result<Vec<Word>> {
    let mut words = Vec::new();
    for (number, line) in reader.lines().enumerate().skip(1) {
        let line = line.context(ReadSnafu)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(word) => words.push(word),
            None => debug!("skipping line {}: `{line}`", number + 1),
        }
    }
    Ok(words)
}

pub fn load_words(path: impl AsRef<Path>) -> Result<Vec<Word>> {
    let path = path.as_ref();
    let file = File::open(path).context(IoSnafu { path })?;
    read_words(BufReader::new(file))
}

/// The deck name a vocabulary file imports as: its file name without extension.
pub fn deck_name(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_kana() {
        assert!(is_phonetic_script("ねこ"));
        assert!(is_phonetic_script("テスト"));
        assert!(!is_phonetic_script("猫"));
        assert!(!is_phonetic_script("ねこcat"));
    }

    #[test]
    fn reads_mixed_delimiters() {
        let text = "日文,中文,假名\n\
                    猫,cat,ねこ\n\
                    \n\
                    テスト\ttest\n\
                    犬; dog ;いぬ\n\
                    lonely\n\
                    本|book|ほん\n";
        let words = read_words(text.as_bytes()).unwrap();
        assert_eq!(
            words,
            [
                Word::new("猫", "ねこ", "cat", false),
                Word::new("テスト", "テスト", "test", true),
                Word::new("犬", "いぬ", "dog", false),
                Word::new("本", "ほん", "book", false),
            ]
        );
    }

    #[test]
    fn header_only_is_empty() {
        assert!(read_words("native,translated\n".as_bytes()).unwrap().is_empty());
        assert!(read_words("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn quoted_fields_keep_their_delimiters() {
        let words = read_words("h\n\"一つ, 二つ\",\"one, two\"\n".as_bytes()).unwrap();
        assert_eq!(words[0].native, "一つ, 二つ");
        assert_eq!(words[0].translated, "one, two");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            load_words("/nonexistent/n5.csv"),
            Err(crate::error::SchedulerError::Io { .. })
        ));
    }

    struct Unreadable;

    impl std::io::Read for Unreadable {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("device gone"))
        }
    }

    #[test]
    fn read_failures_are_not_csv_errors() {
        assert!(matches!(
            read_words(BufReader::new(Unreadable)),
            Err(crate::error::SchedulerError::Read { .. })
        ));
        let invalid_utf8: &[u8] = b"header\n\xff\xfe,cat\n";
        assert!(matches!(
            read_words(invalid_utf8),
            Err(crate::error::SchedulerError::Read { .. })
        ));
    }

    #[test]
    fn deck_name_is_file_stem() {
        assert_eq!(deck_name("/tmp/lists/n5.csv").as_deref(), Some("n5"));
    }
}
