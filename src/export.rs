use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{CsvSnafu, IoSnafu, Result};
use crate::item::PromptKind;
use crate::session::DueCard;

/// A prompt the learner answered wrongly during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedAnswer {
    pub kind: PromptKind,
    pub question: String,
    pub correct_answer: String,
    pub phonetic: String,
    pub is_phonetic: bool,
}

impl MissedAnswer {
    /// Records a miss on `card`. Native prompts expect the translation and
    /// translated prompts the native form; phonetic prompts expect the native
    /// form as well.
    pub fn from_card(card: &DueCard) -> Self {
        let correct_answer = match card.kind {
            PromptKind::Native => &card.word.translated,
            PromptKind::Phonetic | PromptKind::Translated => &card.word.native,
        };
        Self {
            kind: card.kind,
            question: card.question.clone(),
            correct_answer: correct_answer.clone(),
            phonetic: card.word.phonetic.clone(),
            is_phonetic: card.word.is_phonetic,
        }
    }

    /// The (native, translated) pair this miss exports as, if any.
    fn pair(&self) -> Option<(&str, &str)> {
        match self.kind {
            PromptKind::Native => Some((
                strip_annotation(&self.question),
                self.correct_answer.as_str(),
            )),
            PromptKind::Translated => {
                Some((self.correct_answer.as_str(), self.question.as_str()))
            }
            PromptKind::Phonetic => None,
        }
    }
}

/// Drops a trailing parenthesized reading, as in `猫(ねこ)`.
fn strip_annotation(question: &str) -> &str {
    match question.find('(') {
        Some(open) if question.ends_with(')') => question[..open].trim_end(),
        _ => question,
    }
}

/// Writes `answers` as a vocabulary list that [`crate::import::read_words`]
/// can load back, one row per distinct (native, translated) pair. Returns the
/// number of rows written.
pub fn write_missed_answers<'a>(
    writer: impl Write,
    answers: impl IntoIterator<Item = &'a MissedAnswer>,
) -> Result<usize> {
    let mut out = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);
    out.write_record(["native", "translated", "phonetic"])
        .context(CsvSnafu)?;

    let mut seen = HashSet::new();
    for answer in answers {
        let Some((native, translated)) = answer.pair() else {
            debug!("not exporting phonetic prompt `{}`", answer.question);
            continue;
        };
        if !seen.insert((native.to_string(), translated.to_string())) {
            continue;
        }
        if answer.is_phonetic {
            out.write_record([native, translated]).context(CsvSnafu)?;
        } else {
            out.write_record([native, translated, answer.phonetic.as_str()])
                .context(CsvSnafu)?;
        }
    }
    out.flush().map_err(csv::Error::from).context(CsvSnafu)?;
    Ok(seen.len())
}

pub fn export_missed_answers<'a>(
    path: impl AsRef<Path>,
    answers: impl IntoIterator<Item = &'a MissedAnswer>,
) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path).context(IoSnafu { path })?;
    write_missed_answers(file, answers)
}
