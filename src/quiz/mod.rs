pub mod schedule;
pub mod sessions;
pub mod submission;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::storage::VocabularyEntry;

/// Smallest snapshot a question can be built from: the target and two distractors.
pub const MIN_ENTRIES: usize = 3;
const DISTRACTORS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("need at least 3 entries to build a question, got {available}")]
    InsufficientData { available: usize },

    #[error("need 2 distractors, only {available} available")]
    InsufficientDistractors { available: usize },
}

/// A multiple-choice question about one stored word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub word: String,
    pub answer: String,
    /// Correct translation plus distractors, already in presentation order.
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect { correct_answer: String },
    NoActiveSession,
}

pub fn select_quiz_candidate<R: Rng>(
    entries: &[VocabularyEntry],
    rng: &mut R,
) -> Result<Question, QuizError> {
    if entries.len() < MIN_ENTRIES {
        return Err(QuizError::InsufficientData {
            available: entries.len(),
        });
    }

    let target_idx = rng.gen_range(0..entries.len());
    let target = &entries[target_idx];

    // Distractors are picked by position so a duplicated row can still serve as one,
    // but the target itself never can.
    let pool = entries
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != target_idx)
        .map(|(_, e)| e)
        .collect::<Vec<_>>();
    let distractors = pool
        .choose_multiple(rng, DISTRACTORS.min(pool.len()))
        .collect::<Vec<_>>();
    if distractors.len() < DISTRACTORS {
        return Err(QuizError::InsufficientDistractors {
            available: distractors.len(),
        });
    }

    // We shuffle the options so the correct one isn't always the first one
    let mut options = vec![target.translation.clone()];
    options.extend(distractors.iter().map(|e| e.translation.clone()));
    options.shuffle(rng);

    Ok(Question {
        word: target.word.clone(),
        answer: target.translation.clone(),
        options,
    })
}

pub fn format_question(question: &Question) -> String {
    let mut text = format!("What is the translation for '{}'?\nOptions:\n", question.word);
    for (idx, option) in question.options.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", idx + 1, option));
    }
    text
}
