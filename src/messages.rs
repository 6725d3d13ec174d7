//! Texts sent to users.

pub const WELCOME: &str = "Welcome! Send me a word and its translation.";
pub const HELP: &str =
    "To use this bot, send a word and its translation in the format 'word - translation'.";
pub const FORMAT_HINT: &str =
    "Please send the word and translation in the format 'word - translation'.";
pub const SAVE_FAILED: &str = "Failed to save data.";
pub const CORRECT: &str = "Correct!";
pub const NO_ACTIVE_QUIZ: &str = "You have no active quiz.";
pub const SHEET_PROMPT: &str = "Click the button below to view the Google Sheet.";
pub const SHEET_BUTTON: &str = "View Google Sheet";

pub fn saved(word: &str, translation: &str) -> String {
    format!("Saved word '{}' with translation '{}'.", word, translation)
}

pub fn incorrect(correct_answer: &str) -> String {
    format!("Incorrect. The correct answer was '{}'.", correct_answer)
}
