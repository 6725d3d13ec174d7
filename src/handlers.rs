//! Inbound side of the chat gateway: commands and free text.

use std::sync::Arc;

use reqwest::Url;
use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
    utils::command::BotCommands,
};

use crate::config::Settings;
use crate::messages;
use crate::messenger::{Messenger, SendResult};
use crate::quiz::sessions::QuizSessions;
use crate::quiz::submission::{record_new_entry, SubmissionError};
use crate::quiz::Verdict;
use crate::storage::VocabularyStore;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "start receiving quizzes.")]
    Start,
    #[command(description = "show how to add words.")]
    Help,
    #[command(description = "open the vocabulary spreadsheet.")]
    Sheet,
}

/// Builds the update handler tree. Commands are matched first; any other text
/// message goes to [`text_endpoint`].
pub fn schema() -> teloxide::dispatching::UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(command_endpoint),
        )
        .branch(
            dptree::filter(|msg: Message| msg.text().map_or(false, |text| !text.starts_with('/')))
                .endpoint(text_endpoint),
        )
}

async fn command_endpoint(
    bot: Bot,
    msg: Message,
    cmd: Command,
    sessions: Arc<QuizSessions>,
    settings: Arc<Settings>,
) -> HandlerResult {
    match cmd {
        Command::Start => on_start(&bot, &sessions, msg.chat.id).await?,
        Command::Help => on_help(&bot, msg.chat.id).await?,
        Command::Sheet => {
            bot.send_message(msg.chat.id, messages::SHEET_PROMPT)
                .reply_markup(sheet_keyboard(&settings.sheet_url))
                .await?;
        }
    }
    Ok(())
}

/// A single button linking to the vocabulary spreadsheet.
pub fn sheet_keyboard(sheet_url: &Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
        messages::SHEET_BUTTON,
        sheet_url.clone(),
    )]])
}

async fn text_endpoint(
    bot: Bot,
    msg: Message,
    store: Arc<dyn VocabularyStore>,
    sessions: Arc<QuizSessions>,
) -> HandlerResult {
    // Filtered on `text().is_some()` in the schema.
    let Some(text) = msg.text() else {
        return Ok(());
    };
    on_text(&bot, store.as_ref(), &sessions, msg.chat.id, msg.id.0.to_string(), text).await?;
    Ok(())
}

pub async fn on_start<M: Messenger + ?Sized>(
    messenger: &M,
    sessions: &QuizSessions,
    chat_id: ChatId,
) -> SendResult {
    if sessions.register(chat_id) {
        log::info!("Registered user {}", chat_id.0);
    }
    messenger.send_text(chat_id, messages::WELCOME).await
}

pub async fn on_help<M: Messenger + ?Sized>(messenger: &M, chat_id: ChatId) -> SendResult {
    messenger.send_text(chat_id, messages::HELP).await
}

/// Free text is an answer when a question is outstanding, otherwise a
/// `word - translation` submission.
pub async fn on_text<M, S>(
    messenger: &M,
    store: &S,
    sessions: &QuizSessions,
    chat_id: ChatId,
    message_id: String,
    text: &str,
) -> SendResult
where
    M: Messenger + ?Sized,
    S: VocabularyStore + ?Sized,
{
    if sessions.register(chat_id) {
        log::info!("Registered user {}", chat_id.0);
    }

    if sessions.is_active(chat_id) {
        let reply = match sessions.grade_answer(chat_id, text) {
            Verdict::Correct => messages::CORRECT.to_string(),
            Verdict::Incorrect { correct_answer } => messages::incorrect(&correct_answer),
            Verdict::NoActiveSession => messages::NO_ACTIVE_QUIZ.to_string(),
        };
        return messenger.send_text(chat_id, &reply).await;
    }

    let reply = match record_new_entry(store, message_id, text).await {
        Ok(entry) => messages::saved(&entry.word, &entry.translation),
        Err(SubmissionError::ParseFailure) if sessions.has_session(chat_id) => {
            format!("{}\n{}", messages::NO_ACTIVE_QUIZ, messages::FORMAT_HINT)
        }
        Err(SubmissionError::ParseFailure) => messages::FORMAT_HINT.to_string(),
        Err(e) => {
            log::error!("Failed to save submission from user {}: {}", chat_id.0, e);
            messages::SAVE_FAILED.to_string()
        }
    };
    messenger.send_text(chat_id, &reply).await
}
