mod config;
mod handlers;
mod messages;
mod messenger;
mod quiz;
mod storage;

use std::sync::Arc;

use dotenv::dotenv;
use quiz::{schedule::ScheduleConfig, sessions::QuizSessions};
use storage::{sheets::GoogleSheets, VocabularyStore};
use teloxide::prelude::*;
use tokio::sync::watch;

type MainResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> MainResult {
    // A missing .env is fine, the variables may come from the real environment
    dotenv().ok();
    init_logging();
    log::info!("Starting vocabulary quiz bot...");

    let settings = config::Settings::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        e
    })?;
    log::debug!("Loaded {:?}", settings);

    log::info!("Establishing connection to Google Sheets...");
    let sheets = GoogleSheets::new(settings.credentials.clone(), settings.sheet_id.clone())?;
    sheets.connect().await.map_err(|e| {
        log::error!("Could not connect to Google Sheets: {}", e);
        e
    })?;
    let store: Arc<dyn VocabularyStore> = Arc::new(sheets);

    let bot = Bot::new(settings.bot_token.clone());
    let me = bot.get_me().await?;
    log::info!("Logged in as @{}", me.username());

    let sessions = Arc::new(QuizSessions::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = tokio::spawn(quiz::schedule::run(
        store.clone(),
        sessions.clone(),
        Arc::new(bot.clone()),
        ScheduleConfig {
            interval: settings.quiz_interval,
            snapshot_limit: settings.snapshot_limit,
        },
        shutdown_rx,
    ));

    Dispatcher::builder(bot, handlers::schema())
        .dependencies(dptree::deps![store, sessions, Arc::new(settings)])
        .default_handler(|upd| async move {
            log::debug!("Unhandled update: {:?}", upd.kind);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher stopped, waiting for the quiz scheduler...");
    let _ = shutdown_tx.send(true);
    scheduler.await?;
    log::info!("Bye.");
    Ok(())
}

fn init_logging() {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}
