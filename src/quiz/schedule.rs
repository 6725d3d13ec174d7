//! Periodic quiz broadcast.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::messenger::Messenger;
use crate::storage::{RetrieveFilter, VocabularyStore};

use super::sessions::QuizSessions;
use super::{format_question, select_quiz_candidate, MIN_ENTRIES};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub skipped_active: usize,
    pub failed: usize,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    NoUsers,
    StoreUnavailable,
    NotEnoughEntries { available: usize },
    Broadcast(BroadcastReport),
}

/// Sends one question to every known user who has none outstanding.
///
/// The entry-count check applies to the whole tick; the active-session check
/// applies per user.
pub async fn broadcast_quiz<S, M>(
    store: &S,
    sessions: &QuizSessions,
    messenger: &M,
    snapshot_limit: usize,
) -> TickOutcome
where
    S: VocabularyStore + ?Sized,
    M: Messenger + ?Sized,
{
    log::info!("Sending quiz to users.");

    let users = sessions.known_users();
    if users.is_empty() {
        log::warn!("No users to send the quiz to.");
        return TickOutcome::NoUsers;
    }

    let entries = match store.retrieve(&RetrieveFilter::latest(snapshot_limit)).await {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("Failed to fetch vocabulary for the quiz: {}", e);
            return TickOutcome::StoreUnavailable;
        }
    };
    if entries.len() < MIN_ENTRIES {
        log::warn!("Not enough entries to generate a quiz ({}).", entries.len());
        return TickOutcome::NotEnoughEntries {
            available: entries.len(),
        };
    }

    let mut report = BroadcastReport::default();
    for user in users {
        let question = {
            let mut rng = rand::thread_rng();
            select_quiz_candidate(&entries, &mut rng)
        };
        let question = match question {
            Ok(question) => question,
            Err(e) => {
                log::warn!("Could not build a question for user {}: {}", user.0, e);
                continue;
            }
        };

        if !sessions.arm_if_idle(user, &question.answer) {
            log::info!("User {} already has an active quiz. Skipping.", user.0);
            report.skipped_active += 1;
            continue;
        }
        let text = format_question(&question);
        match messenger.send_text(user, &text).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                // Nobody can answer a question that never arrived.
                sessions.disarm(user);
                log::error!("Failed to send quiz to user {}: {}", user.0, e);
                report.failed += 1;
            }
        }
    }

    log::info!(
        "Quiz sent to {} users ({} still answering, {} failed).",
        report.sent,
        report.skipped_active,
        report.failed
    );
    TickOutcome::Broadcast(report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub interval: Duration,
    pub snapshot_limit: usize,
}

/// Runs a broadcast every `config.interval`, the first one immediately, until
/// `shutdown` flips. A tick that has started always runs to completion.
pub async fn run(
    store: Arc<dyn VocabularyStore>,
    sessions: Arc<QuizSessions>,
    messenger: Arc<dyn Messenger>,
    config: ScheduleConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log::info!("Quiz scheduler started, interval {:?}", config.interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                broadcast_quiz(store.as_ref(), &sessions, messenger.as_ref(), config.snapshot_limit).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    log::info!("Quiz scheduler stopped.");
}
