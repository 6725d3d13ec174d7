//! Per-user quiz state shared by the dispatcher and the scheduler.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use teloxide::types::ChatId;

use super::Verdict;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizSession {
    /// Lowercased translation the user is expected to send back.
    pub expected_answer: Option<String>,
    pub active: bool,
}

#[derive(Default)]
struct Registry {
    users: HashSet<ChatId>,
    sessions: HashMap<ChatId, QuizSession>,
}

/// Owns the known users and their sessions. Nothing is persisted; a restart
/// forgets every outstanding question.
#[derive(Default)]
pub struct QuizSessions {
    inner: Mutex<Registry>,
}

impl QuizSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // The registry holds no invariants a panicking writer could break halfway.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns `true` if the user was not known before.
    pub fn register(&self, user: ChatId) -> bool {
        self.lock().users.insert(user)
    }

    pub fn known_users(&self) -> Vec<ChatId> {
        self.lock().users.iter().copied().collect()
    }

    pub fn is_active(&self, user: ChatId) -> bool {
        self.lock()
            .sessions
            .get(&user)
            .map_or(false, |session| session.active)
    }

    /// Whether the user has ever been sent a question in this process.
    pub fn has_session(&self, user: ChatId) -> bool {
        self.lock().sessions.contains_key(&user)
    }

    #[cfg(test)]
    pub fn session(&self, user: ChatId) -> Option<QuizSession> {
        self.lock().sessions.get(&user).cloned()
    }

    /// Replaces whatever session the user had with a fresh question.
    pub fn arm_session(&self, user: ChatId, correct_answer: &str) {
        let session = QuizSession {
            expected_answer: Some(correct_answer.to_lowercase()),
            active: true,
        };
        self.lock().sessions.insert(user, session);
    }

    /// Arms a question only if the user has none outstanding. The check and the
    /// write happen under one lock.
    pub fn arm_if_idle(&self, user: ChatId, correct_answer: &str) -> bool {
        let mut registry = self.lock();
        let session = registry.sessions.entry(user).or_default();
        if session.active {
            return false;
        }
        session.expected_answer = Some(correct_answer.to_lowercase());
        session.active = true;
        true
    }

    /// Drops an outstanding question without grading it.
    pub fn disarm(&self, user: ChatId) {
        if let Some(session) = self.lock().sessions.get_mut(&user) {
            session.expected_answer = None;
            session.active = false;
        }
    }

    pub fn grade_answer(&self, user: ChatId, raw_text: &str) -> Verdict {
        let mut registry = self.lock();
        let session = match registry.sessions.get_mut(&user) {
            Some(session) if session.active => session,
            _ => return Verdict::NoActiveSession,
        };

        let expected = session.expected_answer.take();
        session.active = false;

        match expected {
            Some(expected) if normalize(raw_text) == expected => Verdict::Correct,
            Some(expected) => Verdict::Incorrect {
                correct_answer: expected,
            },
            None => Verdict::NoActiveSession,
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
