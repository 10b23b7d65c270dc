// src/exam/store.rs

use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;

use crate::{error::AppError, models::exam::ExamSession};

/// A session shared between request handlers and its timers.
/// All mutations happen under the session's own mutex.
pub type SharedSession = Arc<Mutex<ExamSession>>;

/// Keyed table of live sessions.
///
/// Operations never suspend. A distributed implementation would replace the
/// in-memory one when the service runs on more than one instance.
pub trait SessionStore: Send + Sync {
    fn create(&self, session: ExamSession) -> SharedSession;

    fn get(&self, id: &str) -> Option<SharedSession>;

    /// Removing a missing id is a no-op.
    fn delete(&self, id: &str);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Locks a session. A poisoned lock means a handler panicked mid-update.
pub fn lock_session(session: &SharedSession) -> Result<MutexGuard<'_, ExamSession>, AppError> {
    session
        .lock()
        .map_err(|_| AppError::InternalServerError("Exam session lock poisoned".to_string()))
}

/// Process-local session table. Sessions are lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SharedSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, session: ExamSession) -> SharedSession {
        let id = session.id.clone();
        let shared = Arc::new(Mutex::new(session));
        if self.sessions.insert(id.clone(), Arc::clone(&shared)).is_some() {
            tracing::warn!("Exam session id collision, replaced {}", id);
        }
        shared
    }

    fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    fn delete(&self, id: &str) {
        self.sessions.remove(id);
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exam::{ExamLength, Language};
    use chrono::Utc;

    fn session(id: &str) -> ExamSession {
        ExamSession::new(id.to_string(), 1, Language::Ru, ExamLength::Short, vec![], Utc::now())
    }

    #[test]
    fn test_create_get_delete() {
        let store = InMemorySessionStore::new();
        store.create(session("exam_1_a"));
        store.create(session("exam_1_b"));
        assert_eq!(store.len(), 2);

        let fetched = store.get("exam_1_a").unwrap();
        assert_eq!(lock_session(&fetched).unwrap().id, "exam_1_a");
        assert!(store.get("exam_1_c").is_none());

        store.delete("exam_1_a");
        store.delete("exam_1_a");
        assert!(store.get("exam_1_a").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_handles_share_one_session() {
        let store = InMemorySessionStore::new();
        let created = store.create(session("exam_1_a"));
        lock_session(&created).unwrap().ended_at = Some(Utc::now());

        let fetched = store.get("exam_1_a").unwrap();
        assert!(lock_session(&fetched).unwrap().ended_at.is_some());
    }
}
