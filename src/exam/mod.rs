// src/exam/mod.rs

//! Timed exam sessions: question selection, the in-memory session table,
//! the session state machine and the reconciliation of finished sessions
//! into user statistics.

pub mod reconcile;
pub mod selection;
pub mod service;
pub mod store;

pub use service::{ExamService, ExamSettings};
pub use store::{InMemorySessionStore, SessionStore};
