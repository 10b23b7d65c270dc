use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, exam::ExamService};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub exams: Arc<ExamService>,
}

impl FromRef<AppState> for Arc<ExamService> {
    fn from_ref(state: &AppState) -> Self {
        state.exams.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
