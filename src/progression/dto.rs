use serde::{Deserialize, Serialize};

use crate::auth::sessions::Snapshot;
use crate::progression::catalog::ModuleDefinition;
use crate::progression::engine::QuizOutcome;

/// Catalog listing entry. Never carries the quiz answer.
#[derive(Debug, Serialize)]
pub struct ModuleSummary {
    pub index: u32,
    pub title: String,
    pub reward: u32,
    pub locked: bool,
}

impl ModuleSummary {
    pub fn of(module: &ModuleDefinition, level: u32) -> Self {
        Self {
            index: module.index,
            title: module.title.clone(),
            reward: module.reward,
            locked: module.index > level,
        }
    }
}

/// Full lesson body, served only for unlocked modules. The quiz answer
/// stays server-side.
#[derive(Debug, Serialize)]
pub struct ModuleDetail {
    pub index: u32,
    pub title: String,
    pub theory: String,
    pub mission: String,
    pub hint: String,
    pub question: String,
    pub options: Vec<String>,
    pub reward: u32,
}

impl ModuleDetail {
    pub fn of(module: &ModuleDefinition) -> Self {
        Self {
            index: module.index,
            title: module.title.clone(),
            theory: module.theory.clone(),
            mission: module.mission.clone(),
            hint: module.hint.clone(),
            question: module.quiz.question.clone(),
            options: module.quiz.options.clone(),
            reward: module.reward,
        }
    }
}

/// Request body for a quiz submission.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub answer: String,
}

/// Response for a quiz submission; `user` is the refreshed snapshot.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub outcome: &'static str,
    pub user: Snapshot,
}

impl SubmitResponse {
    pub fn of(outcome: QuizOutcome, session: Snapshot) -> Self {
        match outcome {
            QuizOutcome::Advanced { user } => Self {
                outcome: "advanced",
                user,
            },
            QuizOutcome::AlreadyCompleted => Self {
                outcome: "already_completed",
                user: session,
            },
            QuizOutcome::Incorrect => Self {
                outcome: "incorrect",
                user: session,
            },
            QuizOutcome::Locked => Self {
                outcome: "locked",
                user: session,
            },
        }
    }
}
