use tracing::info;

use crate::auth::sessions::Snapshot;
use crate::progression::catalog::{ModuleCatalog, ModuleDefinition};
use crate::store::StoreError;
use crate::users::repo::{User, UserRepo};

/// Result of a quiz submission. Everything here is a normal business
/// outcome; only store failures travel the error path.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizOutcome {
    /// First-time pass at the frontier: reward granted, level bumped, and
    /// the refreshed snapshot to cache.
    Advanced { user: Snapshot },
    /// Correct answer for a module below the frontier. No re-grant.
    AlreadyCompleted,
    /// Wrong answer. No state change.
    Incorrect,
    /// Module above the frontier; rejected regardless of the answer.
    Locked,
}

/// Pure check of a chosen option against the module's quiz.
pub fn evaluate(module: &ModuleDefinition, chosen: &str) -> bool {
    module.quiz.answer == chosen
}

/// Detect a progression commit that crashed between its two writes: XP at or
/// past the frontier module's reward with the level bump still missing. The
/// reward counts as granted; only the level write is owed. One bump at a
/// time, so a hand-inflated XP cell cannot mass-unlock the catalog.
pub fn owed_level_bump(catalog: &ModuleCatalog, user: &User) -> bool {
    let banked = catalog
        .iter()
        .take((user.level as usize).saturating_sub(1))
        .fold(0u32, |acc, m| acc.saturating_add(m.reward));
    match catalog.get(user.level) {
        Some(m) => user.xp >= banked.saturating_add(m.reward),
        None => false,
    }
}

/// Evaluate a submission and, on a first-time pass of the frontier module,
/// commit the reward. Level and XP only ever increase, and a level is
/// rewarded at most once: re-answering a cleared module is a no-op.
///
/// On `Advanced` the snapshot is rebuilt from the values just written, not
/// re-read from the store, so a concurrent writer cannot slip a second race
/// window in here.
pub async fn submit(
    repo: &UserRepo,
    module: &ModuleDefinition,
    session: &Snapshot,
    chosen: &str,
) -> Result<QuizOutcome, StoreError> {
    if module.index > session.level {
        return Ok(QuizOutcome::Locked);
    }
    if !evaluate(module, chosen) {
        return Ok(QuizOutcome::Incorrect);
    }
    if module.index < session.level {
        return Ok(QuizOutcome::AlreadyCompleted);
    }

    // The sheet is hand-editable, so an XP cell can sit anywhere in u32
    // range; saturate rather than wrap so xp and level never go backwards.
    let xp = session.xp.saturating_add(module.reward);
    let level = session.level.saturating_add(1);
    repo.update_level_and_xp(&session.username, level, xp).await?;
    info!(
        username = %session.username,
        module = module.index,
        level,
        xp,
        "module cleared"
    );

    Ok(QuizOutcome::Advanced {
        user: Snapshot {
            username: session.username.clone(),
            role: session.role,
            level,
            xp,
        },
    })
}
