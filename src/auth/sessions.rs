use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::Credentials;
use crate::progression::{catalog::ModuleCatalog, engine};
use crate::store::StoreError;
use crate::users::repo::{Role, User, UserRepo};

/// Cached copy of a user's identity and progress, taken at login and
/// refreshed explicitly after every mutating operation. It can go stale at
/// any time relative to the store; staleness is resolved on the session's
/// own next mutation, never by push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub username: String,
    pub role: Role,
    pub level: u32,
    pub xp: u32,
}

impl Snapshot {
    pub fn of(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
            level: user.level,
            xp: user.xp,
        }
    }
}

/// Process-scoped session registry: opaque bearer token -> snapshot.
/// Sessions are independent per client; nothing here is shared with the
/// store or across processes.
#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<RwLock<HashMap<Uuid, Snapshot>>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&self, snapshot: Snapshot) -> Uuid {
        let token = Uuid::new_v4();
        self.inner.write().await.insert(token, snapshot);
        token
    }

    pub async fn get(&self, token: &Uuid) -> Option<Snapshot> {
        self.inner.read().await.get(token).cloned()
    }

    /// Replace the cached snapshot after a durable write. No-op if the
    /// session was closed in the meantime.
    pub async fn refresh(&self, token: &Uuid, snapshot: Snapshot) {
        let mut sessions = self.inner.write().await;
        if let Some(entry) = sessions.get_mut(token) {
            *entry = snapshot;
        }
    }

    pub async fn close(&self, token: &Uuid) {
        self.inner.write().await.remove(token);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("unknown user")]
    UnknownUser,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Validate credentials against the Users table and open a session. A
/// rejected login leaves the registry and the store untouched.
///
/// Loading is also where an interrupted progression commit gets repaired: a
/// row whose XP ran ahead of its level (crash between the two cell writes)
/// has its level write completed here, without re-granting the reward.
pub async fn login(
    repo: &UserRepo,
    sessions: &Sessions,
    credentials: &Credentials,
    catalog: &ModuleCatalog,
    username: &str,
    secret: &str,
) -> Result<(Uuid, Snapshot), LoginError> {
    let mut user = match repo.find_by_username(username).await? {
        Some(u) => u,
        None => {
            warn!(username, "login for unknown user");
            return Err(LoginError::UnknownUser);
        }
    };

    if !credentials.verify(secret, &user.password)? {
        warn!(username, "login with invalid password");
        return Err(LoginError::InvalidCredentials);
    }

    if engine::owed_level_bump(catalog, &user) {
        let level = user.level.saturating_add(1);
        warn!(username, level, "completing interrupted progression commit");
        repo.update_level_and_xp(username, level, user.xp).await?;
        user.level = level;
    }

    let snapshot = Snapshot::of(&user);
    let token = sessions.open(snapshot.clone()).await;
    info!(username, level = snapshot.level, "session opened");
    Ok((token, snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialScheme;
    use crate::store::{memory::MemoryStore, row};
    use crate::users::repo;

    fn fixture_at(level: &str, xp: &str) -> (UserRepo, Sessions, Credentials, ModuleCatalog) {
        let store = Arc::new(MemoryStore::new().seed(
            repo::TABLE,
            vec![row(&[
                ("Username", "Nova"),
                ("Password", "starling"),
                ("Role", "Member"),
                ("Level", level),
                ("XP", xp),
            ])],
        ));
        (
            UserRepo::new(store),
            Sessions::new(),
            Credentials::new(CredentialScheme::Plain),
            ModuleCatalog::builtin(),
        )
    }

    fn fixture() -> (UserRepo, Sessions, Credentials, ModuleCatalog) {
        fixture_at("1", "0")
    }

    #[tokio::test]
    async fn login_opens_session_with_snapshot() {
        let (repo, sessions, creds, catalog) = fixture();
        let (token, snapshot) = login(&repo, &sessions, &creds, &catalog, "Nova", "starling")
            .await
            .expect("login");
        assert_eq!(snapshot.username, "Nova");
        assert_eq!(snapshot.role, Role::Member);
        assert_eq!((snapshot.level, snapshot.xp), (1, 0));
        assert!(sessions.get(&token).await.is_some());
    }

    #[tokio::test]
    async fn wrong_password_stays_anonymous() {
        let (repo, sessions, creds, catalog) = fixture();
        let err = login(&repo, &sessions, &creds, &catalog, "Nova", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials));
        assert_eq!(sessions.len().await, 0);
        // Store untouched: the stored secret still matches.
        let user = repo.find_by_username("Nova").await.unwrap().unwrap();
        assert_eq!(user.password, "starling");
    }

    #[tokio::test]
    async fn unknown_user_is_distinct_from_bad_password() {
        let (repo, sessions, creds, catalog) = fixture();
        let err = login(&repo, &sessions, &creds, &catalog, "Orion", "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::UnknownUser));
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn login_repairs_an_interrupted_progression_commit() {
        // XP landed but the level write was lost mid-advance.
        let (repo, sessions, creds, catalog) = fixture_at("1", "100");
        let (_, snapshot) = login(&repo, &sessions, &creds, &catalog, "Nova", "starling")
            .await
            .expect("login");
        // The unlock is completed without re-granting the reward.
        assert_eq!((snapshot.level, snapshot.xp), (2, 100));
        let stored = repo.find_by_username("Nova").await.unwrap().unwrap();
        assert_eq!((stored.level, stored.xp), (2, 100));
    }

    #[tokio::test]
    async fn logout_discards_the_snapshot() {
        let (repo, sessions, creds, catalog) = fixture();
        let (token, _) = login(&repo, &sessions, &creds, &catalog, "Nova", "starling")
            .await
            .unwrap();
        sessions.close(&token).await;
        assert!(sessions.get(&token).await.is_none());
    }

    #[tokio::test]
    async fn refresh_replaces_only_live_sessions() {
        let (repo, sessions, creds, catalog) = fixture();
        let (token, mut snapshot) = login(&repo, &sessions, &creds, &catalog, "Nova", "starling")
            .await
            .unwrap();
        snapshot.level = 2;
        snapshot.xp = 100;
        sessions.refresh(&token, snapshot).await;
        let cached = sessions.get(&token).await.unwrap();
        assert_eq!((cached.level, cached.xp), (2, 100));

        let ghost = Uuid::new_v4();
        sessions.refresh(&ghost, cached).await;
        assert!(sessions.get(&ghost).await.is_none());
    }
}
