use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Record storage for the auth core.
///
/// Every call is atomic. The two mutating calls carry their own match
/// condition and report whether a row was hit, so a caller that loses a race
/// sees `false` instead of silently double-applying.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Single conditional read: email, code and an unexpired expiry must all
    /// match the same record.
    async fn find_by_email_code_unexpired(
        &self,
        email: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>>;

    /// Stores a fresh code and expiry, overwriting any pending pair.
    /// Returns false when the row no longer exists.
    async fn set_reset_fields(
        &self,
        id: Uuid,
        code: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<bool>;

    /// Sets the credential and clears both reset fields in one guarded
    /// update. Returns false when the guard (id, code, unexpired) no longer
    /// matches.
    async fn consume_reset_and_set_password(
        &self,
        id: Uuid,
        new_credential: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, reset_code, reset_expires, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email_code_unexpired(
        &self,
        email: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, reset_code, reset_expires, created_at
            FROM users
            WHERE email = $1 AND reset_code = $2 AND reset_expires >= $3
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn set_reset_fields(
        &self,
        id: Uuid,
        code: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reset_code = $2, reset_expires = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(expires)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn consume_reset_and_set_password(
        &self,
        id: Uuid,
        new_credential: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_code = NULL, reset_expires = NULL
            WHERE id = $1 AND reset_code = $3 AND reset_expires >= $4
            "#,
        )
        .bind(id)
        .bind(new_credential)
        .bind(code)
        .bind(now)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-memory store with the same per-call atomicity (one mutex-scoped
/// critical section per call). Backs the tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }
}

fn code_matches(user: &User, code: &str, now: OffsetDateTime) -> bool {
    user.reset_code.as_deref() == Some(code)
        && user.reset_expires.is_some_and(|expires| expires >= now)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_email_code_unexpired(
        &self,
        email: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.email == email && code_matches(u, code, now))
            .cloned())
    }

    async fn set_reset_fields(
        &self,
        id: Uuid,
        code: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&id) {
            Some(user) => {
                user.reset_code = Some(code.to_string());
                user.reset_expires = Some(expires);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn consume_reset_and_set_password(
        &self,
        id: Uuid,
        new_credential: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&id) {
            Some(user) if code_matches(user, code, now) => {
                user.password_hash = new_credential.to_string();
                user.reset_code = None;
                user.reset_expires = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn sample_user(now: OffsetDateTime) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            name: "Ana".into(),
            password_hash: "old".into(),
            reset_code: Some("123456".into()),
            reset_expires: Some(now + Duration::minutes(15)),
            created_at: now,
        }
    }

    #[tokio::test]
    async fn consume_is_all_or_nothing() {
        let now = OffsetDateTime::now_utc();
        let store = MemoryUserStore::new();
        let user = sample_user(now);
        let id = user.id;
        store.insert(user);

        assert!(store
            .consume_reset_and_set_password(id, "new", "123456", now)
            .await
            .unwrap());
        let after = store.get(id).unwrap();
        assert_eq!(after.password_hash, "new");
        assert!(after.reset_code.is_none());
        assert!(after.reset_expires.is_none());

        // Same code again: the guard no longer matches.
        assert!(!store
            .consume_reset_and_set_password(id, "newer", "123456", now)
            .await
            .unwrap());
        assert_eq!(store.get(id).unwrap().password_hash, "new");
    }

    #[tokio::test]
    async fn consume_rejects_expired_code() {
        let now = OffsetDateTime::now_utc();
        let store = MemoryUserStore::new();
        let user = sample_user(now);
        let id = user.id;
        store.insert(user);

        let later = now + Duration::minutes(16);
        assert!(!store
            .consume_reset_and_set_password(id, "new", "123456", later)
            .await
            .unwrap());
        // Expired code stays stored; only a successful consume clears it.
        assert!(store.get(id).unwrap().reset_code.is_some());
    }
}
