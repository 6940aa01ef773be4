use std::sync::Arc;

use crate::auth::password::{Argon2Matcher, CredentialMatcher, PlaintextMatcher};
use crate::auth::repo::{PgUserStore, UserStore};
use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, PasswordScheme};
use crate::mailer::{LogMailer, Mailer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn UserStore>,
    pub mailer: Arc<dyn Mailer>,
    pub matcher: Arc<dyn CredentialMatcher>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        let matcher: Arc<dyn CredentialMatcher> = match config.password_scheme {
            PasswordScheme::Argon2 => Arc::new(Argon2Matcher),
            PasswordScheme::Plaintext => Arc::new(PlaintextMatcher),
        };
        let mailer = Arc::new(LogMailer::new(config.mail_from.clone()));

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserStore::new(db)),
            mailer,
            matcher,
            Arc::new(SystemClock),
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        matcher: Arc<dyn CredentialMatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            mailer,
            matcher,
            clock,
        }
    }
}
