use serde::Deserialize;

/// How stored credentials are compared. Databases migrated from the old PHP
/// backend still hold plaintext passwords; new deployments hash with argon2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    Argon2,
    Plaintext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub password_scheme: PasswordScheme,
    pub mail_from: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let password_scheme = match std::env::var("PASSWORD_SCHEME").as_deref() {
            Ok("plaintext") => PasswordScheme::Plaintext,
            _ => PasswordScheme::Argon2,
        };
        let mail_from =
            std::env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@rotafacil.app".into());
        Ok(Self {
            database_url,
            password_scheme,
            mail_from,
        })
    }
}
