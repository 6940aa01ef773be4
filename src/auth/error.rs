use thiserror::Error;

/// Outcome kinds for the auth core. The `Display` text of each variant is
/// exactly the message clients see; `source` chains stay in the logs.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field was absent or blank after trimming.
    #[error("{0}")]
    MissingInput(&'static str),

    /// Unknown email or wrong password; the two cases must not be
    /// distinguishable from outside.
    #[error("Email ou senha incorretos")]
    InvalidCredentials,

    /// Reset requested for an email with no record. The shipped mobile
    /// client displays this message, so it stays.
    #[error("E-mail não encontrado")]
    EmailNotFound,

    /// Wrong code, wrong email, expired code, or a lost redeem race.
    #[error("Código inválido ou expirado")]
    InvalidOrExpiredCode,

    /// Persistence failure; `public` is the only text that crosses the
    /// handler boundary.
    #[error("{public}")]
    Store {
        public: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Mail handoff failed or timed out after the code was persisted.
    #[error("Falha ao enviar código")]
    Notify(#[source] anyhow::Error),
}

impl AuthError {
    pub fn store(public: &'static str, source: anyhow::Error) -> Self {
        Self::Store { public, source }
    }
}
