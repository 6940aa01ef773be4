use lazy_static::lazy_static;
use rand::{rngs::OsRng, Rng};
use regex::Regex;
use time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::state::AppState;

/// Issued reset codes are valid this long.
const RESET_CODE_TTL: Duration = Duration::minutes(15);

/// Upper bound on the mail handoff; a stalled relay must not stall the
/// request. Elapsing counts as a delivery failure.
const NOTIFY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

const RESET_MAIL_SUBJECT: &str = "Código de redefinição de senha";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims a submitted field; `None` means the field is missing or blank.
fn trimmed(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// 6-digit code; the range makes a leading zero impossible.
fn generate_reset_code() -> String {
    OsRng.gen_range(100_000..=999_999).to_string()
}

/// Minimal user-facing identity returned on successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
}

/// Checks submitted credentials against the stored record.
///
/// Unknown email and wrong password produce the same outcome; a malformed
/// email short-circuits to it without a store round-trip.
pub async fn verify(state: &AppState, email: &str, password: &str) -> Result<Identity, AuthError> {
    let (Some(email), Some(password)) = (trimmed(email), trimmed(password)) else {
        return Err(AuthError::MissingInput("Email ou senha não fornecidos."));
    };

    if !is_valid_email(email) {
        warn!("login with malformed email");
        return Err(AuthError::InvalidCredentials);
    }

    let user = state.store.find_by_email(email).await.map_err(|e| {
        error!(error = %e, "find_by_email failed");
        AuthError::store("Email ou senha incorretos", e)
    })?;
    let Some(user) = user else {
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    let ok = state
        .matcher
        .verify(password, &user.password_hash)
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "credential match failed");
            AuthError::store("Email ou senha incorretos", e)
        })?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Identity {
        id: user.id,
        name: user.name,
    })
}

/// Issues a reset code for an existing account and mails it.
///
/// The code is persisted before the mail handoff and stays persisted even if
/// delivery fails; both failures surface as the same coarse outcome.
pub async fn request_reset(state: &AppState, email: &str) -> Result<(), AuthError> {
    let Some(email) = trimmed(email) else {
        return Err(AuthError::MissingInput("Informe o e-mail"));
    };

    // Records are created externally and their addresses are not guaranteed
    // to match the login regex; the store decides whether the email exists.
    let user = state.store.find_by_email(email).await.map_err(|e| {
        error!(error = %e, "find_by_email failed");
        AuthError::store("Falha ao enviar código", e)
    })?;
    let Some(user) = user else {
        warn!(email = %email, "reset requested for unknown email");
        return Err(AuthError::EmailNotFound);
    };

    let code = generate_reset_code();
    let expires = state.clock.now() + RESET_CODE_TTL;

    let stored = state
        .store
        .set_reset_fields(user.id, &code, expires)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "set_reset_fields failed");
            AuthError::store("Falha ao enviar código", e)
        })?;
    if !stored {
        error!(user_id = %user.id, "user row vanished while storing reset code");
        return Err(AuthError::store(
            "Falha ao enviar código",
            anyhow::anyhow!("no row updated"),
        ));
    }

    // Handoff happens after the write; no store access is in flight here.
    let body = format!("Seu código de redefinição é: {code}\nEste código expira em 15 minutos.");
    match tokio::time::timeout(
        NOTIFY_TIMEOUT,
        state.mailer.send(email, RESET_MAIL_SUBJECT, &body),
    )
    .await
    {
        Ok(Ok(())) => {
            info!(user_id = %user.id, "reset code issued");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, user_id = %user.id, "reset mail failed");
            Err(AuthError::Notify(e))
        }
        Err(elapsed) => {
            error!(user_id = %user.id, "reset mail timed out");
            Err(AuthError::Notify(anyhow::anyhow!(elapsed)))
        }
    }
}

/// Redeems a reset code: sets the new credential and clears the code in one
/// guarded update.
///
/// Which of email, code or expiry failed to match is never revealed.
pub async fn redeem_reset(
    state: &AppState,
    email: &str,
    code: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    let (Some(email), Some(code), Some(new_password)) =
        (trimmed(email), trimmed(code), trimmed(new_password))
    else {
        return Err(AuthError::MissingInput("Campos faltando"));
    };

    let user = state
        .store
        .find_by_email_code_unexpired(email, code, state.clock.now())
        .await
        .map_err(|e| {
            error!(error = %e, "find_by_email_code_unexpired failed");
            AuthError::store("Código inválido ou expirado", e)
        })?;
    let Some(user) = user else {
        warn!(email = %email, "redeem with no matching unexpired code");
        return Err(AuthError::InvalidOrExpiredCode);
    };

    let credential = state.matcher.hash(new_password).map_err(|e| {
        error!(error = %e, user_id = %user.id, "hashing new credential failed");
        AuthError::store("Erro ao atualizar senha", e)
    })?;

    let consumed = state
        .store
        .consume_reset_and_set_password(user.id, &credential, code, state.clock.now())
        .await
        .map_err(|e| {
            // The write failed with the code still in place, so the client
            // can retry with the same code.
            error!(error = %e, user_id = %user.id, "consume_reset_and_set_password failed");
            AuthError::store("Erro ao atualizar senha", e)
        })?;
    if !consumed {
        // A concurrent redeem or a fresh reset request won between the read
        // and the write.
        warn!(user_id = %user.id, "reset code no longer matches at write time");
        return Err(AuthError::InvalidOrExpiredCode);
    }

    info!(user_id = %user.id, "password redefined");
    Ok(())
}
