use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{ApiResponse, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest},
        services,
    },
    state::AppState,
};

/// Every endpoint answers HTTP 200 and signals the outcome through the
/// `status` field, which is what the mobile client switches on.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/esqueci_senha", post(forgot_password))
        .route("/auth/redefinir_senha", post(reset_password))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Json<ApiResponse> {
    match services::verify(&state, &payload.email_usuario, &payload.senha_usuario).await {
        Ok(identity) => Json(ApiResponse::logged_in(identity)),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Json<ApiResponse> {
    match services::request_reset(&state, &payload.email_usuario).await {
        Ok(()) => Json(ApiResponse::success("Código enviado para seu e-mail")),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Json<ApiResponse> {
    match services::redeem_reset(
        &state,
        &payload.email_usuario,
        &payload.codigo,
        &payload.nova_senha,
    )
    .await
    {
        Ok(()) => Json(ApiResponse::success("Senha redefinida com sucesso")),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PlaintextMatcher;
    use crate::auth::repo::{MemoryUserStore, UserStore};
    use crate::auth::repo_types::User;
    use crate::clock::ManualClock;
    use crate::config::{AppConfig, PasswordScheme};
    use crate::mailer::LogMailer;
    use std::sync::Arc;
    use time::macros::datetime;
    use uuid::Uuid;

    fn state_with_user() -> (AppState, Arc<MemoryUserStore>, Uuid) {
        let store = Arc::new(MemoryUserStore::new());
        let id = Uuid::new_v4();
        store.insert(User {
            id,
            email: "a@x.com".into(),
            name: "Ana".into(),
            password_hash: "secret".into(),
            reset_code: None,
            reset_expires: None,
            created_at: datetime!(2025-06-01 12:00 UTC),
        });
        let config = Arc::new(AppConfig {
            database_url: "postgres://unused".into(),
            password_scheme: PasswordScheme::Plaintext,
            mail_from: "no-reply@test".into(),
        });
        let state = AppState::from_parts(
            config,
            store.clone(),
            Arc::new(LogMailer::new("no-reply@test")),
            Arc::new(PlaintextMatcher),
            Arc::new(ManualClock::at(datetime!(2025-06-01 12:00 UTC))),
        );
        (state, store, id)
    }

    #[tokio::test]
    async fn login_handler_preserves_wire_contract() {
        let (state, _store, id) = state_with_user();

        let ok = login(
            State(state.clone()),
            Json(LoginRequest {
                email_usuario: "a@x.com".into(),
                senha_usuario: "secret".into(),
            }),
        )
        .await;
        let json = serde_json::to_value(&ok.0).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Login realizado com sucesso");
        assert_eq!(json["id_usuario"], id.to_string());
        assert_eq!(json["nome_usuario"], "Ana");

        let bad = login(
            State(state),
            Json(LoginRequest {
                email_usuario: "a@x.com".into(),
                senha_usuario: "wrong".into(),
            }),
        )
        .await;
        let json = serde_json::to_value(&bad.0).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Email ou senha incorretos");
        assert!(json.get("id_usuario").is_none());
    }

    #[tokio::test]
    async fn forgot_and_reset_handlers_round_trip() {
        let (state, store, id) = state_with_user();

        let issued = forgot_password(
            State(state.clone()),
            Json(ForgotPasswordRequest {
                email_usuario: "a@x.com".into(),
            }),
        )
        .await;
        let json = serde_json::to_value(&issued.0).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Código enviado para seu e-mail");

        let code = store.get(id).unwrap().reset_code.unwrap();
        let redeemed = reset_password(
            State(state),
            Json(ResetPasswordRequest {
                email_usuario: "a@x.com".into(),
                codigo: code,
                nova_senha: "nova123".into(),
            }),
        )
        .await;
        let json = serde_json::to_value(&redeemed.0).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Senha redefinida com sucesso");
        assert_eq!(store.get(id).unwrap().password_hash, "nova123");
    }

    #[tokio::test]
    async fn forgot_handler_reports_unknown_email() {
        let (state, _store, _id) = state_with_user();
        let res = forgot_password(
            State(state),
            Json(ForgotPasswordRequest {
                email_usuario: "nouser@x.com".into(),
            }),
        )
        .await;
        let json = serde_json::to_value(&res.0).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "E-mail não encontrado");
    }

    #[tokio::test]
    async fn reset_handler_reports_expired_code() {
        let (state, store, id) = state_with_user();
        // Expiry already behind the manual clock's noon.
        store
            .set_reset_fields(id, "123456", datetime!(2025-06-01 11:00 UTC))
            .await
            .unwrap();

        let res = reset_password(
            State(state),
            Json(ResetPasswordRequest {
                email_usuario: "a@x.com".into(),
                codigo: "123456".into(),
                nova_senha: "nova123".into(),
            }),
        )
        .await;
        let json = serde_json::to_value(&res.0).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Código inválido ou expirado");
    }
}
