use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::services::Identity;

/// Request body for login.
///
/// Fields default to empty so an absent field takes the same missing-input
/// path as a blank one.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email_usuario: String,
    #[serde(default)]
    pub senha_usuario: String,
}

/// Request body for requesting a reset code.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email_usuario: String,
}

/// Request body for redeeming a reset code.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email_usuario: String,
    #[serde(default)]
    pub codigo: String,
    #[serde(default)]
    pub nova_senha: String,
}

/// Response envelope shared by the three endpoints. Field names and message
/// texts are what the shipped mobile client parses.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_usuario: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_usuario: Option<String>,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
            id_usuario: None,
            nome_usuario: None,
        }
    }

    pub fn logged_in(identity: Identity) -> Self {
        Self {
            status: "success",
            message: "Login realizado com sucesso".into(),
            id_usuario: Some(identity.id),
            nome_usuario: Some(identity.name),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            id_usuario: None,
            nome_usuario: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_omits_identity_fields() {
        let json = serde_json::to_string(&ApiResponse::error("Campos faltando")).unwrap();
        assert_eq!(json, r#"{"status":"error","message":"Campos faltando"}"#);
    }

    #[test]
    fn login_response_carries_identity_fields() {
        let identity = Identity {
            id: Uuid::new_v4(),
            name: "Carlos".into(),
        };
        let json = serde_json::to_string(&ApiResponse::logged_in(identity)).unwrap();
        assert!(json.contains(r#""status":"success""#));
        assert!(json.contains(r#""message":"Login realizado com sucesso""#));
        assert!(json.contains("id_usuario"));
        assert!(json.contains(r#""nome_usuario":"Carlos""#));
    }

    #[test]
    fn absent_request_fields_default_to_empty() {
        let req: LoginRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.email_usuario, "");
        assert_eq!(req.senha_usuario, "");
    }
}
