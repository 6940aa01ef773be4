use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
///
/// `reset_code` and `reset_expires` are set and cleared together; a stored
/// code past its expiry is dead weight until the next reset overwrites it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String, // matched case-sensitively, as stored
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub reset_code: Option<String>,
    #[serde(skip_serializing)]
    pub reset_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}
