use crate::domain::user::{Registration, User};
use crate::services::user_service::CreatedUser;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Body of `POST /api/v1/users`. Keys other than `user` are ignored.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub user: UserParams,
}

/// The permitted creation fields. Unknown keys are dropped during deserialization.
#[derive(Default, Deserialize)]
pub struct UserParams {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub token: Option<String>,
}

impl UserParams {
    /// True when none of the permitted fields were supplied, e.g. `{"user": {}}`.
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.password_confirmation.is_none()
            && self.token.is_none()
    }
}

impl std::fmt::Debug for UserParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserParams").field("name", &self.name).field("email", &self.email).finish_non_exhaustive()
    }
}

impl From<UserParams> for Registration {
    fn from(params: UserParams) -> Self {
        Self {
            name: params.name,
            email: params.email,
            password: params.password,
            password_confirmation: params.password_confirmation,
            token: params.token,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self { id: user.id, name: user.name, email: user.email, created_at: user.created_at }
    }
}

/// The only representation that carries the plaintext token.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedUserResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
}

impl From<CreatedUser> for CreatedUserResponse {
    fn from(created: CreatedUser) -> Self {
        Self { user: created.user.into(), token: created.token }
    }
}

/// Failure body of the create operation in legacy status mode.
#[derive(Debug, Serialize, Deserialize)]
pub struct FailureResponse {
    pub message: String,
    pub status: u16,
}

impl FailureResponse {
    #[must_use]
    pub fn legacy() -> Self {
        Self { message: "failed".to_string(), status: 500 }
    }
}
