use crate::api::AppState;
use crate::domain::user::User;
use crate::error::AppError;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

/// The authenticated principal, handed to handlers as an ordinary argument.
#[derive(Debug)]
pub struct AuthUser {
    pub user: User,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(header::AUTHORIZATION).ok_or(AppError::AuthError)?;
        let auth_str = auth_header.to_str().map_err(|_| AppError::AuthError)?;
        let token = extract_token(auth_str).ok_or(AppError::AuthError)?;

        let user = state.auth_service.authenticate(token).await?;
        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        Ok(Self { user })
    }
}

/// Accepts `Bearer <token>`, `Token token="<token>"` (optionally followed by
/// `, key=value` options) and `Token <token>`.
pub(crate) fn extract_token(header_value: &str) -> Option<&str> {
    let (scheme, rest) = header_value.trim().split_once(' ')?;
    let rest = rest.trim();

    let token = if scheme.eq_ignore_ascii_case("bearer") {
        rest
    } else if scheme.eq_ignore_ascii_case("token") {
        let first = rest.split([',', ';']).next().unwrap_or_default().trim();
        first.strip_prefix("token=").unwrap_or(first).trim_matches('"')
    } else {
        return None;
    };

    (!token.is_empty()).then_some(token)
}
