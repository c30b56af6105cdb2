use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::services::auth_service::{self, AuthError};
use crate::web::models::AuthenticatedUser;
use crate::web::{AppState, error::AppError};

/// Credentials part of an `Authorization` header.
///
/// The scheme word is not checked, so `bearer` and `Bearer` both work and a
/// foreign scheme hands its payload to token verification.
fn credentials(header: &str) -> Option<&str> {
    let (_scheme, rest) = header.trim().split_once(char::is_whitespace)?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

pub async fn auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let jwt_secret = &state.config.jwt_secret;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(credentials);

    let claims = auth_service::verify_token(token, jwt_secret).map_err(|e| {
        match e {
            AuthError::MissingToken => warn!(path = %req.uri().path(), "Request without access token."),
            _ => warn!(path = %req.uri().path(), error = %e, "Rejected access token."),
        }
        AppError::from(e)
    })?;

    let authenticated_user = AuthenticatedUser {
        id: claims.user_id,
        claims,
    };
    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}
