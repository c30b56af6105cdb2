use axum::{Extension, Json};
use bcrypt::verify;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use tracing::{info, warn};

use crate::db::models::User;
use crate::db::services::CredentialStore;
use crate::web::models::{AuthenticatedUser, Claims, LoginRequest, LoginResponse, UserResponse, VerifyResponse};

pub const TOKEN_TTL_HOURS: i64 = 24;

/// Plaintext accepted for every account while the demo bypass is enabled.
pub const DEMO_PASSWORD: &str = "password123";

/// Cost-10 hash checked when the email is unknown, so both failure paths pay
/// for one bcrypt verification.
const UNKNOWN_USER_HASH: &str = "$2a$10$92IXUNpkjO0rOQ5byMi.Ye4oKoEa3Ro9llC/.og/at2.uheWG/igi";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Access token required")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    ExpiredToken,
    #[error("Password verification failed: {0}")]
    PasswordVerification(String),
    #[error("JWT creation failed: {0}")]
    TokenCreation(String),
}

/// Single place deciding whether a plaintext matches a stored hash.
///
/// With `allow_demo_bypass` set, the fixed demo plaintext is accepted without
/// consulting the hash. Turning the flag off leaves plain bcrypt verification.
pub fn verify_password(
    plaintext: &str,
    password_hash: &str,
    allow_demo_bypass: bool,
) -> Result<bool, AuthError> {
    if allow_demo_bypass && plaintext == DEMO_PASSWORD {
        return Ok(true);
    }
    verify(plaintext, password_hash).map_err(|e| AuthError::PasswordVerification(e.to_string()))
}

pub async fn login_user(
    store: &dyn CredentialStore,
    req: LoginRequest,
    jwt_secret: &str,
    allow_demo_bypass: bool,
) -> Result<LoginResponse, AuthError> {
    // Unknown email and wrong password collapse into the same error.
    let user = match store.find_by_email(&req.email).await {
        Some(u) => u,
        None => {
            let _ = verify(&req.password, UNKNOWN_USER_HASH);
            warn!("Login attempt with unknown email.");
            return Err(AuthError::InvalidCredentials);
        }
    };

    if !verify_password(&req.password, &user.password_hash, allow_demo_bypass)? {
        warn!(user_id = user.id, "Login attempt with wrong password.");
        return Err(AuthError::InvalidCredentials);
    }

    let response = create_jwt_for_user(&user, jwt_secret)?;
    info!(user_id = user.id, "User logged in.");
    Ok(response)
}

pub fn create_jwt_for_user(user: &User, jwt_secret: &str) -> Result<LoginResponse, AuthError> {
    let token = issue_token(user, jwt_secret, Utc::now())?;
    Ok(LoginResponse {
        token,
        user: UserResponse {
            id: user.id,
            email: user.email.clone(),
        },
    })
}

/// Signs a token for `user` as if issued at `issued_at`.
pub fn issue_token(
    user: &User,
    jwt_secret: &str,
    issued_at: DateTime<Utc>,
) -> Result<String, AuthError> {
    let claims = Claims {
        user_id: user.id,
        email: user.email.clone(),
        iat: issued_at.timestamp(),
        exp: (issued_at + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret.as_ref()))
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
}

/// Checks signature and expiry of a bearer token and returns its claims.
pub fn verify_token(token: Option<&str>, jwt_secret: &str) -> Result<Claims, AuthError> {
    let token = match token {
        Some(t) if !t.trim().is_empty() => t.trim(),
        _ => return Err(AuthError::MissingToken),
    };

    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(jwt_secret.as_ref()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })
}

pub async fn verify_session(
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<VerifyResponse> {
    Json(VerifyResponse { user: user.claims })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::InMemoryCredentialStore;
    use crate::db::services::user_service::SEED_ADMIN_EMAIL;

    const SECRET: &str = "test-secret";

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn admin() -> User {
        User {
            id: 1,
            email: SEED_ADMIN_EMAIL.to_string(),
            password_hash: String::new(),
        }
    }

    #[tokio::test]
    async fn test_login_seeded_admin_with_demo_password() {
        let store = InMemoryCredentialStore::seeded();
        let response = login_user(&store, login(SEED_ADMIN_EMAIL, DEMO_PASSWORD), SECRET, true)
            .await
            .unwrap();

        assert!(!response.token.is_empty());
        assert_eq!(response.user.id, 1);
        assert_eq!(response.user.email, SEED_ADMIN_EMAIL);

        let claims = verify_token(Some(&response.token), SECRET).unwrap();
        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.email, SEED_ADMIN_EMAIL);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_HOURS * 3600);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
        let store = InMemoryCredentialStore::seeded();
        let unknown = login_user(&store, login("ghost@test.com", DEMO_PASSWORD), SECRET, true)
            .await
            .unwrap_err();
        let wrong = login_user(&store, login(SEED_ADMIN_EMAIL, "nope"), SECRET, true)
            .await
            .unwrap_err();

        assert_eq!(unknown, AuthError::InvalidCredentials);
        assert_eq!(wrong, unknown);
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_unknown_email_still_runs_full_cost_verification() {
        // Must parse as a real cost-10 hash, otherwise the unknown-email path
        // returns faster than a wrong password against a stored account.
        assert!(!bcrypt::verify("anything", UNKNOWN_USER_HASH).unwrap());
        assert!(UNKNOWN_USER_HASH.starts_with("$2a$10$"));

        let store = InMemoryCredentialStore::seeded();
        let err = login_user(&store, login("ghost@test.com", "nope"), SECRET, false)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_hashed_password_path_without_bypass() {
        let store = InMemoryCredentialStore::seeded();
        let hash = bcrypt::hash("s3cret-pass", 4).unwrap();
        store.insert_user("ops@test.com", &hash).await.unwrap();

        let ok = login_user(&store, login("ops@test.com", "s3cret-pass"), SECRET, false).await;
        assert_eq!(ok.unwrap().user.id, 2);

        let bypass = login_user(&store, login("ops@test.com", DEMO_PASSWORD), SECRET, false).await;
        assert_eq!(bypass.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[test]
    fn test_verify_password_bypass_is_switchable() {
        let hash = bcrypt::hash("other", 4).unwrap();
        assert!(verify_password(DEMO_PASSWORD, &hash, true).unwrap());
        assert!(!verify_password(DEMO_PASSWORD, &hash, false).unwrap());
        assert!(verify_password("other", &hash, false).unwrap());
    }

    #[test]
    fn test_verify_password_malformed_hash() {
        let err = verify_password("whatever", "not-a-bcrypt-hash", true).unwrap_err();
        assert!(matches!(err, AuthError::PasswordVerification(_)));
    }

    #[test]
    fn test_verify_token_missing() {
        assert_eq!(verify_token(None, SECRET), Err(AuthError::MissingToken));
        assert_eq!(verify_token(Some("  "), SECRET), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_verify_token_garbage_and_wrong_secret() {
        assert_eq!(verify_token(Some("garbage"), SECRET), Err(AuthError::InvalidToken));

        let token = issue_token(&admin(), "another-secret", Utc::now()).unwrap();
        assert_eq!(verify_token(Some(&token), SECRET), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_verify_token_expired() {
        let issued = Utc::now() - Duration::hours(TOKEN_TTL_HOURS + 1);
        let token = issue_token(&admin(), SECRET, issued).unwrap();
        assert_eq!(verify_token(Some(&token), SECRET), Err(AuthError::ExpiredToken));
    }

    #[test]
    fn test_verify_token_just_before_expiry() {
        let issued = Utc::now() - Duration::hours(TOKEN_TTL_HOURS) + Duration::minutes(5);
        let token = issue_token(&admin(), SECRET, issued).unwrap();
        assert_eq!(verify_token(Some(&token), SECRET).unwrap().user_id, 1);
    }
}
