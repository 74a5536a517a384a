use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use borderpass_core::auth::{AuthContext, Claims, ClaimsBuilder};
use borderpass_core::domain::User;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT secret for HMAC signing.
    pub jwt_secret: String,
    /// JWT algorithm (HS256, HS384, HS512).
    pub algorithm: JwtAlgorithm,
    /// Lifetime of issued session tokens.
    pub session_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            algorithm: JwtAlgorithm::HS256,
            session_ttl_secs: 8 * 60 * 60,
        }
    }
}

impl AuthConfig {
    /// Create a new auth config with the given secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            ..Default::default()
        }
    }

    /// Config with a throwaway secret. Tokens do not survive a restart.
    pub fn dev_mode() -> Self {
        Self::with_secret(format!(
            "dev-{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        ))
    }
}

/// Supported JWT algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JwtAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Issues and validates session tokens.
#[derive(Clone)]
pub struct AuthMiddleware {
    config: Arc<AuthConfig>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for AuthMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMiddleware")
            .field("algorithm", &self.config.algorithm)
            .field("session_ttl_secs", &self.config.session_ttl_secs)
            .finish()
    }
}

impl AuthMiddleware {
    /// Create a new auth middleware. An empty secret is rejected.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        if config.jwt_secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        let secret = config.jwt_secret.as_bytes();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            config: Arc::new(config),
        })
    }

    /// Get the config.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Sign a session token for an authenticated user.
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let claims = ClaimsBuilder::new()
            .user_id(user.id)
            .role(user.role)
            .duration_secs(self.config.session_ttl_secs)
            .build()
            .map_err(AuthError::InvalidToken)?;

        encode(
            &Header::new(self.config.algorithm.into()),
            &claims,
            &self.encoding_key,
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Validate a JWT token and extract claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.config.algorithm.into());

        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 60; // clock skew tolerance

        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::InvalidToken("Invalid signature".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AuthError::InvalidToken("Invalid token format".to_string())
                }
                jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) => {
                    AuthError::InvalidToken(format!("Missing required claim: {}", claim))
                }
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }
}

/// Authentication errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Token expired")]
    TokenExpired,
}

/// Extract auth context from request. Bad or missing tokens yield an
/// unauthenticated context; handlers decide whether that is acceptable.
pub fn extract_auth_context(req: &Request<Body>, middleware: &AuthMiddleware) -> AuthContext {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return AuthContext::unauthenticated();
    };

    match middleware
        .validate_token(token)
        .map(|claims| AuthContext::from_claims(&claims))
    {
        Ok(Ok(ctx)) => ctx,
        Ok(Err(e)) => {
            debug!("Rejected token claims: {}", e);
            AuthContext::unauthenticated()
        }
        Err(e) => {
            debug!("Rejected bearer token: {}", e);
            AuthContext::unauthenticated()
        }
    }
}

/// Authentication middleware function.
pub async fn auth_middleware(
    State(middleware): State<Arc<AuthMiddleware>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let auth_context = extract_auth_context(&req, &middleware);

    let mut req = req;
    req.extensions_mut().insert(auth_context);

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use borderpass_core::access::Role;
    use borderpass_core::domain::{NewUser, UserProfile};
    use chrono::Utc;

    fn user(id: i64, role: Role) -> User {
        NewUser::new(
            "inspector",
            "pass123",
            role,
            UserProfile {
                name: "Inspector".into(),
                ..Default::default()
            },
        )
        .unwrap()
        .into_user(id, Utc::now())
    }

    fn create_test_token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(expired: bool) -> Claims {
        let builder = ClaimsBuilder::new().user_id(7).role(Role::IdentityReviewer);
        let builder = if expired {
            builder.duration_secs(-3600)
        } else {
            builder.duration_secs(3600)
        };
        builder.build().unwrap()
    }

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert_eq!(config.algorithm, JwtAlgorithm::HS256);
        assert_eq!(config.session_ttl_secs, 8 * 60 * 60);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            AuthMiddleware::new(AuthConfig::default()),
            Err(AuthError::MissingSecret)
        ));
    }

    #[test]
    fn test_dev_mode_secrets_differ() {
        assert_ne!(
            AuthConfig::dev_mode().jwt_secret,
            AuthConfig::dev_mode().jwt_secret
        );
    }

    #[test]
    fn test_issue_and_validate() {
        let middleware = AuthMiddleware::new(AuthConfig::with_secret("test-secret")).unwrap();
        let token = middleware
            .issue_token(&user(12, Role::AgricultureReviewer))
            .unwrap();

        let claims = middleware.validate_token(&token).unwrap();
        assert_eq!(claims.user_id(), Some(12));
        assert_eq!(claims.role, Role::AgricultureReviewer);
    }

    #[test]
    fn test_hs512_round_trip() {
        let config = AuthConfig {
            algorithm: JwtAlgorithm::HS512,
            ..AuthConfig::with_secret("test-secret")
        };
        let middleware = AuthMiddleware::new(config).unwrap();
        let token = middleware.issue_token(&user(3, Role::Traveler)).unwrap();
        assert!(middleware.validate_token(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret() {
        let middleware = AuthMiddleware::new(AuthConfig::with_secret("correct-secret")).unwrap();
        let token = create_test_token(&claims(false), "wrong-secret");

        match middleware.validate_token(&token) {
            Err(AuthError::InvalidToken(_)) => {}
            other => panic!("Expected InvalidToken error, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_token() {
        let middleware = AuthMiddleware::new(AuthConfig::with_secret("test-secret")).unwrap();
        let token = create_test_token(&claims(true), "test-secret");

        match middleware.validate_token(&token) {
            Err(AuthError::TokenExpired) => {}
            other => panic!("Expected TokenExpired error, got {:?}", other),
        }
    }

    #[test]
    fn test_tampered_token() {
        let middleware = AuthMiddleware::new(AuthConfig::with_secret("test-secret")).unwrap();
        let mut token = create_test_token(&claims(false), "test-secret");

        if let Some(last_char) = token.pop() {
            let replacement = if last_char == 'a' { 'b' } else { 'a' };
            token.push(replacement);
        }

        assert!(middleware.validate_token(&token).is_err());
    }

    #[test]
    fn test_invalid_token_format() {
        let middleware = AuthMiddleware::new(AuthConfig::with_secret("secret")).unwrap();
        match middleware.validate_token("not-a-valid-jwt") {
            Err(AuthError::InvalidToken(_)) => {}
            other => panic!("Expected InvalidToken error, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_context_from_header() {
        let middleware = AuthMiddleware::new(AuthConfig::with_secret("secret")).unwrap();
        let token = middleware.issue_token(&user(5, Role::Administrator)).unwrap();

        let req = Request::builder()
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let ctx = extract_auth_context(&req, &middleware);
        assert_eq!(ctx.user_id(), Some(5));
        assert_eq!(ctx.role(), Some(Role::Administrator));

        let anonymous = Request::builder().body(Body::empty()).unwrap();
        assert!(!extract_auth_context(&anonymous, &middleware).is_authenticated());
    }

    #[test]
    fn test_algorithm_conversion() {
        assert_eq!(Algorithm::from(JwtAlgorithm::HS256), Algorithm::HS256);
        assert_eq!(Algorithm::from(JwtAlgorithm::HS384), Algorithm::HS384);
        assert_eq!(Algorithm::from(JwtAlgorithm::HS512), Algorithm::HS512);
    }
}
