use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::services::RedisService;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the user id
    sub: String,
    /// Issued-at unix seconds
    iat: i64,
    /// Expiration unix seconds
    exp: i64,
}

// The authenticated actor, inserted as a request extension by require_auth.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub fn issue_token(secret: &str, ttl_days: i64, user_id: &str) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::days(ttl_days.max(1));
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::default();
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

// Bearer-token gate for everything behind /api except register/login.
// Verifies the JWT, loads the referenced user from the store and makes it
// available to handlers as a CurrentUser extension.
pub async fn require_auth(
    State((redis_service, config)): State<(RedisService, Config)>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Take the token out of the request up front; the request (and its
    // non-Sync body) must not be borrowed across the store lookup.
    let token = bearer_token(req.headers());

    match authenticate(&redis_service, &config, &token).await {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

pub(crate) fn bearer_token(headers: &axum::http::HeaderMap) -> String {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .unwrap_or("")
        .to_string()
}

async fn authenticate(
    redis_service: &RedisService,
    config: &Config,
    token: &str,
) -> AppResult<User> {
    if token.is_empty() {
        return Err(AppError::Auth("Not authorised, no token".to_string()));
    }

    let claims = verify_token(token, &config.auth.jwt_secret)?;

    // The token outliving its user is possible; treat that as unauthenticated.
    redis_service
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Auth("Not authorised, user not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let token = issue_token("test-secret", 7, "u1").unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "u1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_fails_with_wrong_secret() {
        let token = issue_token("test-secret", 7, "u1").unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token("not.a.jwt", "test-secret").is_err());
    }

    #[test]
    fn bearer_token_strips_prefix_case_insensitively() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), "abc.def");

        headers.insert(axum::http::header::AUTHORIZATION, "bearer xyz".parse().unwrap());
        assert_eq!(bearer_token(&headers), "xyz");

        headers.insert(axum::http::header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), "");

        assert_eq!(bearer_token(&axum::http::HeaderMap::new()), "");
    }

    // The middleware future must stay Send or the router layer stops
    // implementing Service; holding the request across the store lookup
    // broke this once.
    #[test]
    fn authenticate_future_is_send() {
        fn assert_send<T: Send>(_: T) {}

        let service = RedisService::new(std::sync::Arc::new(
            redis::Client::open("redis://127.0.0.1:6379").unwrap(),
        ));
        let config = Config {
            server: crate::config::ServerConfig { host: "127.0.0.1".into(), port: 0 },
            redis: crate::config::RedisConfig {
                url: "redis://127.0.0.1:6379".into(),
                sentinel_enabled: false,
                sentinel_url: None,
            },
            auth: crate::config::AuthConfig {
                jwt_secret: "test-secret".into(),
                token_ttl_days: 7,
                admin_invite_token: String::new(),
            },
            upload: crate::config::UploadConfig {
                max_file_size: 1024,
                dir: "uploads".into(),
                public_base_url: "http://localhost".into(),
            },
        };

        assert_send(authenticate(&service, &config, "token"));
    }
}
