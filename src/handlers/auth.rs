use axum::{
    extract::{Extension, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::{issue_token, CurrentUser};
use crate::models::{
    normalize_email, AuthResponse, LoginRequest, RegisterRequest, Role, UpdateProfileRequest,
    User, UserView,
};
use crate::services::RedisService;

fn auth_response(user: &User, token: String) -> AuthResponse {
    AuthResponse {
        id: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
        profile_image_url: user.profile_image_url.clone(),
        token,
    }
}

pub async fn register(
    State((redis_service, config)): State<(RedisService, Config)>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> AppResult<Response> {
    let email = normalize_email(&req.email);
    if req.name.trim().is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required".to_string(),
        ));
    }

    if redis_service.get_user_by_email(&email).await?.is_some() {
        // Duplicate email reports as 400, not 409
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let role = match &req.admin_invite_token {
        Some(token) if !config.auth.admin_invite_token.is_empty()
            && *token == config.auth.admin_invite_token => Role::Admin,
        _ => Role::Member,
    };

    let password_hash = hash(req.password.as_bytes(), DEFAULT_COST)?;
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        email,
        password_hash,
        role,
        profile_image_url: req.profile_image_url,
        created_at: Utc::now(),
    };
    redis_service.save_user(&user).await?;

    tracing::info!("Registered user {} ({:?})", user.email, user.role);

    let token = issue_token(&config.auth.jwt_secret, config.auth.token_ttl_days, &user.id)?;
    Ok((StatusCode::CREATED, Json(auth_response(&user, token))).into_response())
}

pub async fn login(
    State((redis_service, config)): State<(RedisService, Config)>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> AppResult<Response> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Email and password required".to_string()));
    }

    // Single generic message for unknown email and wrong password alike
    let user = redis_service
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid credentials".to_string()))?;

    if !verify(&req.password, &user.password_hash)? {
        tracing::warn!("Login failed for {}", email);
        return Err(AppError::Auth("Invalid credentials".to_string()));
    }

    let token = issue_token(&config.auth.jwt_secret, config.auth.token_ttl_days, &user.id)?;
    Ok(Json(auth_response(&user, token)).into_response())
}

pub async fn get_profile(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserView> {
    Json(UserView::from(&user))
}

pub async fn update_profile(
    State((redis_service, _config)): State<(RedisService, Config)>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> AppResult<Json<UserView>> {
    let mut user = redis_service
        .get_user(&user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let old_email = user.email.clone();

    if let Some(name) = req.name {
        if !name.trim().is_empty() {
            user.name = name.trim().to_string();
        }
    }
    if let Some(email) = req.email {
        let email = normalize_email(&email);
        if !email.is_empty() && email != old_email {
            if redis_service.get_user_by_email(&email).await?.is_some() {
                return Err(AppError::Validation("User already exists".to_string()));
            }
            user.email = email;
        }
    }
    if let Some(image) = req.profile_image_url {
        user.profile_image_url = image;
    }
    if let Some(password) = req.password {
        if !password.is_empty() {
            user.password_hash = hash(password.as_bytes(), DEFAULT_COST)?;
        }
    }

    redis_service.save_user(&user).await?;
    if user.email != old_email {
        redis_service.remove_email_index(&old_email).await?;
    }

    Ok(Json(UserView::from(&user)))
}

// Multipart image upload. The file lands under the upload dir with a uuid
// name and is served back through the /uploads static route.
pub async fn upload_image(
    State((_redis_service, config)): State<(RedisService, Config)>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(format!("Failed to process form field: {}", e)))?
    {
        if field.name() != Some("image") {
            tracing::warn!("Unexpected form field: {:?}", field.name());
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_string()))
            .unwrap_or_else(|| "png".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Upload(format!("Failed to read image: {}", e)))?;

        let public_id = Uuid::new_v4().to_string();
        let filename = format!("{}.{}", public_id, extension);
        tokio::fs::create_dir_all(&config.upload.dir).await?;
        tokio::fs::write(format!("{}/{}", config.upload.dir, filename), &data).await?;

        tracing::info!("Stored uploaded image {} ({} bytes)", filename, data.len());

        return Ok(Json(json!({
            "imageUrl": format!("{}/uploads/{}", config.upload.public_base_url, filename),
            "publicId": public_id,
        }))
        .into_response());
    }

    Err(AppError::Upload("No image provided".to_string()))
}
