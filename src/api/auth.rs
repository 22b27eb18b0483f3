use actix_web::{web, HttpResponse};
use crate::{
    config::Config,
    database::MongoDB,
    middleware::auth::Claims,
    models::{CreateUserRequest, UserInfo},
    services::auth_service::{self, AuthResponse, ChangePasswordRequest, LoginRequest},
    utils::AppError,
};

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials or inactive account")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    config: web::Data<Config>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /auth/login - {}", request.identifier);

    match auth_service::login(&db, &config.jwt, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", response.user.username);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.identifier, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserInfo),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Username or email already registered")
    ),
    security(("bearer_auth" = []))
)]
pub async fn register(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    log::info!("📝 POST /auth/register - {} by {}", request.username, user.username);

    let created = auth_service::register(&db, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "user": created
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    let info = auth_service::get_current_user(&db, &user.sub).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": info
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Current password is incorrect")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔑 POST /auth/change-password - {}", user.username);

    auth_service::change_password(&db, &user.sub, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password updated"
    })))
}

/// The middleware has already validated the token; echo what it carried
#[utoipa::path(
    get,
    path = "/api/v1/auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid"),
        (status = 401, description = "Invalid or expired token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn verify_token(user: web::ReqData<Claims>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "valid": true,
        "userId": user.sub,
        "username": user.username,
        "role": user.role,
        "exp": user.exp
    }))
}
