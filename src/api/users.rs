use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use serde::Deserialize;

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{CreateUserRequest, UpdateUserRequest, UserInfo, UserQuery},
    services::{auth_service, user_service},
    utils::AppError,
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// GET /api/v1/users - admin listing with optional role/active/search filters
#[get("")]
pub async fn list_users(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let users = user_service::list_users(&db, &query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": users.len(),
        "users": users
    })))
}

/// GET /api/v1/users/recruiters - active recruiters, open to any signed-in user
#[utoipa::path(
    get,
    path = "/api/v1/users/recruiters",
    tag = "Users",
    responses((status = 200, description = "Active recruiters", body = [UserInfo])),
    security(("bearer_auth" = []))
)]
#[get("/recruiters")]
pub async fn list_recruiters(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let recruiters = user_service::list_recruiters(&db).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "recruiters": recruiters
    })))
}

#[post("")]
pub async fn create_user(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let created = auth_service::register(&db, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "user": created
    })))
}

#[get("/{id}")]
pub async fn get_user(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let found = user_service::get_user(&db, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserInfo::from(found)
    })))
}

#[put("/{id}")]
pub async fn update_user(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let updated = user_service::update_user(&db, &path, &user.sub, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": updated
    })))
}

/// PATCH /api/v1/users/{id}/active - activate or deactivate an account
#[patch("/{id}/active")]
pub async fn set_active(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<SetActiveRequest>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let updated = user_service::set_active(&db, &path, &user.sub, request.is_active).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": updated
    })))
}

#[delete("/{id}")]
pub async fn delete_user(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    user_service::delete_user(&db, &path, &user.sub).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User deleted"
    })))
}
