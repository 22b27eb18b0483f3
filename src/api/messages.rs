use actix_web::{delete, get, patch, post, web, HttpResponse};

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{MessageResponse, SendMessageRequest},
    services::message_service,
    utils::AppError,
};

#[get("/inbox")]
pub async fn inbox(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let messages = message_service::inbox(&db, &user).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": messages.len(),
        "messages": messages
    })))
}

#[get("/sent")]
pub async fn sent(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let messages = message_service::sent(&db, &user).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": messages.len(),
        "messages": messages
    })))
}

#[get("/unread-count")]
pub async fn unread_count(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let count = message_service::unread_count(&db, &user).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": count
    })))
}

/// POST /api/v1/messages - `to` is `admin`, `all`, a username or a user ID
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "Messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = MessageResponse),
        (status = 403, description = "Only admins can message everyone"),
        (status = 404, description = "Recipient not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("")]
pub async fn send_message(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let message = message_service::send_message(&db, &user, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": message
    })))
}

#[patch("/{id}/read")]
pub async fn mark_read(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    message_service::mark_read(&db, &user, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[delete("/{id}")]
pub async fn delete_message(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    message_service::delete_message(&db, &user, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
