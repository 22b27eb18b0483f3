use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{ClientQuery, CreateClientRequest, UpdateClientRequest},
    services::client_service,
    utils::AppError,
};

#[get("")]
pub async fn list_clients(
    db: web::Data<MongoDB>,
    query: web::Query<ClientQuery>,
) -> Result<HttpResponse, AppError> {
    let clients = client_service::list_clients(&db, &query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": clients.len(),
        "clients": clients
    })))
}

#[post("")]
pub async fn create_client(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateClientRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /clients - {} by {}", request.name, user.username);
    let client = client_service::create_client(&db, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "client": client
    })))
}

/// Includes `jobCount`
#[get("/{id}")]
pub async fn get_client(path: web::Path<String>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let client = client_service::get_client(&db, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "client": client
    })))
}

#[put("/{id}")]
pub async fn update_client(
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateClientRequest>,
) -> Result<HttpResponse, AppError> {
    let client = client_service::update_client(&db, &path, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "client": client
    })))
}

#[delete("/{id}")]
pub async fn delete_client(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    client_service::delete_client(&db, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Client deleted"
    })))
}
