use actix_web::{delete, get, patch, post, put, web, HttpResponse};

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{CandidateQuery, CandidateResponse, CreateCandidateRequest, UpdateCandidateRequest, UpdateCandidateStatusRequest},
    services::candidate_service,
    utils::AppError,
};

/// GET /api/v1/candidates - paginated, recruiters only see their own
#[utoipa::path(
    get,
    path = "/api/v1/candidates",
    tag = "Candidates",
    responses((status = 200, description = "Candidate page", body = [CandidateResponse])),
    security(("bearer_auth" = []))
)]
#[get("")]
pub async fn list_candidates(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    query: web::Query<CandidateQuery>,
) -> Result<HttpResponse, AppError> {
    let page = candidate_service::list_candidates(&db, &user, &query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "candidates": page.candidates,
        "total": page.total,
        "page": page.pagination.page,
        "limit": page.pagination.limit
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/candidates",
    tag = "Candidates",
    request_body = CreateCandidateRequest,
    responses(
        (status = 201, description = "Candidate created", body = CandidateResponse),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = []))
)]
#[post("")]
pub async fn create_candidate(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateCandidateRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /candidates - {} by {}", request.name, user.username);
    let candidate = candidate_service::create_candidate(&db, &user, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "candidate": candidate
    })))
}

/// GET /api/v1/candidates/{id} - accepts an ObjectId or a CAND-xxxx code
#[get("/{id}")]
pub async fn get_candidate(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    let candidate = candidate_service::get_candidate(&db, &user, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "candidate": candidate
    })))
}

#[put("/{id}")]
pub async fn update_candidate(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateCandidateRequest>,
) -> Result<HttpResponse, AppError> {
    let candidate = candidate_service::update_candidate(&db, &user, &path, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "candidate": candidate
    })))
}

#[patch("/{id}/status")]
pub async fn update_status(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateCandidateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔄 PATCH /candidates/{}/status -> {}", path, request.status);
    let candidate = candidate_service::update_status(&db, &user, &path, request.status).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "candidate": candidate
    })))
}

#[delete("/{id}")]
pub async fn delete_candidate(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    candidate_service::delete_candidate(&db, &user, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Candidate deleted"
    })))
}
