use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{CreateInterviewRequest, InterviewQuery, InterviewResponse, UpdateInterviewRequest},
    services::interview_service,
    utils::AppError,
};

#[get("")]
pub async fn list_interviews(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    query: web::Query<InterviewQuery>,
) -> Result<HttpResponse, AppError> {
    let page = interview_service::list_interviews(&db, &user, &query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "interviews": page.interviews,
        "total": page.total,
        "page": page.pagination.page,
        "limit": page.pagination.limit
    })))
}

/// POST /api/v1/interviews - schedules and advances the candidate's status
#[utoipa::path(
    post,
    path = "/api/v1/interviews",
    tag = "Interviews",
    request_body = CreateInterviewRequest,
    responses(
        (status = 201, description = "Interview scheduled", body = InterviewResponse),
        (status = 404, description = "Candidate, job or recruiter not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("")]
pub async fn create_interview(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateInterviewRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "📅 POST /interviews - {} round {} on {}",
        request.candidate,
        request.round.as_str(),
        request.scheduled_date
    );
    let interview = interview_service::create_interview(&db, &user, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "interview": interview
    })))
}

#[get("/{id}")]
pub async fn get_interview(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    let interview = interview_service::get_interview(&db, &user, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "interview": interview
    })))
}

#[put("/{id}")]
pub async fn update_interview(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateInterviewRequest>,
) -> Result<HttpResponse, AppError> {
    let interview = interview_service::update_interview(&db, &user, &path, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "interview": interview
    })))
}

#[delete("/{id}")]
pub async fn delete_interview(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    interview_service::delete_interview(&db, &user, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Interview deleted"
    })))
}
