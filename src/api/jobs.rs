use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{CreateJobRequest, JobQuery, JobResponse, UpdateJobRequest},
    services::job_service,
    utils::AppError,
};

#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    tag = "Jobs",
    responses((status = 200, description = "Job page", body = [JobResponse])),
    security(("bearer_auth" = []))
)]
#[get("")]
pub async fn list_jobs(
    db: web::Data<MongoDB>,
    query: web::Query<JobQuery>,
) -> Result<HttpResponse, AppError> {
    let page = job_service::list_jobs(&db, &query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "jobs": page.jobs,
        "total": page.total,
        "page": page.pagination.page,
        "limit": page.pagination.limit
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/jobs",
    tag = "Jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job created", body = JobResponse),
        (status = 409, description = "Job code already exists")
    ),
    security(("bearer_auth" = []))
)]
#[post("")]
pub async fn create_job(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateJobRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /jobs - {} by {}", request.job_code, user.username);
    let job = job_service::create_job(&db, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "job": job
    })))
}

#[get("/{id}")]
pub async fn get_job(path: web::Path<String>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let job = job_service::get_job(&db, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "job": job
    })))
}

#[put("/{id}")]
pub async fn update_job(
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateJobRequest>,
) -> Result<HttpResponse, AppError> {
    let job = job_service::update_job(&db, &path, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "job": job
    })))
}

#[delete("/{id}")]
pub async fn delete_job(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let linked = job_service::delete_job(&db, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Job deleted",
        "linkedCandidates": linked
    })))
}
