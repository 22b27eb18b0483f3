use actix_web::{get, web, HttpResponse};

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    services::dashboard_service::{self, DashboardStats},
    utils::AppError,
};

/// Recruiters get numbers for their own candidates, jobs and interviews
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    tag = "Dashboard",
    responses((status = 200, description = "Dashboard counters", body = DashboardStats)),
    security(("bearer_auth" = []))
)]
#[get("/stats")]
pub async fn get_stats(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let stats = dashboard_service::get_stats(&db, &user).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "stats": stats
    })))
}
