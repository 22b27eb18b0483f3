use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Recruit Service API",
        version = "1.0.0",
        description = "REST backend for the recruitment agency dashboard.\n\n**Authentication:** everything except login, health and metrics requires a JWT Bearer token.\n\n**Roles:** admins see and manage everything; recruiters are scoped to their own candidates and interviews."
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::register,
        crate::api::auth::get_me,
        crate::api::auth::change_password,
        crate::api::auth::verify_token,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        crate::api::users::list_recruiters,
        crate::api::candidates::list_candidates,
        crate::api::candidates::create_candidate,
        crate::api::jobs::list_jobs,
        crate::api::jobs::create_job,
        crate::api::interviews::create_interview,
        crate::api::messages::send_message,
        crate::api::dashboard::get_stats,
    ),
    components(
        schemas(
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::ChangePasswordRequest,
            crate::services::auth_service::AuthResponse,
            crate::models::UserRole,
            crate::models::UserInfo,
            crate::models::CreateUserRequest,
            crate::models::UpdateUserRequest,
            crate::api::users::SetActiveRequest,

            crate::models::CandidateStatus,
            crate::models::CreateCandidateRequest,
            crate::models::UpdateCandidateRequest,
            crate::models::UpdateCandidateStatusRequest,
            crate::models::CandidateResponse,

            crate::models::JobStatus,
            crate::models::CreateJobRequest,
            crate::models::UpdateJobRequest,
            crate::models::JobResponse,

            crate::models::CreateClientRequest,
            crate::models::UpdateClientRequest,
            crate::models::ClientResponse,

            crate::models::InterviewRound,
            crate::models::InterviewStatus,
            crate::models::InterviewMode,
            crate::models::CreateInterviewRequest,
            crate::models::UpdateInterviewRequest,
            crate::models::InterviewResponse,

            crate::models::SendMessageRequest,
            crate::models::MessageResponse,

            crate::services::dashboard_service::StatusCount,
            crate::services::dashboard_service::DashboardStats,

            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Login, token verification and account management."),
        (name = "Health", description = "Health check and Prometheus metrics."),
        (name = "Users", description = "User administration and recruiter lookup."),
        (name = "Candidates", description = "Candidate pipeline. IDs look like CAND-0001."),
        (name = "Jobs", description = "Job requirements raised by clients."),
        (name = "Interviews", description = "Interview scheduling. IDs look like INT-0001."),
        (name = "Messages", description = "Internal messages between admins and recruiters."),
        (name = "Dashboard", description = "Summary counters."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from POST /api/v1/auth/login"))
                        .build()
                ),
            );
        }
    }
}
