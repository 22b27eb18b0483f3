pub mod auth_service;
pub mod candidate_service;
pub mod client_service;
pub mod dashboard_service;
pub mod interview_service;
pub mod job_service;
pub mod message_service;
pub mod sequence;
pub mod user_service;
