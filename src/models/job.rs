use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::format_datetime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum JobStatus {
    #[serde(rename = "Open")]
    Open,
    #[serde(rename = "On Hold")]
    OnHold,
    #[serde(rename = "Closed")]
    Closed,
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Open
    }
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "Open",
            JobStatus::OnHold => "On Hold",
            JobStatus::Closed => "Closed",
        }
    }
}

/// A job requirement raised by a client. Recruiter names are stored as
/// plain usernames, not references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub job_code: String,
    pub client_name: String,
    pub position: String,
    #[serde(default)]
    pub skills: String,
    pub budget: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    #[serde(default = "default_openings")]
    pub openings: u32,
    /// Turn-around time deadline (`YYYY-MM-DD`)
    pub tat: Option<String>,
    pub primary_recruiter: Option<String>,
    pub secondary_recruiter: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    pub description: Option<String>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

pub fn default_openings() -> u32 {
    1
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub job_code: String,
    pub client_name: String,
    pub position: String,
    #[serde(default)]
    pub skills: String,
    pub budget: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub openings: Option<u32>,
    pub tat: Option<String>,
    pub primary_recruiter: Option<String>,
    pub secondary_recruiter: Option<String>,
    pub status: Option<JobStatus>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub job_code: Option<String>,
    pub client_name: Option<String>,
    pub position: Option<String>,
    pub skills: Option<String>,
    pub budget: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub openings: Option<u32>,
    pub tat: Option<String>,
    pub primary_recruiter: Option<String>,
    pub secondary_recruiter: Option<String>,
    pub status: Option<JobStatus>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JobQuery {
    pub status: Option<JobStatus>,
    pub client: Option<String>,
    pub recruiter: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: String,
    pub job_code: String,
    pub client_name: String,
    pub position: String,
    pub skills: String,
    pub budget: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub openings: u32,
    pub tat: Option<String>,
    pub primary_recruiter: Option<String>,
    pub secondary_recruiter: Option<String>,
    pub status: JobStatus,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Job> for JobResponse {
    fn from(j: Job) -> Self {
        JobResponse {
            id: j.id.map(|id| id.to_hex()).unwrap_or_default(),
            job_code: j.job_code,
            client_name: j.client_name,
            position: j.position,
            skills: j.skills,
            budget: j.budget,
            location: j.location,
            experience: j.experience,
            openings: j.openings,
            tat: j.tat,
            primary_recruiter: j.primary_recruiter,
            secondary_recruiter: j.secondary_recruiter,
            status: j.status,
            description: j.description,
            created_at: format_datetime(&j.created_at),
            updated_at: format_datetime(&j.updated_at),
        }
    }
}

/// Job codes are stored trimmed and upper-cased
pub fn normalize_job_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_job_code() {
        assert_eq!(normalize_job_code("  acme-java-01 "), "ACME-JAVA-01");
    }

    #[test]
    fn test_job_status_wire_names() {
        assert_eq!(serde_json::to_value(JobStatus::OnHold).unwrap(), "On Hold");
        assert_eq!(JobStatus::default(), JobStatus::Open);
    }
}
