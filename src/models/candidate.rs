use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::format_datetime;

/// Pipeline stage of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum CandidateStatus {
    #[serde(rename = "New")]
    New,
    #[serde(rename = "Screening")]
    Screening,
    #[serde(rename = "Shortlisted")]
    Shortlisted,
    #[serde(rename = "L1 Interview")]
    L1Interview,
    #[serde(rename = "L2 Interview")]
    L2Interview,
    #[serde(rename = "Final Interview")]
    FinalInterview,
    #[serde(rename = "Selected")]
    Selected,
    #[serde(rename = "Offered")]
    Offered,
    #[serde(rename = "Joined")]
    Joined,
    #[serde(rename = "Rejected")]
    Rejected,
    #[serde(rename = "On Hold")]
    OnHold,
}

impl Default for CandidateStatus {
    fn default() -> Self {
        CandidateStatus::New
    }
}

impl CandidateStatus {
    pub const ALL: [CandidateStatus; 11] = [
        CandidateStatus::New,
        CandidateStatus::Screening,
        CandidateStatus::Shortlisted,
        CandidateStatus::L1Interview,
        CandidateStatus::L2Interview,
        CandidateStatus::FinalInterview,
        CandidateStatus::Selected,
        CandidateStatus::Offered,
        CandidateStatus::Joined,
        CandidateStatus::Rejected,
        CandidateStatus::OnHold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::New => "New",
            CandidateStatus::Screening => "Screening",
            CandidateStatus::Shortlisted => "Shortlisted",
            CandidateStatus::L1Interview => "L1 Interview",
            CandidateStatus::L2Interview => "L2 Interview",
            CandidateStatus::FinalInterview => "Final Interview",
            CandidateStatus::Selected => "Selected",
            CandidateStatus::Offered => "Offered",
            CandidateStatus::Joined => "Joined",
            CandidateStatus::Rejected => "Rejected",
            CandidateStatus::OnHold => "On Hold",
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Human readable sequential ID, e.g. `CAND-0001`
    pub candidate_id: String,
    pub name: String,
    pub contact: String,
    pub email: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub status: CandidateStatus,
    pub recruiter: ObjectId,
    pub job: Option<ObjectId>,
    pub experience: Option<String>,
    pub current_ctc: Option<String>,
    pub expected_ctc: Option<String>,
    pub notice_period: Option<String>,
    pub location: Option<String>,
    pub remarks: Option<String>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCandidateRequest {
    pub name: String,
    pub contact: String,
    pub email: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub status: Option<CandidateStatus>,
    /// Recruiter user ID; admins only, recruiters always own what they create
    pub recruiter: Option<String>,
    pub job: Option<String>,
    pub experience: Option<String>,
    pub current_ctc: Option<String>,
    pub expected_ctc: Option<String>,
    pub notice_period: Option<String>,
    pub location: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidateRequest {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub skills: Option<Vec<String>>,
    pub status: Option<CandidateStatus>,
    pub recruiter: Option<String>,
    /// Empty string clears the job link
    pub job: Option<String>,
    pub experience: Option<String>,
    pub current_ctc: Option<String>,
    pub expected_ctc: Option<String>,
    pub notice_period: Option<String>,
    pub location: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateCandidateStatusRequest {
    pub status: CandidateStatus,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CandidateQuery {
    pub status: Option<CandidateStatus>,
    pub recruiter: Option<String>,
    pub job: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResponse {
    pub id: String,
    pub candidate_id: String,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub skills: Vec<String>,
    pub status: CandidateStatus,
    pub recruiter: String,
    pub recruiter_name: Option<String>,
    pub job: Option<String>,
    pub job_code: Option<String>,
    pub position: Option<String>,
    pub experience: Option<String>,
    pub current_ctc: Option<String>,
    pub expected_ctc: Option<String>,
    pub notice_period: Option<String>,
    pub location: Option<String>,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Candidate> for CandidateResponse {
    fn from(c: Candidate) -> Self {
        CandidateResponse {
            id: c.id.map(|id| id.to_hex()).unwrap_or_default(),
            candidate_id: c.candidate_id,
            name: c.name,
            contact: c.contact,
            email: c.email,
            skills: c.skills,
            status: c.status,
            recruiter: c.recruiter.to_hex(),
            recruiter_name: None,
            job: c.job.map(|id| id.to_hex()),
            job_code: None,
            position: None,
            experience: c.experience,
            current_ctc: c.current_ctc,
            expected_ctc: c.expected_ctc,
            notice_period: c.notice_period,
            location: c.location,
            remarks: c.remarks,
            created_at: format_datetime(&c.created_at),
            updated_at: format_datetime(&c.updated_at),
        }
    }
}

/// Trims skills and drops blanks and case-insensitive duplicates
pub fn normalize_skills(skills: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for skill in skills.iter().flat_map(|s| s.split(',')) {
        let skill = skill.trim();
        if skill.is_empty() {
            continue;
        }
        let key = skill.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(skill.to_string());
        }
    }
    out
}
