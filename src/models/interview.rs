use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use super::candidate::CandidateStatus;
use crate::utils::format_datetime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum InterviewRound {
    L1,
    L2,
    Final,
    #[serde(rename = "HR")]
    Hr,
}

impl InterviewRound {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewRound::L1 => "L1",
            InterviewRound::L2 => "L2",
            InterviewRound::Final => "Final",
            InterviewRound::Hr => "HR",
        }
    }

    /// Candidate status implied by scheduling this round
    pub fn candidate_status(&self) -> Option<CandidateStatus> {
        match self {
            InterviewRound::L1 => Some(CandidateStatus::L1Interview),
            InterviewRound::L2 => Some(CandidateStatus::L2Interview),
            InterviewRound::Final => Some(CandidateStatus::FinalInterview),
            InterviewRound::Hr => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum InterviewStatus {
    #[serde(rename = "Scheduled")]
    Scheduled,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Cancelled")]
    Cancelled,
    #[serde(rename = "Rescheduled")]
    Rescheduled,
    #[serde(rename = "No Show")]
    NoShow,
}

impl Default for InterviewStatus {
    fn default() -> Self {
        InterviewStatus::Scheduled
    }
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "Scheduled",
            InterviewStatus::Completed => "Completed",
            InterviewStatus::Cancelled => "Cancelled",
            InterviewStatus::Rescheduled => "Rescheduled",
            InterviewStatus::NoShow => "No Show",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum InterviewMode {
    #[serde(rename = "In Person")]
    InPerson,
    #[serde(rename = "Video")]
    Video,
    #[serde(rename = "Phone")]
    Phone,
}

impl Default for InterviewMode {
    fn default() -> Self {
        InterviewMode::Video
    }
}

impl InterviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewMode::InPerson => "In Person",
            InterviewMode::Video => "Video",
            InterviewMode::Phone => "Phone",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Human readable sequential ID, e.g. `INT-0001`
    pub interview_id: String,
    pub candidate: ObjectId,
    pub job: ObjectId,
    pub recruiter: ObjectId,
    /// `YYYY-MM-DD`
    pub scheduled_date: String,
    /// `HH:MM`
    pub scheduled_time: String,
    #[serde(default)]
    pub mode: InterviewMode,
    pub location_or_link: Option<String>,
    pub round: InterviewRound,
    #[serde(default)]
    pub status: InterviewStatus,
    pub feedback: Option<String>,
    pub rating: Option<u8>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewRequest {
    pub candidate: String,
    pub job: String,
    /// Defaults to the caller
    pub recruiter: Option<String>,
    pub scheduled_date: String,
    pub scheduled_time: String,
    pub mode: Option<InterviewMode>,
    pub location_or_link: Option<String>,
    pub round: InterviewRound,
    pub status: Option<InterviewStatus>,
    pub feedback: Option<String>,
    pub rating: Option<u8>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInterviewRequest {
    pub scheduled_date: Option<String>,
    pub scheduled_time: Option<String>,
    pub mode: Option<InterviewMode>,
    pub location_or_link: Option<String>,
    pub round: Option<InterviewRound>,
    pub status: Option<InterviewStatus>,
    pub feedback: Option<String>,
    pub rating: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct InterviewQuery {
    pub status: Option<InterviewStatus>,
    pub round: Option<InterviewRound>,
    pub candidate: Option<String>,
    pub job: Option<String>,
    pub date: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterviewResponse {
    pub id: String,
    pub interview_id: String,
    pub candidate: String,
    pub candidate_name: Option<String>,
    pub candidate_code: Option<String>,
    pub job: String,
    pub job_code: Option<String>,
    pub position: Option<String>,
    pub client_name: Option<String>,
    pub recruiter: String,
    pub recruiter_name: Option<String>,
    pub scheduled_date: String,
    pub scheduled_time: String,
    pub mode: InterviewMode,
    pub location_or_link: Option<String>,
    pub round: InterviewRound,
    pub status: InterviewStatus,
    pub feedback: Option<String>,
    pub rating: Option<u8>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Interview> for InterviewResponse {
    fn from(i: Interview) -> Self {
        InterviewResponse {
            id: i.id.map(|id| id.to_hex()).unwrap_or_default(),
            interview_id: i.interview_id,
            candidate: i.candidate.to_hex(),
            candidate_name: None,
            candidate_code: None,
            job: i.job.to_hex(),
            job_code: None,
            position: None,
            client_name: None,
            recruiter: i.recruiter.to_hex(),
            recruiter_name: None,
            scheduled_date: i.scheduled_date,
            scheduled_time: i.scheduled_time,
            mode: i.mode,
            location_or_link: i.location_or_link,
            round: i.round,
            status: i.status,
            feedback: i.feedback,
            rating: i.rating,
            created_at: format_datetime(&i.created_at),
            updated_at: format_datetime(&i.updated_at),
        }
    }
}
