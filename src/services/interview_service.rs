use crate::{
    database::{MongoDB, CANDIDATES, INTERVIEWS, JOBS},
    middleware::auth::Claims,
    models::{
        Candidate, CreateInterviewRequest, Interview, InterviewQuery, InterviewResponse,
        InterviewRound, InterviewStatus, Job, UpdateInterviewRequest,
    },
    services::{
        candidate_service,
        sequence::{next_sequence_id, SequenceKind},
        user_service,
    },
    utils::{clean_text, parse_object_id, AppError, Pagination},
};
use chrono::{NaiveDate, NaiveTime};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use std::collections::HashMap;

pub struct InterviewPage {
    pub interviews: Vec<InterviewResponse>,
    pub total: u64,
    pub pagination: Pagination,
}

pub fn validate_date(value: &str) -> Result<String, AppError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| AppError::InvalidRequest(format!("Invalid date (expected YYYY-MM-DD): {}", value)))
}

pub fn validate_time(value: &str) -> Result<String, AppError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| AppError::InvalidRequest(format!("Invalid time (expected HH:MM): {}", value)))
}

pub fn validate_rating(rating: Option<u8>) -> Result<Option<u8>, AppError> {
    match rating {
        Some(r) if !(1..=5).contains(&r) => Err(AppError::InvalidRequest(format!(
            "Rating must be between 1 and 5, got {}",
            r
        ))),
        other => Ok(other),
    }
}

pub fn scope_filter(claims: &Claims) -> Result<Document, AppError> {
    if claims.is_admin() {
        Ok(Document::new())
    } else {
        Ok(doc! { "recruiter": claims.user_oid()? })
    }
}

pub fn list_filter(claims: &Claims, query: &InterviewQuery) -> Result<Document, AppError> {
    let mut filter = scope_filter(claims)?;

    if let Some(status) = query.status {
        filter.insert("status", status.as_str());
    }
    if let Some(round) = query.round {
        filter.insert("round", round.as_str());
    }
    if let Some(candidate) = query.candidate.as_deref().filter(|c| !c.is_empty()) {
        filter.insert("candidate", parse_object_id(candidate, "candidate")?);
    }
    if let Some(job) = query.job.as_deref().filter(|j| !j.is_empty()) {
        filter.insert("job", parse_object_id(job, "job")?);
    }
    if let Some(date) = query.date.as_deref().filter(|d| !d.is_empty()) {
        filter.insert("scheduled_date", validate_date(date)?);
    }

    Ok(filter)
}

pub fn build_interview(
    request: &CreateInterviewRequest,
    interview_id: String,
    candidate: ObjectId,
    job: ObjectId,
    recruiter: ObjectId,
) -> Result<Interview, AppError> {
    let now = BsonDateTime::now();

    Ok(Interview {
        id: None,
        interview_id,
        candidate,
        job,
        recruiter,
        scheduled_date: validate_date(&request.scheduled_date)?,
        scheduled_time: validate_time(&request.scheduled_time)?,
        mode: request.mode.unwrap_or_default(),
        location_or_link: clean_text(request.location_or_link.as_ref()),
        round: request.round,
        status: request.status.unwrap_or_default(),
        feedback: clean_text(request.feedback.as_ref()),
        rating: validate_rating(request.rating)?,
        created_at: now,
        updated_at: now,
    })
}

pub fn build_update(request: &UpdateInterviewRequest) -> Result<Document, AppError> {
    let mut update = doc! { "updated_at": BsonDateTime::now() };

    if let Some(date) = &request.scheduled_date {
        update.insert("scheduled_date", validate_date(date)?);
    }
    if let Some(time) = &request.scheduled_time {
        update.insert("scheduled_time", validate_time(time)?);
    }
    if let Some(mode) = request.mode {
        update.insert("mode", mode.as_str());
    }
    if request.location_or_link.is_some() {
        update.insert("location_or_link", clean_text(request.location_or_link.as_ref()));
    }
    if let Some(round) = request.round {
        update.insert("round", round.as_str());
    }
    if let Some(status) = request.status {
        update.insert("status", status.as_str());
    }
    if request.feedback.is_some() {
        update.insert("feedback", clean_text(request.feedback.as_ref()));
    }
    if let Some(rating) = validate_rating(request.rating)? {
        update.insert("rating", rating as i32);
    }

    Ok(update)
}

/// Moves the candidate to the interview stage implied by the round
async fn advance_candidate(db: &MongoDB, candidate: ObjectId, round: InterviewRound) -> Result<(), AppError> {
    if let Some(status) = round.candidate_status() {
        candidate_service::set_status(db, candidate, status).await?;
        log::info!("➡️  Candidate {} moved to {}", candidate.to_hex(), status);
    }
    Ok(())
}

/// Fills candidate, job and recruiter display fields
pub async fn populate(db: &MongoDB, interviews: Vec<Interview>) -> Result<Vec<InterviewResponse>, AppError> {
    let mut candidate_ids: Vec<ObjectId> = interviews.iter().map(|i| i.candidate).collect();
    candidate_ids.sort();
    candidate_ids.dedup();
    let mut job_ids: Vec<ObjectId> = interviews.iter().map(|i| i.job).collect();
    job_ids.sort();
    job_ids.dedup();
    let mut recruiter_ids: Vec<ObjectId> = interviews.iter().map(|i| i.recruiter).collect();
    recruiter_ids.sort();
    recruiter_ids.dedup();

    let candidates: HashMap<ObjectId, Candidate> = if candidate_ids.is_empty() {
        HashMap::new()
    } else {
        let found: Vec<Candidate> = db
            .collection::<Candidate>(CANDIDATES)
            .find(doc! { "_id": { "$in": candidate_ids } })
            .await?
            .try_collect()
            .await?;
        found.into_iter().filter_map(|c| c.id.map(|id| (id, c))).collect()
    };

    let jobs: HashMap<ObjectId, Job> = if job_ids.is_empty() {
        HashMap::new()
    } else {
        let found: Vec<Job> = db
            .collection::<Job>(JOBS)
            .find(doc! { "_id": { "$in": job_ids } })
            .await?
            .try_collect()
            .await?;
        found.into_iter().filter_map(|j| j.id.map(|id| (id, j))).collect()
    };

    let usernames = user_service::usernames_by_id(db, &recruiter_ids).await?;

    Ok(interviews
        .into_iter()
        .map(|i| {
            let candidate = candidates.get(&i.candidate);
            let job = jobs.get(&i.job);
            let recruiter_name = usernames.get(&i.recruiter.to_hex()).cloned();

            let mut resp = InterviewResponse::from(i);
            resp.candidate_name = candidate.map(|c| c.name.clone());
            resp.candidate_code = candidate.map(|c| c.candidate_id.clone());
            resp.job_code = job.map(|j| j.job_code.clone());
            resp.position = job.map(|j| j.position.clone());
            resp.client_name = job.map(|j| j.client_name.clone());
            resp.recruiter_name = recruiter_name;
            resp
        })
        .collect())
}

pub async fn create_interview(
    db: &MongoDB,
    claims: &Claims,
    request: &CreateInterviewRequest,
) -> Result<InterviewResponse, AppError> {
    let candidate_oid = parse_object_id(&request.candidate, "candidate")?;
    let job_oid = parse_object_id(&request.job, "job")?;

    let recruiter = claims.assign_recruiter(request.recruiter.as_deref())?;

    // candidate must exist and be visible to the caller
    candidate_service::fetch_candidate(db, claims, &candidate_oid.to_hex()).await?;

    db.collection::<Job>(JOBS)
        .find_one(doc! { "_id": job_oid })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {}", request.job)))?;

    user_service::get_user(db, &recruiter.to_hex()).await?;

    // validate before allocating an ID
    build_interview(request, String::new(), candidate_oid, job_oid, recruiter)?;

    let interview_id = next_sequence_id(db, SequenceKind::Interview).await?;
    let mut interview = build_interview(request, interview_id, candidate_oid, job_oid, recruiter)?;

    let result = db.collection::<Interview>(INTERVIEWS).insert_one(&interview).await?;
    interview.id = result.inserted_id.as_object_id();

    if interview.status == InterviewStatus::Scheduled {
        advance_candidate(db, candidate_oid, interview.round).await?;
    }

    log::info!(
        "✅ Interview {} ({}) scheduled by {}",
        interview.interview_id,
        interview.round.as_str(),
        claims.username
    );

    let mut populated = populate(db, vec![interview]).await?;
    populated
        .pop()
        .ok_or_else(|| AppError::Internal("Interview vanished after insert".to_string()))
}

pub async fn list_interviews(
    db: &MongoDB,
    claims: &Claims,
    query: &InterviewQuery,
) -> Result<InterviewPage, AppError> {
    let filter = list_filter(claims, query)?;
    let pagination = Pagination::new(query.page, query.limit);
    let collection = db.collection::<Interview>(INTERVIEWS);

    let total = collection.count_documents(filter.clone()).await?;
    let interviews: Vec<Interview> = collection
        .find(filter)
        .sort(doc! { "scheduled_date": 1, "scheduled_time": 1 })
        .skip(pagination.skip())
        .limit(pagination.limit as i64)
        .await?
        .try_collect()
        .await?;

    Ok(InterviewPage {
        interviews: populate(db, interviews).await?,
        total,
        pagination,
    })
}

/// Accepts a Mongo ObjectId or an `INT-xxxx` code
pub fn lookup_filter(id: &str) -> Result<Document, AppError> {
    let id = id.trim();
    if let Ok(oid) = ObjectId::parse_str(id) {
        return Ok(doc! { "_id": oid });
    }
    if id.to_uppercase().starts_with("INT-") {
        return Ok(doc! { "interview_id": id.to_uppercase() });
    }
    Err(AppError::InvalidRequest(format!("Invalid interview ID: {}", id)))
}

async fn fetch_interview(db: &MongoDB, claims: &Claims, id: &str) -> Result<Interview, AppError> {
    let interview = db
        .collection::<Interview>(INTERVIEWS)
        .find_one(lookup_filter(id)?)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {}", id)))?;

    if !claims.is_admin() && interview.recruiter.to_hex() != claims.sub {
        return Err(AppError::Forbidden("This interview belongs to another recruiter".to_string()));
    }

    Ok(interview)
}

pub async fn get_interview(db: &MongoDB, claims: &Claims, id: &str) -> Result<InterviewResponse, AppError> {
    let interview = fetch_interview(db, claims, id).await?;
    let mut populated = populate(db, vec![interview]).await?;
    populated
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Interview {}", id)))
}

pub async fn update_interview(
    db: &MongoDB,
    claims: &Claims,
    id: &str,
    request: &UpdateInterviewRequest,
) -> Result<InterviewResponse, AppError> {
    let existing = fetch_interview(db, claims, id).await?;
    let oid = existing
        .id
        .ok_or_else(|| AppError::Internal("Interview without _id".to_string()))?;

    let update = build_update(request)?;

    db.collection::<Interview>(INTERVIEWS)
        .update_one(doc! { "_id": oid }, doc! { "$set": update })
        .await?;

    let status = request.status.unwrap_or(existing.status);
    if let Some(round) = request.round.filter(|r| *r != existing.round) {
        if status == InterviewStatus::Scheduled {
            advance_candidate(db, existing.candidate, round).await?;
        }
    }

    get_interview(db, claims, &oid.to_hex()).await
}

pub async fn delete_interview(db: &MongoDB, claims: &Claims, id: &str) -> Result<(), AppError> {
    let existing = fetch_interview(db, claims, id).await?;
    let oid = existing
        .id
        .ok_or_else(|| AppError::Internal("Interview without _id".to_string()))?;

    db.collection::<Interview>(INTERVIEWS)
        .delete_one(doc! { "_id": oid })
        .await?;

    log::info!("🗑️ Interview {} deleted by {}", existing.interview_id, claims.username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InterviewMode, UserRole};
    use crate::services::candidate_service::claims_for;

    fn create_request() -> CreateInterviewRequest {
        CreateInterviewRequest {
            candidate: ObjectId::new().to_hex(),
            job: ObjectId::new().to_hex(),
            recruiter: None,
            scheduled_date: "2026-10-20".into(),
            scheduled_time: "14:30".into(),
            mode: None,
            location_or_link: Some("https://meet.example/abc".into()),
            round: InterviewRound::L1,
            status: None,
            feedback: None,
            rating: None,
        }
    }

    #[test]
    fn test_validate_date_and_time() {
        assert_eq!(validate_date(" 2026-10-20 ").unwrap(), "2026-10-20");
        assert!(validate_date("20/10/2026").is_err());
        assert!(validate_date("2026-02-30").is_err());
        assert_eq!(validate_time("09:05").unwrap(), "09:05");
        assert!(validate_time("25:00").is_err());
    }

    #[test]
    fn test_validate_rating_bounds() {
        assert_eq!(validate_rating(None).unwrap(), None);
        assert_eq!(validate_rating(Some(5)).unwrap(), Some(5));
        assert!(validate_rating(Some(0)).is_err());
        assert!(validate_rating(Some(6)).is_err());
    }

    #[test]
    fn test_build_interview_defaults() {
        let (c, j, r) = (ObjectId::new(), ObjectId::new(), ObjectId::new());
        let interview = build_interview(&create_request(), "INT-0001".into(), c, j, r).unwrap();
        assert_eq!(interview.status, InterviewStatus::Scheduled);
        assert_eq!(interview.mode, InterviewMode::Video);
        assert_eq!(interview.candidate, c);
        assert_eq!(interview.rating, None);
    }

    #[test]
    fn test_build_interview_rejects_bad_rating() {
        let mut request = create_request();
        request.rating = Some(9);
        let result = build_interview(&request, "INT-0001".into(), ObjectId::new(), ObjectId::new(), ObjectId::new());
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_list_filter_scopes_recruiter() {
        let recruiter = claims_for(UserRole::Recruiter);
        let query = InterviewQuery {
            status: Some(InterviewStatus::Scheduled),
            round: Some(InterviewRound::Final),
            candidate: None,
            job: None,
            date: Some("2026-10-20".into()),
            page: None,
            limit: None,
        };
        let filter = list_filter(&recruiter, &query).unwrap();
        assert_eq!(filter.get_object_id("recruiter").unwrap().to_hex(), recruiter.sub);
        assert_eq!(filter.get_str("round").unwrap(), "Final");
        assert_eq!(filter.get_str("scheduled_date").unwrap(), "2026-10-20");
    }

    #[test]
    fn test_lookup_filter() {
        assert_eq!(lookup_filter("int-0003").unwrap(), doc! { "interview_id": "INT-0003" });
        assert!(lookup_filter("abc").is_err());
    }

    #[test]
    fn test_build_update() {
        let update = build_update(&UpdateInterviewRequest {
            status: Some(InterviewStatus::Completed),
            feedback: Some("Strong on systems design".into()),
            rating: Some(4),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.get_str("status").unwrap(), "Completed");
        assert_eq!(update.get_i32("rating").unwrap(), 4);
        assert!(!update.contains_key("round"));
    }
}
