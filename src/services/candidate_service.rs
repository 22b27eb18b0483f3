use crate::{
    database::{MongoDB, CANDIDATES, JOBS},
    middleware::auth::Claims,
    models::{
        normalize_skills, Candidate, CandidateQuery, CandidateResponse, CandidateStatus,
        CreateCandidateRequest, Job, UpdateCandidateRequest, User,
    },
    services::{
        sequence::{next_sequence_id, SequenceKind},
        user_service,
    },
    utils::{
        and_all, clean_text, parse_object_id, require_text, search_filter, validate_email,
        AppError, Pagination,
    },
};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime, Document};
use std::collections::HashMap;

const SEARCH_FIELDS: [&str; 5] = ["name", "email", "contact", "candidate_id", "skills"];

pub struct CandidatePage {
    pub candidates: Vec<CandidateResponse>,
    pub total: u64,
    pub pagination: Pagination,
}

/// Recruiters only ever see their own candidates
pub fn scope_filter(claims: &Claims) -> Result<Document, AppError> {
    if claims.is_admin() {
        Ok(Document::new())
    } else {
        Ok(doc! { "recruiter": claims.user_oid()? })
    }
}

pub fn can_access(claims: &Claims, candidate: &Candidate) -> bool {
    claims.is_admin() || candidate.recruiter.to_hex() == claims.sub
}

/// Accepts either a Mongo ObjectId or a `CAND-xxxx` code
pub fn lookup_filter(id: &str) -> Result<Document, AppError> {
    let id = id.trim();
    if let Ok(oid) = ObjectId::parse_str(id) {
        return Ok(doc! { "_id": oid });
    }
    if id.to_uppercase().starts_with("CAND-") {
        return Ok(doc! { "candidate_id": id.to_uppercase() });
    }
    Err(AppError::InvalidRequest(format!("Invalid candidate ID: {}", id)))
}

pub fn list_filter(claims: &Claims, query: &CandidateQuery) -> Result<Document, AppError> {
    let mut base = scope_filter(claims)?;

    if let Some(status) = query.status {
        base.insert("status", status.as_str());
    }
    if claims.is_admin() {
        if let Some(recruiter) = query.recruiter.as_deref().filter(|r| !r.is_empty()) {
            base.insert("recruiter", parse_object_id(recruiter, "recruiter")?);
        }
    }
    if let Some(job) = query.job.as_deref().filter(|j| !j.is_empty()) {
        base.insert("job", parse_object_id(job, "job")?);
    }

    let mut clauses = vec![base];
    if let Some(search) = search_filter(query.search.as_deref(), &SEARCH_FIELDS) {
        clauses.push(search);
    }
    Ok(and_all(clauses))
}

/// Validates the request and builds the document to insert
pub fn build_candidate(
    request: &CreateCandidateRequest,
    candidate_id: String,
    recruiter: ObjectId,
    job: Option<ObjectId>,
) -> Result<Candidate, AppError> {
    let now = BsonDateTime::now();

    Ok(Candidate {
        id: None,
        candidate_id,
        name: require_text(&request.name, "Name")?,
        contact: require_text(&request.contact, "Contact")?,
        email: validate_email(&request.email)?,
        skills: normalize_skills(&request.skills),
        status: request.status.unwrap_or_default(),
        recruiter,
        job,
        experience: clean_text(request.experience.as_ref()),
        current_ctc: clean_text(request.current_ctc.as_ref()),
        expected_ctc: clean_text(request.expected_ctc.as_ref()),
        notice_period: clean_text(request.notice_period.as_ref()),
        location: clean_text(request.location.as_ref()),
        remarks: clean_text(request.remarks.as_ref()),
        created_at: now,
        updated_at: now,
    })
}

/// Builds the `$set` document for a partial update. Reassignment is admin-only.
pub fn build_update(claims: &Claims, request: &UpdateCandidateRequest) -> Result<Document, AppError> {
    let mut update = doc! { "updated_at": BsonDateTime::now() };

    if let Some(name) = &request.name {
        update.insert("name", require_text(name, "Name")?);
    }
    if let Some(contact) = &request.contact {
        update.insert("contact", require_text(contact, "Contact")?);
    }
    if let Some(email) = &request.email {
        update.insert("email", validate_email(email)?);
    }
    if let Some(skills) = &request.skills {
        update.insert("skills", normalize_skills(skills));
    }
    if let Some(status) = request.status {
        update.insert("status", status.as_str());
    }
    if let Some(recruiter) = &request.recruiter {
        if !claims.is_admin() {
            return Err(AppError::Forbidden("Only admins can reassign candidates".to_string()));
        }
        update.insert("recruiter", parse_object_id(recruiter, "recruiter")?);
    }
    if let Some(job) = &request.job {
        let value = if job.trim().is_empty() {
            Bson::Null
        } else {
            Bson::ObjectId(parse_object_id(job, "job")?)
        };
        update.insert("job", value);
    }

    let free_text = [
        ("experience", &request.experience),
        ("current_ctc", &request.current_ctc),
        ("expected_ctc", &request.expected_ctc),
        ("notice_period", &request.notice_period),
        ("location", &request.location),
        ("remarks", &request.remarks),
    ];
    for (key, value) in free_text {
        if value.is_some() {
            update.insert(key, clean_text(value.as_ref()));
        }
    }

    Ok(update)
}

async fn ensure_job_exists(db: &MongoDB, job: ObjectId) -> Result<(), AppError> {
    db.collection::<Job>(JOBS)
        .find_one(doc! { "_id": job })
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Job {}", job.to_hex())))
}

async fn ensure_active_user(db: &MongoDB, user: ObjectId) -> Result<User, AppError> {
    let found = user_service::get_user(db, &user.to_hex()).await?;
    if !found.is_active {
        return Err(AppError::InvalidRequest(format!("User {} is inactive", found.username)));
    }
    Ok(found)
}

/// Fills recruiter names and job code/position from their collections
pub async fn populate(db: &MongoDB, candidates: Vec<Candidate>) -> Result<Vec<CandidateResponse>, AppError> {
    let mut recruiter_ids: Vec<ObjectId> = candidates.iter().map(|c| c.recruiter).collect();
    recruiter_ids.sort();
    recruiter_ids.dedup();

    let mut job_ids: Vec<ObjectId> = candidates.iter().filter_map(|c| c.job).collect();
    job_ids.sort();
    job_ids.dedup();

    let usernames = user_service::usernames_by_id(db, &recruiter_ids).await?;

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

    Ok(candidates
        .into_iter()
        .map(|c| {
            let job = c.job.and_then(|id| jobs.get(&id));
            let job_code = job.map(|j| j.job_code.clone());
            let position = job.map(|j| j.position.clone());
            let mut resp = CandidateResponse::from(c);
            resp.recruiter_name = usernames.get(&resp.recruiter).cloned();
            resp.job_code = job_code;
            resp.position = position;
            resp
        })
        .collect())
}

pub async fn create_candidate(
    db: &MongoDB,
    claims: &Claims,
    request: &CreateCandidateRequest,
) -> Result<CandidateResponse, AppError> {
    let recruiter = claims.assign_recruiter(request.recruiter.as_deref())?;
    ensure_active_user(db, recruiter).await?;

    let job = match request.job.as_deref().filter(|j| !j.trim().is_empty()) {
        Some(j) => {
            let oid = parse_object_id(j, "job")?;
            ensure_job_exists(db, oid).await?;
            Some(oid)
        }
        None => None,
    };

    // validate before allocating an ID
    build_candidate(request, String::new(), recruiter, job)?;

    let candidate_id = next_sequence_id(db, SequenceKind::Candidate).await?;
    let mut candidate = build_candidate(request, candidate_id, recruiter, job)?;

    let result = db.collection::<Candidate>(CANDIDATES).insert_one(&candidate).await?;
    candidate.id = result.inserted_id.as_object_id();

    log::info!("✅ Candidate {} created by {}", candidate.candidate_id, claims.username);

    let mut populated = populate(db, vec![candidate]).await?;
    populated
        .pop()
        .ok_or_else(|| AppError::Internal("Candidate vanished after insert".to_string()))
}

pub async fn list_candidates(
    db: &MongoDB,
    claims: &Claims,
    query: &CandidateQuery,
) -> Result<CandidatePage, AppError> {
    let filter = list_filter(claims, query)?;
    let pagination = Pagination::new(query.page, query.limit);
    let collection = db.collection::<Candidate>(CANDIDATES);

    let total = collection.count_documents(filter.clone()).await?;

    let candidates: Vec<Candidate> = collection
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(pagination.skip())
        .limit(pagination.limit as i64)
        .await?
        .try_collect()
        .await?;

    Ok(CandidatePage {
        candidates: populate(db, candidates).await?,
        total,
        pagination,
    })
}

/// Loads a candidate the caller is allowed to see
pub async fn fetch_candidate(db: &MongoDB, claims: &Claims, id: &str) -> Result<Candidate, AppError> {
    let candidate = db
        .collection::<Candidate>(CANDIDATES)
        .find_one(lookup_filter(id)?)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {}", id)))?;

    if !can_access(claims, &candidate) {
        return Err(AppError::Forbidden("This candidate is assigned to another recruiter".to_string()));
    }

    Ok(candidate)
}

pub async fn get_candidate(db: &MongoDB, claims: &Claims, id: &str) -> Result<CandidateResponse, AppError> {
    let candidate = fetch_candidate(db, claims, id).await?;
    let mut populated = populate(db, vec![candidate]).await?;
    populated
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Candidate {}", id)))
}

pub async fn update_candidate(
    db: &MongoDB,
    claims: &Claims,
    id: &str,
    request: &UpdateCandidateRequest,
) -> Result<CandidateResponse, AppError> {
    let existing = fetch_candidate(db, claims, id).await?;
    let oid = existing
        .id
        .ok_or_else(|| AppError::Internal("Candidate without _id".to_string()))?;

    let update = build_update(claims, request)?;

    if let Ok(recruiter) = update.get_object_id("recruiter") {
        ensure_active_user(db, recruiter).await?;
    }
    if let Ok(job) = update.get_object_id("job") {
        ensure_job_exists(db, job).await?;
    }

    db.collection::<Candidate>(CANDIDATES)
        .update_one(doc! { "_id": oid }, doc! { "$set": update })
        .await?;

    get_candidate(db, claims, &oid.to_hex()).await
}

pub async fn update_status(
    db: &MongoDB,
    claims: &Claims,
    id: &str,
    status: CandidateStatus,
) -> Result<CandidateResponse, AppError> {
    let request = UpdateCandidateRequest {
        status: Some(status),
        ..Default::default()
    };
    update_candidate(db, claims, id, &request).await
}

/// Sets the status by ObjectId without access checks; used when an
/// interview moves a candidate forward
pub async fn set_status(db: &MongoDB, candidate: ObjectId, status: CandidateStatus) -> Result<(), AppError> {
    db.collection::<Candidate>(CANDIDATES)
        .update_one(
            doc! { "_id": candidate },
            doc! { "$set": { "status": status.as_str(), "updated_at": BsonDateTime::now() } },
        )
        .await?;
    Ok(())
}

pub async fn delete_candidate(db: &MongoDB, claims: &Claims, id: &str) -> Result<(), AppError> {
    let existing = fetch_candidate(db, claims, id).await?;
    let oid = existing
        .id
        .ok_or_else(|| AppError::Internal("Candidate without _id".to_string()))?;

    db.collection::<Candidate>(CANDIDATES)
        .delete_one(doc! { "_id": oid })
        .await?;

    log::info!("🗑️ Candidate {} deleted by {}", existing.candidate_id, claims.username);
    Ok(())
}

/// Test helper shared with other service tests
#[cfg(test)]
pub fn claims_for(role: crate::models::UserRole) -> Claims {
    Claims {
        sub: ObjectId::new().to_hex(),
        username: "tester".into(),
        role,
        iat: 0,
        exp: usize::MAX,
        jti: "test".into(),
        aud: "test".into(),
        iss: "test".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn create_request() -> CreateCandidateRequest {
        CreateCandidateRequest {
            name: " Arjun Mehta ".into(),
            contact: "9876543210".into(),
            email: "Arjun@Mail.com".into(),
            skills: vec!["Java".into(), "spring, java".into()],
            status: None,
            recruiter: None,
            job: None,
            experience: Some("5 yrs".into()),
            current_ctc: Some("12 LPA".into()),
            expected_ctc: Some(" ".into()),
            notice_period: None,
            location: None,
            remarks: None,
        }
    }

    #[test]
    fn test_scope_filter() {
        let admin = claims_for(UserRole::Admin);
        assert!(scope_filter(&admin).unwrap().is_empty());

        let recruiter = claims_for(UserRole::Recruiter);
        let filter = scope_filter(&recruiter).unwrap();
        assert_eq!(filter.get_object_id("recruiter").unwrap().to_hex(), recruiter.sub);
    }

    #[test]
    fn test_lookup_filter_accepts_both_id_forms() {
        let oid = ObjectId::new();
        assert_eq!(lookup_filter(&oid.to_hex()).unwrap(), doc! { "_id": oid });
        assert_eq!(
            lookup_filter("cand-0012").unwrap(),
            doc! { "candidate_id": "CAND-0012" }
        );
        assert!(lookup_filter("12").is_err());
    }

    #[test]
    fn test_recruiter_cannot_filter_other_recruiters() {
        let recruiter = claims_for(UserRole::Recruiter);
        let query = CandidateQuery {
            status: Some(CandidateStatus::Shortlisted),
            recruiter: Some(ObjectId::new().to_hex()),
            job: None,
            search: None,
            page: None,
            limit: None,
        };
        let filter = list_filter(&recruiter, &query).unwrap();
        assert_eq!(filter.get_object_id("recruiter").unwrap().to_hex(), recruiter.sub);
        assert_eq!(filter.get_str("status").unwrap(), "Shortlisted");
    }

    #[test]
    fn test_admin_list_filter_with_search() {
        let admin = claims_for(UserRole::Admin);
        let other = ObjectId::new();
        let query = CandidateQuery {
            status: None,
            recruiter: Some(other.to_hex()),
            job: None,
            search: Some("arjun".into()),
            page: None,
            limit: None,
        };
        let filter = list_filter(&admin, &query).unwrap();
        let clauses = filter.get_array("$and").unwrap();
        let base = clauses[0].as_document().unwrap();
        assert_eq!(base.get_object_id("recruiter").unwrap(), other);
        let search = clauses[1].as_document().unwrap();
        assert_eq!(search.get_array("$or").unwrap().len(), SEARCH_FIELDS.len());
    }

    #[test]
    fn test_build_candidate_normalizes() {
        let recruiter = ObjectId::new();
        let c = build_candidate(&create_request(), "CAND-0001".into(), recruiter, None).unwrap();
        assert_eq!(c.name, "Arjun Mehta");
        assert_eq!(c.email, "arjun@mail.com");
        assert_eq!(c.skills, vec!["Java", "spring"]);
        assert_eq!(c.status, CandidateStatus::New);
        assert_eq!(c.expected_ctc, None);
        assert_eq!(c.current_ctc.as_deref(), Some("12 LPA"));
    }

    #[test]
    fn test_build_candidate_requires_fields() {
        let mut request = create_request();
        request.contact = "  ".into();
        let err = build_candidate(&request, "CAND-0001".into(), ObjectId::new(), None).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_build_update_reassignment_is_admin_only() {
        let request = UpdateCandidateRequest {
            recruiter: Some(ObjectId::new().to_hex()),
            ..Default::default()
        };
        assert!(matches!(
            build_update(&claims_for(UserRole::Recruiter), &request),
            Err(AppError::Forbidden(_))
        ));
        assert!(build_update(&claims_for(UserRole::Admin), &request).is_ok());
    }

    #[test]
    fn test_build_update_clears_job_and_text() {
        let request = UpdateCandidateRequest {
            job: Some(String::new()),
            remarks: Some("".into()),
            status: Some(CandidateStatus::Offered),
            ..Default::default()
        };
        let update = build_update(&claims_for(UserRole::Recruiter), &request).unwrap();
        assert_eq!(update.get("job"), Some(&Bson::Null));
        assert_eq!(update.get("remarks"), Some(&Bson::Null));
        assert_eq!(update.get_str("status").unwrap(), "Offered");
        assert!(!update.contains_key("name"));
    }
}
