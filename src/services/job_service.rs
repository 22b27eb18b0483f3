use crate::{
    database::{MongoDB, CANDIDATES, JOBS},
    models::{normalize_job_code, default_openings, CreateJobRequest, Job, JobQuery, JobResponse, UpdateJobRequest},
    utils::{and_all, clean_text, equals_ignore_case, parse_object_id, require_text, search_filter, AppError, Pagination},
};
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};

const SEARCH_FIELDS: [&str; 4] = ["job_code", "position", "client_name", "skills"];

pub struct JobPage {
    pub jobs: Vec<JobResponse>,
    pub total: u64,
    pub pagination: Pagination,
}

/// Jobs naming `username` as primary or secondary recruiter, in any case
pub fn recruiter_filter(username: &str) -> Document {
    let either = vec![
        equals_ignore_case("primary_recruiter", username),
        equals_ignore_case("secondary_recruiter", username),
    ];
    doc! { "$or": either }
}

/// Recruiter fields hold usernames, which are stored lowercase
fn recruiter_name(value: Option<&String>) -> Option<String> {
    clean_text(value).map(|name| name.to_lowercase())
}

pub fn list_filter(query: &JobQuery) -> Document {
    let mut base = Document::new();
    if let Some(status) = query.status {
        base.insert("status", status.as_str());
    }

    let mut clauses = vec![base];

    if let Some(client) = query.client.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        clauses.push(equals_ignore_case("client_name", client));
    }
    if let Some(recruiter) = query.recruiter.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        clauses.push(recruiter_filter(recruiter));
    }
    if let Some(search) = search_filter(query.search.as_deref(), &SEARCH_FIELDS) {
        clauses.push(search);
    }

    and_all(clauses)
}

fn validate_openings(openings: u32) -> Result<u32, AppError> {
    if openings == 0 {
        return Err(AppError::InvalidRequest("Openings must be at least 1".to_string()));
    }
    Ok(openings)
}

pub fn build_job(request: &CreateJobRequest) -> Result<Job, AppError> {
    let job_code = normalize_job_code(&require_text(&request.job_code, "Job code")?);
    let now = BsonDateTime::now();

    Ok(Job {
        id: None,
        job_code,
        client_name: require_text(&request.client_name, "Client name")?,
        position: require_text(&request.position, "Position")?,
        skills: request.skills.trim().to_string(),
        budget: clean_text(request.budget.as_ref()),
        location: clean_text(request.location.as_ref()),
        experience: clean_text(request.experience.as_ref()),
        openings: validate_openings(request.openings.unwrap_or_else(default_openings))?,
        tat: clean_text(request.tat.as_ref()),
        primary_recruiter: recruiter_name(request.primary_recruiter.as_ref()),
        secondary_recruiter: recruiter_name(request.secondary_recruiter.as_ref()),
        status: request.status.unwrap_or_default(),
        description: clean_text(request.description.as_ref()),
        created_at: now,
        updated_at: now,
    })
}

pub fn build_update(request: &UpdateJobRequest) -> Result<Document, AppError> {
    let mut update = doc! { "updated_at": BsonDateTime::now() };

    if let Some(code) = &request.job_code {
        update.insert("job_code", normalize_job_code(&require_text(code, "Job code")?));
    }
    if let Some(client) = &request.client_name {
        update.insert("client_name", require_text(client, "Client name")?);
    }
    if let Some(position) = &request.position {
        update.insert("position", require_text(position, "Position")?);
    }
    if let Some(skills) = &request.skills {
        update.insert("skills", skills.trim());
    }
    if let Some(openings) = request.openings {
        update.insert("openings", validate_openings(openings)? as i64);
    }
    if let Some(status) = request.status {
        update.insert("status", status.as_str());
    }

    let free_text = [
        ("budget", &request.budget),
        ("location", &request.location),
        ("experience", &request.experience),
        ("tat", &request.tat),
        ("description", &request.description),
    ];
    for (key, value) in free_text {
        if value.is_some() {
            update.insert(key, clean_text(value.as_ref()));
        }
    }
    for (key, value) in [
        ("primary_recruiter", &request.primary_recruiter),
        ("secondary_recruiter", &request.secondary_recruiter),
    ] {
        if value.is_some() {
            update.insert(key, recruiter_name(value.as_ref()));
        }
    }

    Ok(update)
}

pub async fn create_job(db: &MongoDB, request: &CreateJobRequest) -> Result<JobResponse, AppError> {
    let mut job = build_job(request)?;
    let collection = db.collection::<Job>(JOBS);

    if collection.find_one(doc! { "job_code": &job.job_code }).await?.is_some() {
        return Err(AppError::Conflict(format!("Job code {} already exists", job.job_code)));
    }

    let result = collection.insert_one(&job).await?;
    job.id = result.inserted_id.as_object_id();

    log::info!("✅ Job {} created for {}", job.job_code, job.client_name);
    Ok(JobResponse::from(job))
}

pub async fn list_jobs(db: &MongoDB, query: &JobQuery) -> Result<JobPage, AppError> {
    let filter = list_filter(query);
    let pagination = Pagination::new(query.page, query.limit);
    let collection = db.collection::<Job>(JOBS);

    let total = collection.count_documents(filter.clone()).await?;
    let jobs: Vec<Job> = collection
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(pagination.skip())
        .limit(pagination.limit as i64)
        .await?
        .try_collect()
        .await?;

    Ok(JobPage {
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
        total,
        pagination,
    })
}

pub async fn get_job(db: &MongoDB, id: &str) -> Result<JobResponse, AppError> {
    let oid = parse_object_id(id, "job")?;
    db.collection::<Job>(JOBS)
        .find_one(doc! { "_id": oid })
        .await?
        .map(JobResponse::from)
        .ok_or_else(|| AppError::NotFound(format!("Job {}", id)))
}

pub async fn update_job(db: &MongoDB, id: &str, request: &UpdateJobRequest) -> Result<JobResponse, AppError> {
    let oid = parse_object_id(id, "job")?;
    let update = build_update(request)?;
    let collection = db.collection::<Job>(JOBS);

    if let Ok(code) = update.get_str("job_code") {
        let clash = collection
            .find_one(doc! { "job_code": code, "_id": { "$ne": oid } })
            .await?;
        if clash.is_some() {
            return Err(AppError::Conflict(format!("Job code {} already exists", code)));
        }
    }

    let result = collection
        .update_one(doc! { "_id": oid }, doc! { "$set": update })
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(format!("Job {}", id)));
    }

    get_job(db, id).await
}

/// Deletes the job. Candidates keep their (now dangling) job reference.
pub async fn delete_job(db: &MongoDB, id: &str) -> Result<u64, AppError> {
    let oid = parse_object_id(id, "job")?;

    let result = db.collection::<Job>(JOBS).delete_one(doc! { "_id": oid }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound(format!("Job {}", id)));
    }

    let linked = db
        .collection::<Document>(CANDIDATES)
        .count_documents(doc! { "job": oid })
        .await?;

    if linked > 0 {
        log::warn!("⚠️  Job {} deleted with {} linked candidates", id, linked);
    }

    Ok(linked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;

    fn create_request() -> CreateJobRequest {
        CreateJobRequest {
            job_code: " acme-001 ".into(),
            client_name: "Acme Corp".into(),
            position: "Backend Engineer".into(),
            skills: " Rust, Postgres ".into(),
            budget: Some("25 LPA".into()),
            location: Some("Pune".into()),
            experience: None,
            openings: None,
            tat: Some("2026-11-30".into()),
            primary_recruiter: Some("priya".into()),
            secondary_recruiter: Some("".into()),
            status: None,
            description: None,
        }
    }

    #[test]
    fn test_build_job_defaults() {
        let job = build_job(&create_request()).unwrap();
        assert_eq!(job.job_code, "ACME-001");
        assert_eq!(job.skills, "Rust, Postgres");
        assert_eq!(job.openings, 1);
        assert_eq!(job.status, JobStatus::Open);
        assert_eq!(job.secondary_recruiter, None);
    }

    #[test]
    fn test_build_job_rejects_zero_openings() {
        let mut request = create_request();
        request.openings = Some(0);
        assert!(build_job(&request).is_err());
    }

    #[test]
    fn test_list_filter_matches_either_recruiter() {
        let query = JobQuery {
            status: Some(JobStatus::Open),
            client: None,
            recruiter: Some("priya".into()),
            search: None,
            page: None,
            limit: None,
        };
        let filter = list_filter(&query);
        let clauses = filter.get_array("$and").unwrap();
        assert_eq!(clauses[0].as_document().unwrap().get_str("status").unwrap(), "Open");
        let either = clauses[1].as_document().unwrap().get_array("$or").unwrap();
        assert_eq!(either.len(), 2);
        let primary = either[0].as_document().unwrap().get_document("primary_recruiter").unwrap();
        assert_eq!(primary.get_str("$regex").unwrap(), "^priya$");
        assert_eq!(primary.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_recruiter_names_are_stored_lowercase() {
        let mut request = create_request();
        request.primary_recruiter = Some(" Priya ".into());
        request.secondary_recruiter = Some("RAHUL".into());
        let job = build_job(&request).unwrap();
        assert_eq!(job.primary_recruiter.as_deref(), Some("priya"));
        assert_eq!(job.secondary_recruiter.as_deref(), Some("rahul"));

        let update = build_update(&UpdateJobRequest {
            primary_recruiter: Some("Neha".into()),
            secondary_recruiter: Some("".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.get_str("primary_recruiter").unwrap(), "neha");
        assert_eq!(update.get("secondary_recruiter"), Some(&mongodb::bson::Bson::Null));
    }

    #[test]
    fn test_build_update_normalizes_code() {
        let update = build_update(&UpdateJobRequest {
            job_code: Some("acme-002".into()),
            tat: Some("".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.get_str("job_code").unwrap(), "ACME-002");
        assert_eq!(update.get("tat"), Some(&mongodb::bson::Bson::Null));
    }
}
