use crate::{
    database::{MongoDB, CANDIDATES, CLIENTS, INTERVIEWS, JOBS},
    middleware::auth::Claims,
    models::{CandidateStatus, InterviewStatus, JobStatus},
    services::{job_service, message_service},
    utils::{and_all, AppError},
};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq, utoipa::ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_candidates: u64,
    pub open_jobs: u64,
    pub total_clients: u64,
    pub interviews_today: u64,
    pub upcoming_interviews: u64,
    pub unread_messages: u64,
    pub candidates_by_status: Vec<StatusCount>,
}

/// One entry per known status in workflow order, missing ones as zero.
/// Unknown statuses coming back from the database are dropped.
pub fn zero_fill(grouped: &[Document]) -> Vec<StatusCount> {
    CandidateStatus::ALL
        .iter()
        .map(|status| {
            let count = grouped
                .iter()
                .find(|d| d.get_str("_id").ok() == Some(status.as_str()))
                .and_then(|d| match d.get("count") {
                    Some(Bson::Int32(n)) => Some(*n as u64),
                    Some(Bson::Int64(n)) => Some(*n as u64),
                    _ => None,
                })
                .unwrap_or(0);

            StatusCount {
                status: status.as_str().to_string(),
                count,
            }
        })
        .collect()
}

fn owner_filter(claims: &Claims) -> Result<Document, AppError> {
    if claims.is_admin() {
        Ok(Document::new())
    } else {
        Ok(doc! { "recruiter": claims.user_oid()? })
    }
}

fn open_jobs_filter(claims: &Claims) -> Document {
    let open = doc! { "status": JobStatus::Open.as_str() };
    if claims.is_admin() {
        open
    } else {
        and_all(vec![open, job_service::recruiter_filter(&claims.username)])
    }
}

fn interview_filter(claims: &Claims, date: Document) -> Result<Document, AppError> {
    let mut filter = owner_filter(claims)?;
    filter.insert("status", InterviewStatus::Scheduled.as_str());
    filter.insert("scheduled_date", date);
    Ok(filter)
}

pub async fn get_stats(db: &MongoDB, claims: &Claims) -> Result<DashboardStats, AppError> {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let owner = owner_filter(claims)?;
    let candidates = db.collection::<Document>(CANDIDATES);
    let interviews = db.collection::<Document>(INTERVIEWS);

    let total_candidates = candidates.count_documents(owner.clone()).await?;

    let grouped: Vec<Document> = candidates
        .aggregate(vec![
            doc! { "$match": owner },
            doc! { "$group": { "_id": "$status", "count": { "$sum": 1 } } },
        ])
        .await?
        .try_collect()
        .await?;

    let open_jobs = db
        .collection::<Document>(JOBS)
        .count_documents(open_jobs_filter(claims))
        .await?;
    let total_clients = db.collection::<Document>(CLIENTS).count_documents(doc! {}).await?;

    let interviews_today = interviews
        .count_documents(interview_filter(claims, doc! { "$eq": &today })?)
        .await?;
    let upcoming_interviews = interviews
        .count_documents(interview_filter(claims, doc! { "$gt": &today })?)
        .await?;

    let unread_messages = message_service::unread_count(db, claims).await?;

    log::debug!("📊 Dashboard stats for {} ({} candidates)", claims.username, total_candidates);

    Ok(DashboardStats {
        total_candidates,
        open_jobs,
        total_clients,
        interviews_today,
        upcoming_interviews,
        unread_messages,
        candidates_by_status: zero_fill(&grouped),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::services::candidate_service::claims_for;

    #[test]
    fn test_zero_fill_covers_every_status() {
        let grouped = vec![
            doc! { "_id": "New", "count": 4_i32 },
            doc! { "_id": "L1 Interview", "count": 2_i64 },
            doc! { "_id": "Archived", "count": 9_i32 },
        ];

        let counts = zero_fill(&grouped);
        assert_eq!(counts.len(), 11);
        assert_eq!(counts[0], StatusCount { status: "New".into(), count: 4 });
        assert_eq!(counts[3], StatusCount { status: "L1 Interview".into(), count: 2 });
        assert!(counts.iter().all(|c| c.status != "Archived"));
        assert_eq!(counts.iter().map(|c| c.count).sum::<u64>(), 6);
    }

    #[test]
    fn test_zero_fill_empty() {
        assert!(zero_fill(&[]).iter().all(|c| c.count == 0));
    }

    #[test]
    fn test_open_jobs_filter_scopes_recruiters() {
        let admin = open_jobs_filter(&claims_for(UserRole::Admin));
        assert!(admin.get("$or").is_none());

        let recruiter = open_jobs_filter(&claims_for(UserRole::Recruiter));
        let clauses = recruiter.get_array("$and").unwrap();
        assert_eq!(clauses[0].as_document().unwrap(), &doc! { "status": "Open" });
        // recruiter names typed as "Tester" still count for "tester"
        assert_eq!(clauses[1].as_document().unwrap(), &job_service::recruiter_filter("tester"));
    }

    #[test]
    fn test_interview_filter() {
        let claims = claims_for(UserRole::Recruiter);
        let filter = interview_filter(&claims, doc! { "$gt": "2026-10-18" }).unwrap();
        assert_eq!(filter.get_str("status").unwrap(), "Scheduled");
        assert!(filter.get_object_id("recruiter").is_ok());
        assert_eq!(
            filter.get_document("scheduled_date").unwrap().get_str("$gt").unwrap(),
            "2026-10-18"
        );
    }
}
