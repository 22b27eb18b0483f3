use crate::{
    database::{MongoDB, CANDIDATES, COUNTERS, INTERVIEWS},
    utils::AppError,
};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use serde::{Deserialize, Serialize};

/// Entities that carry a human readable sequential ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Candidate,
    Interview,
}

impl SequenceKind {
    fn counter_key(&self) -> &'static str {
        match self {
            SequenceKind::Candidate => "candidate",
            SequenceKind::Interview => "interview",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            SequenceKind::Candidate => "CAND",
            SequenceKind::Interview => "INT",
        }
    }

    fn collection(&self) -> &'static str {
        match self {
            SequenceKind::Candidate => CANDIDATES,
            SequenceKind::Interview => INTERVIEWS,
        }
    }

    fn id_field(&self) -> &'static str {
        match self {
            SequenceKind::Candidate => "candidate_id",
            SequenceKind::Interview => "interview_id",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Counter {
    #[serde(rename = "_id")]
    id: String,
    seq: i64,
}

/// `PREFIX-NNNN`, zero padded to four digits
pub fn format_sequence_id(prefix: &str, n: u64) -> String {
    format!("{}-{:04}", prefix, n)
}

pub fn parse_sequence_number(prefix: &str, id: &str) -> Option<u64> {
    id.strip_prefix(prefix)?.strip_prefix('-')?.parse().ok()
}

/// Allocates the next ID from the `counters` collection with an atomic `$inc`.
pub async fn next_sequence_id(db: &MongoDB, kind: SequenceKind) -> Result<String, AppError> {
    let counters = db.collection::<Counter>(COUNTERS);

    if counters.find_one(doc! { "_id": kind.counter_key() }).await?.is_none() {
        seed_counter(db, kind).await?;
    }

    let counter = counters
        .find_one_and_update(
            doc! { "_id": kind.counter_key() },
            doc! { "$inc": { "seq": 1_i64 } },
        )
        .upsert(true)
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Counter {} missing after upsert", kind.counter_key())))?;

    Ok(format_sequence_id(kind.prefix(), counter.seq.max(0) as u64))
}

/// Starts the counter at the highest number already in use so existing
/// records keep their IDs.
async fn seed_counter(db: &MongoDB, kind: SequenceKind) -> Result<(), AppError> {
    let id_field = kind.id_field();
    let mut cursor = db
        .collection::<Document>(kind.collection())
        .find(doc! {})
        .projection(doc! { id_field: 1 })
        .await?;

    let mut highest: u64 = 0;
    while let Some(document) = cursor.try_next().await? {
        if let Some(n) = document
            .get_str(id_field)
            .ok()
            .and_then(|id| parse_sequence_number(kind.prefix(), id))
        {
            highest = highest.max(n);
        }
    }

    let seed = Counter {
        id: kind.counter_key().to_string(),
        seq: highest as i64,
    };

    match db.collection::<Counter>(COUNTERS).insert_one(&seed).await {
        Ok(_) => {
            log::info!("🔢 Seeded {} counter at {}", kind.counter_key(), highest);
            Ok(())
        }
        Err(e) => match AppError::from(e) {
            // another request seeded it first
            AppError::Conflict(_) => Ok(()),
            other => Err(other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sequence_id() {
        assert_eq!(format_sequence_id("CAND", 1), "CAND-0001");
        assert_eq!(format_sequence_id("INT", 42), "INT-0042");
        assert_eq!(format_sequence_id("CAND", 12345), "CAND-12345");
    }

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(parse_sequence_number("CAND", "CAND-0007"), Some(7));
        assert_eq!(parse_sequence_number("CAND", "CAND-10001"), Some(10001));
        assert_eq!(parse_sequence_number("CAND", "INT-0007"), None);
        assert_eq!(parse_sequence_number("INT", "INT-abc"), None);
        assert_eq!(parse_sequence_number("INT", "INT0001"), None);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_sequence_is_monotonic() {
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/recruitment_test".to_string());
        let db = MongoDB::new(&uri).await.expect("connect");

        let first = next_sequence_id(&db, SequenceKind::Interview).await.unwrap();
        let second = next_sequence_id(&db, SequenceKind::Interview).await.unwrap();

        let a = parse_sequence_number("INT", &first).unwrap();
        let b = parse_sequence_number("INT", &second).unwrap();
        assert_eq!(b, a + 1);
    }
}
