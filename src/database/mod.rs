use mongodb::{bson::doc, bson::Document, options::IndexOptions, Client, Collection, Database, IndexModel};
use std::error::Error;

pub const USERS: &str = "users";
pub const CANDIDATES: &str = "candidates";
pub const JOBS: &str = "jobs";
pub const CLIENTS: &str = "clients";
pub const INTERVIEWS: &str = "interviews";
pub const MESSAGES: &str = "messages";
pub const COUNTERS: &str = "counters";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        let db_name = database_name_from_uri(uri);
        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the unique and lookup indexes each collection relies on
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let specs: Vec<(&str, Document, bool)> = vec![
            (USERS, doc! { "username": 1 }, true),
            (USERS, doc! { "email": 1 }, true),
            (USERS, doc! { "role": 1, "is_active": 1 }, false),
            (CANDIDATES, doc! { "candidate_id": 1 }, true),
            (CANDIDATES, doc! { "recruiter": 1, "status": 1 }, false),
            (CANDIDATES, doc! { "job": 1 }, false),
            (JOBS, doc! { "job_code": 1 }, true),
            (JOBS, doc! { "client_name": 1 }, false),
            (JOBS, doc! { "status": 1 }, false),
            (CLIENTS, doc! { "name": 1 }, true),
            (INTERVIEWS, doc! { "interview_id": 1 }, true),
            (INTERVIEWS, doc! { "recruiter": 1, "scheduled_date": 1 }, false),
            (INTERVIEWS, doc! { "candidate": 1 }, false),
            (MESSAGES, doc! { "to": 1, "read": 1 }, false),
            (MESSAGES, doc! { "from": 1 }, false),
            (MESSAGES, doc! { "sender_id": 1 }, false),
        ];

        for (collection_name, keys, unique) in specs {
            let collection = self.collection::<Document>(collection_name);
            let label = format!("{}({})", collection_name, keys.keys().cloned().collect::<Vec<_>>().join(", "));

            let index = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(unique).build())
                .build();

            match collection.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index ready: {}{}", label, if unique { " [unique]" } else { "" }),
                Err(e) => log::warn!("   ⚠️  Could not create index {}: {}", label, e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn ping(&self) -> Result<(), mongodb::error::Error> {
        self.db.run_command(doc! { "ping": 1 }).await.map(|_| ())
    }
}

/// Extracts the database name from the URI path, defaulting to `recruitment`
pub fn database_name_from_uri(uri: &str) -> String {
    let without_scheme = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);

    without_scheme
        .split_once('/')
        .map(|(_, path)| path.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or("recruitment")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_name_from_uri() {
        assert_eq!(database_name_from_uri("mongodb://localhost:27017/agency"), "agency");
        assert_eq!(
            database_name_from_uri("mongodb+srv://u:p@cluster.x.net/hr_db?retryWrites=true"),
            "hr_db"
        );
        assert_eq!(database_name_from_uri("mongodb://localhost:27017"), "recruitment");
        assert_eq!(database_name_from_uri("mongodb://localhost:27017/?tls=true"), "recruitment");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/recruitment_test".to_string());

        let db = MongoDB::new(&uri).await.expect("connect");
        assert!(db.ping().await.is_ok());
    }
}
