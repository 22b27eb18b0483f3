use crate::{
    database::{MongoDB, CLIENTS, JOBS},
    models::{Client, ClientQuery, ClientResponse, CreateClientRequest, UpdateClientRequest},
    utils::{and_all, clean_text, equals_ignore_case, parse_object_id, require_text, search_filter, validate_email, AppError},
};
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};

pub fn list_filter(query: &ClientQuery) -> Document {
    let mut base = Document::new();
    if let Some(active) = query.active {
        base.insert("is_active", active);
    }

    let mut clauses = vec![base];
    if let Some(search) = search_filter(
        query.search.as_deref(),
        &["name", "contact_person", "email", "industry"],
    ) {
        clauses.push(search);
    }
    and_all(clauses)
}

fn optional_email(value: Option<&String>) -> Result<Option<String>, AppError> {
    match clean_text(value) {
        Some(email) => validate_email(&email).map(Some),
        None => Ok(None),
    }
}

pub fn build_client(request: &CreateClientRequest) -> Result<Client, AppError> {
    let now = BsonDateTime::now();

    Ok(Client {
        id: None,
        name: require_text(&request.name, "Client name")?,
        contact_person: clean_text(request.contact_person.as_ref()),
        email: optional_email(request.email.as_ref())?,
        phone: clean_text(request.phone.as_ref()),
        address: clean_text(request.address.as_ref()),
        industry: clean_text(request.industry.as_ref()),
        is_active: request.is_active.unwrap_or(true),
        notes: clean_text(request.notes.as_ref()),
        created_at: now,
        updated_at: now,
    })
}

pub fn build_update(request: &UpdateClientRequest) -> Result<Document, AppError> {
    let mut update = doc! { "updated_at": BsonDateTime::now() };

    if let Some(name) = &request.name {
        update.insert("name", require_text(name, "Client name")?);
    }
    if request.email.is_some() {
        update.insert("email", optional_email(request.email.as_ref())?);
    }
    if let Some(active) = request.is_active {
        update.insert("is_active", active);
    }

    let free_text = [
        ("contact_person", &request.contact_person),
        ("phone", &request.phone),
        ("address", &request.address),
        ("industry", &request.industry),
        ("notes", &request.notes),
    ];
    for (key, value) in free_text {
        if value.is_some() {
            update.insert(key, clean_text(value.as_ref()));
        }
    }

    Ok(update)
}

/// Case-insensitive exact name match
fn name_filter(name: &str) -> Document {
    equals_ignore_case("name", name)
}

/// Jobs referencing the client, matched the same way client names are unique
fn jobs_for_client_filter(name: &str) -> Document {
    equals_ignore_case("client_name", name)
}

pub async fn create_client(db: &MongoDB, request: &CreateClientRequest) -> Result<ClientResponse, AppError> {
    let mut client = build_client(request)?;
    let collection = db.collection::<Client>(CLIENTS);

    if collection.find_one(name_filter(&client.name)).await?.is_some() {
        return Err(AppError::Conflict(format!("Client {} already exists", client.name)));
    }

    let result = collection.insert_one(&client).await?;
    client.id = result.inserted_id.as_object_id();

    log::info!("✅ Client {} created", client.name);
    Ok(ClientResponse::from(client))
}

pub async fn list_clients(db: &MongoDB, query: &ClientQuery) -> Result<Vec<ClientResponse>, AppError> {
    let clients: Vec<Client> = db
        .collection::<Client>(CLIENTS)
        .find(list_filter(query))
        .sort(doc! { "name": 1 })
        .await?
        .try_collect()
        .await?;

    Ok(clients.into_iter().map(ClientResponse::from).collect())
}

/// Includes the number of jobs that name this client
pub async fn get_client(db: &MongoDB, id: &str) -> Result<ClientResponse, AppError> {
    let oid = parse_object_id(id, "client")?;
    let client = db
        .collection::<Client>(CLIENTS)
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {}", id)))?;

    let job_count = db
        .collection::<Document>(JOBS)
        .count_documents(jobs_for_client_filter(&client.name))
        .await?;

    let mut resp = ClientResponse::from(client);
    resp.job_count = Some(job_count);
    Ok(resp)
}

pub async fn update_client(db: &MongoDB, id: &str, request: &UpdateClientRequest) -> Result<ClientResponse, AppError> {
    let oid = parse_object_id(id, "client")?;
    let update = build_update(request)?;
    let collection = db.collection::<Client>(CLIENTS);

    if let Ok(name) = update.get_str("name") {
        let mut clash = name_filter(name);
        clash.insert("_id", doc! { "$ne": oid });
        if collection.find_one(clash).await?.is_some() {
            return Err(AppError::Conflict(format!("Client {} already exists", name)));
        }
    }

    let result = collection
        .update_one(doc! { "_id": oid }, doc! { "$set": update })
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(format!("Client {}", id)));
    }

    get_client(db, id).await
}

pub async fn delete_client(db: &MongoDB, id: &str) -> Result<(), AppError> {
    let oid = parse_object_id(id, "client")?;
    let result = db
        .collection::<Client>(CLIENTS)
        .delete_one(doc! { "_id": oid })
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound(format!("Client {}", id)));
    }

    log::info!("🗑️ Client {} deleted", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        let client = build_client(&CreateClientRequest {
            name: " Globex ".into(),
            contact_person: Some("Hank".into()),
            email: Some("HR@Globex.com".into()),
            phone: None,
            address: None,
            industry: Some(" ".into()),
            is_active: None,
            notes: None,
        })
        .unwrap();

        assert_eq!(client.name, "Globex");
        assert_eq!(client.email.as_deref(), Some("hr@globex.com"));
        assert_eq!(client.industry, None);
        assert!(client.is_active);
    }

    #[test]
    fn test_build_client_rejects_bad_email() {
        let request = CreateClientRequest {
            name: "Globex".into(),
            contact_person: None,
            email: Some("globex".into()),
            phone: None,
            address: None,
            industry: None,
            is_active: None,
            notes: None,
        };
        assert!(build_client(&request).is_err());
    }

    #[test]
    fn test_name_filter_is_anchored_and_escaped() {
        let filter = name_filter("A+B Ltd.");
        let regex = filter.get_document("name").unwrap();
        assert_eq!(regex.get_str("$regex").unwrap(), "^A\\+B Ltd\\.$");
    }

    #[test]
    fn test_job_count_matches_client_name_ignoring_case() {
        let filter = jobs_for_client_filter("Acme Corp");
        let regex = filter.get_document("client_name").unwrap();
        assert_eq!(regex.get_str("$regex").unwrap(), "^Acme Corp$");
        assert_eq!(regex.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_build_update_allows_clearing_email() {
        let update = build_update(&UpdateClientRequest {
            email: Some("".into()),
            is_active: Some(false),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.get("email"), Some(&mongodb::bson::Bson::Null));
        assert!(!update.get_bool("is_active").unwrap());
    }
}
