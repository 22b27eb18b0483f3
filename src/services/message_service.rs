use crate::{
    database::{MongoDB, MESSAGES},
    middleware::auth::Claims,
    models::{Message, MessageAddress, MessageResponse, SendMessageRequest, ADDRESS_ADMIN, ADDRESS_ALL},
    services::user_service,
    utils::{parse_object_id, require_text, AppError},
};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};

/// Address this caller writes into `from`
pub fn sender_address(claims: &Claims) -> String {
    if claims.is_admin() {
        ADDRESS_ADMIN.to_string()
    } else {
        claims.username.clone()
    }
}

/// Every address string that reaches the caller as a recipient
pub fn own_addresses(claims: &Claims) -> Vec<String> {
    let mut addresses = vec![claims.username.clone(), claims.sub.clone()];
    if claims.is_admin() {
        addresses.push(ADDRESS_ADMIN.to_string());
    }
    addresses
}

/// Messages the caller sent. Admin mail is matched on `sender_id` because
/// every admin writes `from: "admin"`.
pub fn sent_filter(claims: &Claims) -> Document {
    if claims.is_admin() {
        doc! { "sender_id": claims.sub.as_str() }
    } else {
        doc! {
            "$or": [
                { "sender_id": claims.sub.as_str() },
                { "from": { "$in": [claims.username.as_str(), claims.sub.as_str()] } }
            ]
        }
    }
}

/// Messages addressed to the caller directly, by ID, via broadcast, or (for
/// admins) to `admin`. The caller's own broadcasts are excluded.
pub fn inbox_filter(claims: &Claims) -> Document {
    let mut to = own_addresses(claims);
    to.push(ADDRESS_ALL.to_string());

    let own_broadcast = doc! { "$and": vec![doc! { "to": ADDRESS_ALL }, sent_filter(claims)] };

    doc! {
        "to": { "$in": to },
        "$nor": vec![own_broadcast]
    }
}

/// Checks the recipient exists and returns the address to store
async fn resolve_recipient(db: &MongoDB, claims: &Claims, raw: &str) -> Result<String, AppError> {
    match MessageAddress::parse(raw) {
        MessageAddress::Admin => Ok(ADDRESS_ADMIN.to_string()),
        MessageAddress::All => {
            if !claims.is_admin() {
                return Err(AppError::Forbidden("Only admins can message everyone".to_string()));
            }
            Ok(ADDRESS_ALL.to_string())
        }
        MessageAddress::UserId(id) => {
            user_service::get_user(db, &id.to_hex()).await?;
            Ok(id.to_hex())
        }
        MessageAddress::Username(name) => user_service::find_by_username(db, &name)
            .await?
            .map(|u| u.username)
            .ok_or_else(|| AppError::NotFound(format!("Recipient {}", name))),
    }
}

async fn resolve_all(db: &MongoDB, messages: Vec<Message>) -> Result<Vec<MessageResponse>, AppError> {
    let mut ids: Vec<ObjectId> = messages
        .iter()
        .flat_map(|m| [MessageAddress::parse(&m.from), MessageAddress::parse(&m.to)])
        .filter_map(|address| match address {
            MessageAddress::UserId(id) => Some(id),
            _ => None,
        })
        .collect();
    ids.sort();
    ids.dedup();

    let usernames = user_service::usernames_by_id(db, &ids).await?;

    Ok(messages
        .into_iter()
        .map(|m| MessageResponse::resolve(m, &usernames))
        .collect())
}

pub async fn send_message(
    db: &MongoDB,
    claims: &Claims,
    request: &SendMessageRequest,
) -> Result<MessageResponse, AppError> {
    let body = require_text(&request.body, "Message body")?;
    let to = resolve_recipient(db, claims, &request.to).await?;
    let now = BsonDateTime::now();

    let mut message = Message {
        id: None,
        from: sender_address(claims),
        sender_id: Some(claims.sub.clone()),
        to,
        subject: request
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
        body,
        read: false,
        created_at: now,
        updated_at: now,
    };

    let result = db.collection::<Message>(MESSAGES).insert_one(&message).await?;
    message.id = result.inserted_id.as_object_id();

    log::info!("✉️  Message {} -> {}", message.from, message.to);

    let mut resolved = resolve_all(db, vec![message]).await?;
    resolved
        .pop()
        .ok_or_else(|| AppError::Internal("Message vanished after insert".to_string()))
}

async fn find_messages(db: &MongoDB, filter: Document) -> Result<Vec<MessageResponse>, AppError> {
    let messages: Vec<Message> = db
        .collection::<Message>(MESSAGES)
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .limit(500)
        .await?
        .try_collect()
        .await?;

    resolve_all(db, messages).await
}

pub async fn inbox(db: &MongoDB, claims: &Claims) -> Result<Vec<MessageResponse>, AppError> {
    find_messages(db, inbox_filter(claims)).await
}

pub async fn sent(db: &MongoDB, claims: &Claims) -> Result<Vec<MessageResponse>, AppError> {
    find_messages(db, sent_filter(claims)).await
}

pub async fn unread_count(db: &MongoDB, claims: &Claims) -> Result<u64, AppError> {
    let mut filter = inbox_filter(claims);
    filter.insert("read", false);

    Ok(db.collection::<Message>(MESSAGES).count_documents(filter).await?)
}

pub async fn mark_read(db: &MongoDB, claims: &Claims, id: &str) -> Result<(), AppError> {
    let oid = parse_object_id(id, "message")?;
    let mut filter = inbox_filter(claims);
    filter.insert("_id", oid);

    let result = db
        .collection::<Message>(MESSAGES)
        .update_one(filter, doc! { "$set": { "read": true, "updated_at": BsonDateTime::now() } })
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(format!("Message {}", id)));
    }
    Ok(())
}

/// Senders may delete their own messages; admins may delete any
pub async fn delete_message(db: &MongoDB, claims: &Claims, id: &str) -> Result<(), AppError> {
    let oid = parse_object_id(id, "message")?;

    let filter = if claims.is_admin() {
        doc! { "_id": oid }
    } else {
        let mut filter = sent_filter(claims);
        filter.insert("_id", oid);
        filter
    };

    let result = db.collection::<Message>(MESSAGES).delete_one(filter).await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound(format!("Message {}", id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::services::candidate_service::claims_for;

    fn strings(doc: &Document, field: &str, op: &str) -> Vec<String> {
        doc.get_document(field)
            .unwrap()
            .get_array(op)
            .unwrap()
            .iter()
            .map(|b| b.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_sender_address() {
        assert_eq!(sender_address(&claims_for(UserRole::Admin)), "admin");
        assert_eq!(sender_address(&claims_for(UserRole::Recruiter)), "tester");
    }

    fn own_broadcast_exclusion(filter: &Document) -> Document {
        let nor = filter.get_array("$nor").unwrap();
        let clauses = nor[0].as_document().unwrap().get_array("$and").unwrap();
        assert_eq!(clauses[0].as_document().unwrap(), &doc! { "to": "all" });
        clauses[1].as_document().unwrap().clone()
    }

    #[test]
    fn test_recruiter_inbox_filter() {
        let claims = claims_for(UserRole::Recruiter);
        let filter = inbox_filter(&claims);

        let to = strings(&filter, "to", "$in");
        assert!(to.contains(&"tester".to_string()));
        assert!(to.contains(&claims.sub));
        assert!(to.contains(&"all".to_string()));
        assert!(!to.contains(&"admin".to_string()));
        assert!(!filter.contains_key("from"));

        assert_eq!(own_broadcast_exclusion(&filter), sent_filter(&claims));
    }

    #[test]
    fn test_admin_to_admin_message_reaches_inbox() {
        let sender = claims_for(UserRole::Admin);
        let mut recipient = claims_for(UserRole::Admin);
        recipient.username = "ops_admin".into();

        let filter = inbox_filter(&recipient);
        let to = strings(&filter, "to", "$in");
        assert!(to.contains(&"ops_admin".to_string()));
        assert!(to.contains(&"admin".to_string()));

        // only a broadcast carrying the recipient's own sender_id is dropped
        assert!(!filter.contains_key("from"));
        let exclusion = own_broadcast_exclusion(&filter);
        assert_eq!(exclusion, doc! { "sender_id": recipient.sub.as_str() });
        assert_ne!(sender.sub, recipient.sub);
        assert_eq!(sender_address(&sender), "admin");
    }

    #[test]
    fn test_sent_filter() {
        let recruiter = claims_for(UserRole::Recruiter);
        let or = sent_filter(&recruiter);
        let clauses = or.get_array("$or").unwrap();
        assert_eq!(clauses[0].as_document().unwrap(), &doc! { "sender_id": recruiter.sub.as_str() });
        let from = strings(clauses[1].as_document().unwrap(), "from", "$in");
        assert_eq!(from, vec!["tester".to_string(), recruiter.sub.clone()]);

        // admins do not see each other's mail through the shared address
        let admin = claims_for(UserRole::Admin);
        assert_eq!(sent_filter(&admin), doc! { "sender_id": admin.sub.as_str() });
    }
}
