use crate::{
    database::{MongoDB, USERS},
    models::{UpdateUserRequest, User, UserInfo, UserQuery, UserRole},
    utils::{and_all, clean_text, parse_object_id, search_filter, validate_email, AppError},
};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use std::collections::HashMap;

pub fn list_filter(query: &UserQuery) -> Document {
    let mut base = Document::new();
    if let Some(role) = query.role {
        base.insert("role", role.as_str());
    }
    if let Some(active) = query.active {
        base.insert("is_active", active);
    }

    let mut clauses = vec![base];
    if let Some(search) = search_filter(query.search.as_deref(), &["username", "email", "full_name"]) {
        clauses.push(search);
    }
    and_all(clauses)
}

pub async fn list_users(db: &MongoDB, query: &UserQuery) -> Result<Vec<UserInfo>, AppError> {
    let users: Vec<User> = db
        .collection::<User>(USERS)
        .find(list_filter(query))
        .sort(doc! { "username": 1 })
        .await?
        .try_collect()
        .await?;

    Ok(users.into_iter().map(UserInfo::from).collect())
}

/// Active recruiters, for assignment dropdowns
pub async fn list_recruiters(db: &MongoDB) -> Result<Vec<UserInfo>, AppError> {
    list_users(
        db,
        &UserQuery {
            role: Some(UserRole::Recruiter),
            active: Some(true),
            search: None,
        },
    )
    .await
}

pub async fn get_user(db: &MongoDB, id: &str) -> Result<User, AppError> {
    let oid = parse_object_id(id, "user")?;
    db.collection::<User>(USERS)
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))
}

pub async fn find_by_username(db: &MongoDB, username: &str) -> Result<Option<User>, AppError> {
    Ok(db
        .collection::<User>(USERS)
        .find_one(doc! { "username": username.trim().to_lowercase() })
        .await?)
}

pub fn build_update(request: &UpdateUserRequest) -> Result<Document, AppError> {
    let mut update = doc! { "updated_at": BsonDateTime::now() };

    if let Some(email) = &request.email {
        update.insert("email", validate_email(email)?);
    }
    if let Some(role) = request.role {
        update.insert("role", role.as_str());
    }
    if let Some(active) = request.is_active {
        update.insert("is_active", active);
    }
    if request.full_name.is_some() {
        update.insert("full_name", clean_text(request.full_name.as_ref()));
    }
    if request.phone.is_some() {
        update.insert("phone", clean_text(request.phone.as_ref()));
    }

    Ok(update)
}

pub async fn update_user(
    db: &MongoDB,
    id: &str,
    acting_user: &str,
    request: &UpdateUserRequest,
) -> Result<UserInfo, AppError> {
    let oid = parse_object_id(id, "user")?;

    // an admin locking themselves out leaves nobody to undo it
    if oid.to_hex() == acting_user
        && (request.is_active == Some(false) || request.role == Some(UserRole::Recruiter))
    {
        return Err(AppError::InvalidRequest(
            "You cannot deactivate or demote your own account".to_string(),
        ));
    }

    let update = build_update(request)?;
    let collection = db.collection::<User>(USERS);

    let result = collection
        .update_one(doc! { "_id": oid }, doc! { "$set": update })
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(format!("User {}", id)));
    }

    get_user(db, id).await.map(UserInfo::from)
}

pub async fn set_active(db: &MongoDB, id: &str, acting_user: &str, active: bool) -> Result<UserInfo, AppError> {
    let request = UpdateUserRequest {
        is_active: Some(active),
        ..Default::default()
    };
    let user = update_user(db, id, acting_user, &request).await?;

    log::info!("👤 User {} {}", user.username, if active { "activated" } else { "deactivated" });
    Ok(user)
}

/// Deletes the account only; candidates and interviews keep their reference
pub async fn delete_user(db: &MongoDB, id: &str, acting_user: &str) -> Result<(), AppError> {
    let oid = parse_object_id(id, "user")?;

    if oid.to_hex() == acting_user {
        return Err(AppError::InvalidRequest("You cannot delete your own account".to_string()));
    }

    let result = db
        .collection::<User>(USERS)
        .delete_one(doc! { "_id": oid })
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound(format!("User {}", id)));
    }

    log::info!("🗑️ User {} deleted", id);
    Ok(())
}

/// Maps user IDs (hex) to usernames for display
pub async fn usernames_by_id(
    db: &MongoDB,
    ids: &[ObjectId],
) -> Result<HashMap<String, String>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users: Vec<User> = db
        .collection::<User>(USERS)
        .find(doc! { "_id": { "$in": ids.to_vec() } })
        .await?
        .try_collect()
        .await?;

    Ok(users
        .into_iter()
        .filter_map(|u| u.id.map(|id| (id.to_hex(), u.username)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_filter_combines_role_and_search() {
        let filter = list_filter(&UserQuery {
            role: Some(UserRole::Recruiter),
            active: Some(true),
            search: Some("pri".into()),
        });
        let clauses = filter.get_array("$and").unwrap();
        let base = clauses[0].as_document().unwrap();
        assert_eq!(base.get_str("role").unwrap(), "recruiter");
        assert!(base.get_bool("is_active").unwrap());
    }

    #[test]
    fn test_list_filter_empty() {
        let filter = list_filter(&UserQuery { role: None, active: None, search: None });
        assert!(filter.is_empty());
    }

    #[test]
    fn test_build_update_only_sets_given_fields() {
        let update = build_update(&UpdateUserRequest {
            email: Some("New@Agency.io".into()),
            role: None,
            is_active: Some(false),
            full_name: None,
            phone: None,
        })
        .unwrap();

        assert_eq!(update.get_str("email").unwrap(), "new@agency.io");
        assert!(!update.get_bool("is_active").unwrap());
        assert!(!update.contains_key("role"));
        assert!(!update.contains_key("full_name"));
        assert!(update.contains_key("updated_at"));
    }

    #[test]
    fn test_build_update_rejects_bad_email() {
        let request = UpdateUserRequest {
            email: Some("broken".into()),
            role: None,
            is_active: None,
            full_name: None,
            phone: None,
        };
        assert!(build_update(&request).is_err());
    }
}
