use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::format_datetime;

pub const ADDRESS_ADMIN: &str = "admin";
pub const ADDRESS_ALL: &str = "all";

/// Stored message. `from` and `to` are free-form addresses, see [`MessageAddress`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub from: String,
    /// Hex ID of the sending user. Admins share the `admin` address, so this
    /// tells their messages apart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    pub to: String,
    pub subject: Option<String>,
    pub body: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

/// Interpretation of a message address string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageAddress {
    Admin,
    All,
    UserId(ObjectId),
    Username(String),
}

impl MessageAddress {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(ADDRESS_ADMIN) {
            MessageAddress::Admin
        } else if raw.eq_ignore_ascii_case(ADDRESS_ALL) {
            MessageAddress::All
        } else if raw.len() == 24 {
            match ObjectId::parse_str(raw) {
                Ok(id) => MessageAddress::UserId(id),
                Err(_) => MessageAddress::Username(raw.to_string()),
            }
        } else {
            MessageAddress::Username(raw.to_string())
        }
    }

    /// Display name, looking up user IDs in `usernames` (hex ID -> username)
    pub fn display_name(&self, usernames: &HashMap<String, String>) -> String {
        match self {
            MessageAddress::Admin => "Admin".to_string(),
            MessageAddress::All => "All".to_string(),
            MessageAddress::UserId(id) => {
                let hex = id.to_hex();
                usernames.get(&hex).cloned().unwrap_or(hex)
            }
            MessageAddress::Username(name) => name.clone(),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SendMessageRequest {
    pub to: String,
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub from: String,
    pub from_name: String,
    pub to: String,
    pub to_name: String,
    pub subject: Option<String>,
    pub body: String,
    pub read: bool,
    pub created_at: String,
}

impl MessageResponse {
    pub fn resolve(m: Message, usernames: &HashMap<String, String>) -> Self {
        let from_name = MessageAddress::parse(&m.from).display_name(usernames);
        let to_name = MessageAddress::parse(&m.to).display_name(usernames);

        MessageResponse {
            id: m.id.map(|id| id.to_hex()).unwrap_or_default(),
            from: m.from,
            from_name,
            to: m.to,
            to_name,
            subject: m.subject,
            body: m.body,
            read: m.read,
            created_at: format_datetime(&m.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addresses() {
        assert_eq!(MessageAddress::parse("admin"), MessageAddress::Admin);
        assert_eq!(MessageAddress::parse(" ALL "), MessageAddress::All);
        assert_eq!(
            MessageAddress::parse("507f1f77bcf86cd799439011"),
            MessageAddress::UserId(ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap())
        );
        // 24 chars but not hex
        assert_eq!(
            MessageAddress::parse("recruiter_with_long_name"),
            MessageAddress::Username("recruiter_with_long_name".into())
        );
        assert_eq!(MessageAddress::parse("priya"), MessageAddress::Username("priya".into()));
    }

    #[test]
    fn test_resolve_display_names() {
        let id = ObjectId::new();
        let mut usernames = HashMap::new();
        usernames.insert(id.to_hex(), "priya".to_string());

        let message = Message {
            id: None,
            from: id.to_hex(),
            sender_id: Some(id.to_hex()),
            to: "admin".into(),
            subject: None,
            body: "Candidate joined".into(),
            read: false,
            created_at: BsonDateTime::now(),
            updated_at: BsonDateTime::now(),
        };

        let resp = MessageResponse::resolve(message, &usernames);
        assert_eq!(resp.from_name, "priya");
        assert_eq!(resp.to_name, "Admin");

        let unknown = ObjectId::new();
        assert_eq!(
            MessageAddress::UserId(unknown).display_name(&HashMap::new()),
            unknown.to_hex()
        );
    }
}
