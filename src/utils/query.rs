use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::Serialize;

use super::error::AppError;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 200;

/// Resolved page window for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Documents to skip, clamped to the largest value MongoDB accepts
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit).min(i64::MAX as u64)
    }
}

pub fn parse_object_id(value: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(value.trim())
        .map_err(|_| AppError::InvalidRequest(format!("Invalid {} ID: {}", what, value)))
}

/// Escapes regex metacharacters so user search input matches literally
pub fn escape_regex(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\.+*?()|[]{}^$#&-~/".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Case-insensitive `$or` over `fields`, or `None` for a blank search term
pub fn search_filter(term: Option<&str>, fields: &[&str]) -> Option<Document> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let pattern = escape_regex(term);

    let clauses: Vec<Document> = fields
        .iter()
        .map(|field| {
            let mut clause = Document::new();
            clause.insert(*field, doc! { "$regex": &pattern, "$options": "i" });
            clause
        })
        .collect();

    Some(doc! { "$or": clauses })
}

/// `{field: value}` ignoring case: an anchored, escaped, case-insensitive regex
pub fn equals_ignore_case(field: &str, value: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(
        field,
        doc! { "$regex": format!("^{}$", escape_regex(value.trim())), "$options": "i" },
    );
    filter
}

/// Joins filter clauses with `$and`, skipping empty ones
pub fn and_all(clauses: Vec<Document>) -> Document {
    let mut clauses: Vec<Document> = clauses.into_iter().filter(|d| !d.is_empty()).collect();
    match clauses.len() {
        0 => Document::new(),
        1 => clauses.remove(0),
        _ => doc! { "$and": clauses },
    }
}

/// Trims free text, mapping blank strings to `None`
pub fn clean_text(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn require_text(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

pub fn validate_email(value: &str) -> Result<String, AppError> {
    let email = require_text(value, "Email")?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::InvalidRequest(format!("Invalid email address: {}", value))),
    }
}

pub fn format_datetime(dt: &mongodb::bson::DateTime) -> String {
    dt.try_to_rfc3339_string().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_caps() {
        let p = Pagination::new(None, None);
        assert_eq!(p, Pagination { page: 1, limit: DEFAULT_PAGE_SIZE });
        assert_eq!(p.skip(), 0);

        let p = Pagination::new(Some(0), Some(10_000));
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, MAX_PAGE_SIZE);

        let p = Pagination::new(Some(3), Some(20));
        assert_eq!(p.skip(), 40);
    }

    #[test]
    fn test_pagination_skip_saturates_on_huge_page() {
        let p = Pagination::new(Some(u64::MAX / 2), Some(MAX_PAGE_SIZE));
        assert_eq!(p.skip(), i64::MAX as u64);

        let p = Pagination::new(Some(u64::MAX), None);
        assert_eq!(p.skip(), i64::MAX as u64);
    }

    #[test]
    fn test_equals_ignore_case() {
        let filter = equals_ignore_case("primary_recruiter", " Priya ");
        let regex = filter.get_document("primary_recruiter").unwrap();
        assert_eq!(regex.get_str("$regex").unwrap(), "^Priya$");
        assert_eq!(regex.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_escape_regex() {
        assert_eq!(escape_regex("c++ (senior)"), "c\\+\\+ \\(senior\\)");
        assert_eq!(escape_regex("plain"), "plain");
    }

    #[test]
    fn test_search_filter_builds_or() {
        assert!(search_filter(Some("   "), &["name"]).is_none());
        assert!(search_filter(None, &["name"]).is_none());

        let filter = search_filter(Some("java"), &["name", "email"]).unwrap();
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);
        let first = clauses[0].as_document().unwrap();
        let regex = first.get_document("name").unwrap();
        assert_eq!(regex.get_str("$regex").unwrap(), "java");
        assert_eq!(regex.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_and_all() {
        assert!(and_all(vec![Document::new()]).is_empty());
        assert_eq!(and_all(vec![doc! { "a": 1 }, Document::new()]), doc! { "a": 1 });
        let both = and_all(vec![doc! { "a": 1 }, doc! { "b": 2 }]);
        assert_eq!(both.get_array("$and").unwrap().len(), 2);
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" Jane@Agency.IO ").unwrap(), "jane@agency.io");
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@domain").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("507f1f77bcf86cd799439011", "candidate").is_ok());
        assert!(matches!(
            parse_object_id("nope", "candidate"),
            Err(AppError::InvalidRequest(_))
        ));
    }
}
