use crate::{
    config::JwtConfig,
    database::{MongoDB, USERS},
    models::{CreateUserRequest, User, UserInfo, UserRole},
    utils::{clean_text, parse_object_id, require_text, validate_email, AppError},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user ObjectId (hex)
    pub username: String,
    pub role: UserRole,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID
    pub aud: String,           // audience
    pub iss: String,           // issuer
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::admin_only())
        }
    }

    pub fn user_oid(&self) -> Result<ObjectId, AppError> {
        ObjectId::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Malformed token subject".to_string()))
    }

    /// Recruiter to own a new record. Admins may name anyone; recruiters may
    /// only name themselves, and a blank value means the caller.
    pub fn assign_recruiter(&self, requested: Option<&str>) -> Result<ObjectId, AppError> {
        match requested.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) if self.is_admin() => parse_object_id(r, "recruiter"),
            Some(r) if r != self.sub => Err(AppError::Forbidden(
                "Recruiters can only assign records to themselves".to_string(),
            )),
            _ => self.user_oid(),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Username or email
    #[serde(alias = "username", alias = "email")]
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserInfo,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(hash(password, DEFAULT_COST)?)
}

pub fn verify_password(password: &str, hashed: &str) -> Result<bool, AppError> {
    Ok(verify(password, hashed)?)
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// Generate JWT token
pub fn generate_jwt(user: &User, jwt: &JwtConfig) -> Result<String, AppError> {
    let now = Utc::now();

    let claims = Claims {
        sub: user.id_hex(),
        username: user.username.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(jwt.expiration_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: jwt.audience.clone(),
        iss: jwt.issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str, jwt: &JwtConfig) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[jwt.audience.as_str()]);

    let mut issuers = HashSet::new();
    issuers.insert(jwt.issuer.clone());
    validation.iss = Some(issuers);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt.secret.as_ref()),
        &validation,
    )?;

    Ok(data.claims)
}

/// Checks verified claims against the stored account. Missing or inactive
/// accounts are rejected; role and username are taken from the database so
/// a demotion applies to tokens already issued.
pub fn confirm_account(mut claims: Claims, account: Option<User>) -> Result<Claims, AppError> {
    let user = account.ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is inactive".to_string()));
    }

    claims.role = user.role;
    claims.username = user.username;
    Ok(claims)
}

/// Loads the account behind `claims` and applies [`confirm_account`]
pub async fn current_claims(db: &MongoDB, claims: Claims) -> Result<Claims, AppError> {
    let oid = claims.user_oid()?;
    let account = db
        .collection::<User>(USERS)
        .find_one(doc! { "_id": oid })
        .await?;

    confirm_account(claims, account)
}

/// Builds a user document with a hashed password; does not persist it
pub fn build_user(request: &CreateUserRequest) -> Result<User, AppError> {
    let username = require_text(&request.username, "Username")?.to_lowercase();
    if username.contains(char::is_whitespace) {
        return Err(AppError::InvalidRequest("Username cannot contain spaces".to_string()));
    }
    let role = request.role.unwrap_or_default();
    // message addresses; `admin` already reaches every admin
    let reserved = username == crate::models::ADDRESS_ALL
        || (username == crate::models::ADDRESS_ADMIN && role != UserRole::Admin);
    if reserved {
        return Err(AppError::InvalidRequest(format!("Username '{}' is reserved", username)));
    }

    let email = validate_email(&request.email)?;
    let now = BsonDateTime::now();

    Ok(User {
        id: None,
        username,
        email,
        password: hash_password(&request.password)?,
        role,
        is_active: true,
        full_name: clean_text(request.full_name.as_ref()),
        phone: clean_text(request.phone.as_ref()),
        last_login: None,
        created_at: now,
        updated_at: now,
    })
}

// User login by username or email
pub async fn login(
    db: &MongoDB,
    jwt: &JwtConfig,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<User>(USERS);
    let identifier = request.identifier.trim().to_lowercase();

    let filter = doc! {
        "$or": [
            { "username": &identifier },
            { "email": &identifier }
        ]
    };

    let user = collection
        .find_one(filter)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(&request.password, &user.password)? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is inactive".to_string()));
    }

    let user_id = user
        .id
        .ok_or_else(|| AppError::Internal("User without _id".to_string()))?;

    collection
        .update_one(
            doc! { "_id": user_id },
            doc! { "$set": { "last_login": BsonDateTime::now() } },
        )
        .await?;

    let token = generate_jwt(&user, jwt)?;

    Ok(AuthResponse {
        success: true,
        token,
        user: UserInfo::from(user),
    })
}

// Admin creates a new user account
pub async fn register(db: &MongoDB, request: &CreateUserRequest) -> Result<UserInfo, AppError> {
    let mut user = build_user(request)?;
    let collection = db.collection::<User>(USERS);

    let existing = collection
        .find_one(doc! {
            "$or": [
                { "username": &user.username },
                { "email": &user.email }
            ]
        })
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Username or email already registered".to_string()));
    }

    let result = collection.insert_one(&user).await?;
    user.id = result.inserted_id.as_object_id();

    log::info!("✅ User registered: {} ({})", user.username, user.role);

    Ok(UserInfo::from(user))
}

pub async fn get_current_user(db: &MongoDB, user_id: &str) -> Result<UserInfo, AppError> {
    let oid = parse_object_id(user_id, "user")?;

    let user = db
        .collection::<User>(USERS)
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(UserInfo::from(user))
}

pub async fn change_password(
    db: &MongoDB,
    user_id: &str,
    request: &ChangePasswordRequest,
) -> Result<(), AppError> {
    let oid = parse_object_id(user_id, "user")?;
    let collection = db.collection::<User>(USERS);

    let user = collection
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&request.current_password, &user.password)? {
        return Err(AppError::Unauthorized("Current password is incorrect".to_string()));
    }

    let hashed = hash_password(&request.new_password)?;

    collection
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": { "password": hashed, "updated_at": BsonDateTime::now() } },
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: None,
            full_name: Some("  ".to_string()),
            phone: None,
        }
    }

    fn user_with_id() -> User {
        let mut user = build_user(&request("Priya", "priya@agency.io", "secret99")).unwrap();
        user.id = Some(ObjectId::new());
        user
    }

    #[test]
    fn test_build_user_hashes_and_normalizes() {
        let user = build_user(&request(" Priya ", "Priya@Agency.io", "secret99")).unwrap();
        assert_eq!(user.username, "priya");
        assert_eq!(user.email, "priya@agency.io");
        assert_eq!(user.role, UserRole::Recruiter);
        assert_ne!(user.password, "secret99");
        assert!(verify_password("secret99", &user.password).unwrap());
        assert!(!verify_password("wrong", &user.password).unwrap());
        assert_eq!(user.full_name, None);
    }

    #[test]
    fn test_build_user_rejects_bad_input() {
        assert!(matches!(
            build_user(&request("admin", "a@b.io", "secret99")),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            build_user(&request("two words", "a@b.io", "secret99")),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            build_user(&request("sam", "a@b.io", "123")),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            build_user(&request("sam", "not-an-email", "secret99")),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(build_user(&request("all", "a@b.io", "secret99")).is_err());
    }

    #[test]
    fn test_admin_role_may_use_admin_username() {
        let mut admin = request("admin", "admin@agency.local", "admin123");
        admin.role = Some(UserRole::Admin);
        assert_eq!(build_user(&admin).unwrap().username, "admin");

        admin.username = "all".into();
        assert!(build_user(&admin).is_err());
    }

    #[test]
    fn test_jwt_roundtrip() {
        let jwt = JwtConfig::default();
        let user = user_with_id();

        let token = generate_jwt(&user, &jwt).unwrap();
        let claims = verify_token(&token, &jwt).unwrap();

        assert_eq!(claims.sub, user.id_hex());
        assert_eq!(claims.username, "priya");
        assert_eq!(claims.role, UserRole::Recruiter);
        assert!(!claims.is_admin());
        assert!(claims.require_admin().is_err());
        assert_eq!(claims.user_oid().unwrap(), user.id.unwrap());
    }

    #[test]
    fn test_jwt_rejects_wrong_secret_and_audience() {
        let jwt = JwtConfig::default();
        let token = generate_jwt(&user_with_id(), &jwt).unwrap();

        let other_secret = JwtConfig { secret: "another".into(), ..JwtConfig::default() };
        assert!(matches!(verify_token(&token, &other_secret), Err(AppError::Unauthorized(_))));

        let other_aud = JwtConfig { audience: "mobile".into(), ..JwtConfig::default() };
        assert!(verify_token(&token, &other_aud).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = JwtConfig { expiration_hours: -2, ..JwtConfig::default() };
        let token = generate_jwt(&user_with_id(), &jwt).unwrap();
        assert!(verify_token(&token, &jwt).is_err());
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("Bearer   "), None);
        assert_eq!(extract_bearer("Basic xyz"), None);
    }

    #[test]
    fn test_login_request_accepts_aliases() {
        let by_email: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.io","password":"x"}"#).unwrap();
        assert_eq!(by_email.identifier, "a@b.io");
        let by_username: LoginRequest =
            serde_json::from_str(r#"{"username":"sam","password":"x"}"#).unwrap();
        assert_eq!(by_username.identifier, "sam");
    }

    #[test]
    fn test_confirm_account_uses_stored_role_and_state() {
        let mut user = user_with_id();
        user.role = UserRole::Admin;
        let claims = verify_token(&generate_jwt(&user, &JwtConfig::default()).unwrap(), &JwtConfig::default()).unwrap();
        assert!(claims.is_admin());

        // demoted after the token was issued
        let mut demoted = user.clone();
        demoted.role = UserRole::Recruiter;
        let refreshed = confirm_account(claims.clone(), Some(demoted)).unwrap();
        assert!(!refreshed.is_admin());
        assert!(refreshed.require_admin().is_err());

        let mut inactive = user.clone();
        inactive.is_active = false;
        assert!(matches!(
            confirm_account(claims.clone(), Some(inactive)),
            Err(AppError::Unauthorized(_))
        ));

        assert!(matches!(confirm_account(claims, None), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_assign_recruiter() {
        let mut claims = verify_token(
            &generate_jwt(&user_with_id(), &JwtConfig::default()).unwrap(),
            &JwtConfig::default(),
        )
        .unwrap();
        let other = ObjectId::new();

        assert_eq!(claims.assign_recruiter(None).unwrap().to_hex(), claims.sub);
        assert_eq!(claims.assign_recruiter(Some("  ")).unwrap().to_hex(), claims.sub);
        let own = claims.sub.clone();
        assert_eq!(claims.assign_recruiter(Some(own.as_str())).unwrap().to_hex(), own);
        assert!(matches!(
            claims.assign_recruiter(Some(other.to_hex().as_str())),
            Err(AppError::Forbidden(_))
        ));

        claims.role = UserRole::Admin;
        assert_eq!(claims.assign_recruiter(Some(other.to_hex().as_str())).unwrap(), other);
        assert!(claims.assign_recruiter(Some("nope")).is_err());
    }
}
