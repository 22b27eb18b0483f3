use crate::config::AdminSeed;
use crate::database::{MongoDB, USERS};
use crate::models::{CreateUserRequest, User, UserRole};
use crate::services::auth_service;
use mongodb::bson::doc;

fn seed_request(seed: &AdminSeed) -> CreateUserRequest {
    CreateUserRequest {
        username: seed.username.clone(),
        email: seed.email.clone(),
        password: seed.password.clone(),
        role: Some(UserRole::Admin),
        full_name: Some("Administrator".to_string()),
        phone: None,
    }
}

/// Creates the first admin account when the users collection has none.
/// Failures are logged; the server still starts.
pub async fn seed_admin(db: &MongoDB, seed: &AdminSeed) {
    let admins = db
        .collection::<User>(USERS)
        .count_documents(doc! { "role": UserRole::Admin.as_str() })
        .await;

    match admins {
        Ok(count) if count > 0 => {
            log::info!("👤 Admin seed: {} admin account(s) present, skipping", count);
            return;
        }
        Ok(_) => {}
        Err(e) => {
            log::error!("❌ Admin seed: could not count admins: {}", e);
            return;
        }
    }

    match auth_service::register(db, &seed_request(seed)).await {
        Ok(user) => {
            log::info!("✅ Admin seed: created admin '{}'", user.username);
            if seed.uses_defaults {
                log::warn!(
                    "⚠️  Admin seed used the default password; set ADMIN_PASSWORD and change it after first login"
                );
            }
        }
        Err(e) => log::error!("❌ Admin seed failed: {}", e),
    }
}
