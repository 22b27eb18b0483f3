use std::env;

/// JWT signing settings shared by the auth service and middleware
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiration_hours: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "default-secret-change-me".to_string(),
            issuer: "recruit-service".to_string(),
            audience: "recruit-dashboard".to_string(),
            expiration_hours: 24,
        }
    }
}

/// Credentials for the admin account created on first boot
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
    pub uses_defaults: bool,
}

/// Application configuration loaded from environment variables (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cors_origins: Vec<String>,
    pub admin_seed: AdminSeed,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let defaults = JwtConfig::default();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("PORT must be a valid port number: {}", e))?;

        let expiration_hours = match env::var("JWT_EXPIRATION_HOURS") {
            Ok(value) => value
                .parse::<i64>()
                .map_err(|e| format!("JWT_EXPIRATION_HOURS must be an integer: {}", e))?,
            Err(_) => defaults.expiration_hours,
        };

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("⚠️  JWT_SECRET not set, using insecure default");
            defaults.secret.clone()
        });

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_email = env::var("ADMIN_EMAIL").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();
        let uses_defaults = admin_password.is_none();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            database_url,
            jwt: JwtConfig {
                secret,
                issuer: env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
                audience: env::var("JWT_AUDIENCE").unwrap_or(defaults.audience),
                expiration_hours,
            },
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string()),
            ),
            admin_seed: AdminSeed {
                username: admin_username.unwrap_or_else(|| "admin".to_string()),
                email: admin_email.unwrap_or_else(|| "admin@agency.local".to_string()),
                password: admin_password.unwrap_or_else(|| "admin123".to_string()),
                uses_defaults,
            },
        })
    }
}

/// Splits a comma separated origin list, dropping blanks
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_trims_and_skips_blanks() {
        let origins = parse_origins(" http://localhost:3000/ ,, https://app.agency.io ");
        assert_eq!(
            origins,
            vec!["http://localhost:3000".to_string(), "https://app.agency.io".to_string()]
        );
    }

    #[test]
    fn test_parse_origins_empty() {
        assert!(parse_origins("").is_empty());
    }
}
