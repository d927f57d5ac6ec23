use dotenvy::dotenv;
use std::env;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub db_host:        String,
    pub db_port:        u16,
    pub db_name:        String,
    pub db_user:        String,
    pub db_password:    String,
    pub db_pool_size:   u32,

    // Backend
    pub backend_host:   String,
    pub backend_port:   u16,
    pub cors_origin:    String,

    // Auth
    pub jwt_secret:       String,
    pub jwt_expiry_hours: i64,
    /// Argon2 time cost (iterations). Plays the role bcrypt rounds played
    /// in earlier deployments.
    pub hash_time_cost:   u32,

    // App
    pub app_env:        String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        fn parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
            match env::var(key) {
                Err(_) => Ok(default),
                Ok(raw) => raw
                    .parse::<T>()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string(), raw)),
            }
        }

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        // Outside development a real signing secret must be supplied.
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(v) => v,
            Err(_) if app_env == "development" => "dev_jwt_secret".into(),
            Err(_) => return Err(ConfigError::MissingVar("JWT_SECRET".into())),
        };

        Ok(Self {
            db_host:      env::var("DB_HOST").unwrap_or_else(|_| "localhost".into()),
            db_port:      parse("DB_PORT", 3306)?,
            db_name:      env::var("DB_NAME").unwrap_or_else(|_| "ekele_db".into()),
            db_user:      env::var("DB_USER").unwrap_or_else(|_| "root".into()),
            db_password:  env::var("DB_PASSWORD").unwrap_or_default(),
            db_pool_size: parse("DB_POOL_SIZE", 10)?,

            backend_host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            backend_port: parse("BACKEND_PORT", 3000)?,
            cors_origin:  env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".into()),

            jwt_secret,
            jwt_expiry_hours: parse("JWT_EXPIRY_HOURS", 24 * 7)?,
            hash_time_cost:   parse("HASH_TIME_COST", 2)?,

            app_env,
        })
    }

    #[allow(dead_code)]
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
