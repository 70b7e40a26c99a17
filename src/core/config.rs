use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_size: usize,
    /// Absolute base used when rendering image/thumbnail/link URLs,
    /// e.g. "https://img.example.com"
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HS256 shared secret. Tokens are minted by an external identity
    /// service; this service only validates them.
    pub jwt_secret: String,
    pub jwt_leeway: Duration,
}

/// Local media storage configuration
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory where uploaded originals and cached thumbnails live
    pub root: String,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            media: MediaConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size = env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Self::DEFAULT_MAX_UPLOAD_SIZE);

        let base_url = env::var("APP_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port))
            .trim_end_matches('/')
            .to_string();

        Ok(AppConfig {
            host,
            port,
            cors_allowed_origins,
            max_upload_size,
            base_url,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(DatabaseConfig {
            url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            min_connections: env_or("DATABASE_MIN_CONNECTIONS", 1)?,
            acquire_timeout_secs: env_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?,
            idle_timeout_secs: env_or("DATABASE_IDLE_TIMEOUT_SECS", 600)?,
            max_lifetime_secs: env_or("DATABASE_MAX_LIFETIME_SECS", 1800)?,
        })
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;
        let leeway_secs: u64 = env_or("JWT_LEEWAY_SECS", 30)?;

        Ok(AuthConfig {
            jwt_secret,
            jwt_leeway: Duration::from_secs(leeway_secs),
        })
    }
}

impl MediaConfig {
    pub fn from_env() -> Result<Self, String> {
        let root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
        Ok(MediaConfig { root })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(SwaggerConfig {
            title: env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Picstash API".to_string()),
            version: env::var("SWAGGER_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            description: env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
                "Multi-tenant image hosting with plan-gated views and expiring links".to_string()
            }),
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|e| format!("Invalid {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
