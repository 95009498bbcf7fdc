use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Connection parameters for the external sandbox compiler service.
#[derive(Debug, Deserialize, Clone)]
pub struct SandboxConfig {
    pub url: String,
    /// Fixed transport margin added to a problem's time limit when waiting
    /// for the sandbox round trip, in milliseconds.
    pub transport_margin_ms: u64,
    /// Maximum number of in-flight sandbox calls while judging one
    /// submission.
    pub max_concurrency: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Default page size for catalog search.
    pub page_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub sandbox: SandboxConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("sandbox.url", "http://127.0.0.1:9000")?
            .set_default("sandbox.transport_margin_ms", 2000)?
            .set_default("sandbox.max_concurrency", 8)?
            .set_default("catalog.page_size", 20)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., JUDGE__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("JUDGE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
