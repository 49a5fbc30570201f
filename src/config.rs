use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub catalog: CatalogConfig,

    pub email: EmailConfig,

    pub admin: AdminConfig,

    pub tasks: TasksConfig,

    pub myanimelist: MyAnimeListConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// `text` or `json`
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/animeon.db".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Host names the service answers for. `*` allows any host.
    pub allowed_hosts: Vec<String>,

    pub cors_allowed_origins: Vec<String>,

    /// Directory uploaded images are written to.
    pub media_root: String,

    /// Public URL prefix for files under `media_root`.
    pub media_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            allowed_hosts: vec!["*".to_string()],
            cors_allowed_origins: vec!["*".to_string()],
            media_root: "media".to_string(),
            media_url: "/media/".to_string(),
        }
    }
}

impl ServerConfig {
    /// First configured host when hosts are restricted.
    #[must_use]
    pub fn primary_host(&self) -> Option<&str> {
        if self.allowed_hosts.iter().any(|h| h == "*") {
            return None;
        }
        self.allowed_hosts.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC key for access and refresh tokens.
    pub secret_key: String,

    pub access_token_lifetime_minutes: i64,

    pub refresh_token_lifetime_minutes: i64,

    /// Argon2 memory cost in KiB
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    /// Cool-down between two public support submissions from one address.
    pub spam_timeout_seconds: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: "super-secure-test-key-1".to_string(),
            access_token_lifetime_minutes: 24 * 60,
            refresh_token_lifetime_minutes: 2 * 24 * 60,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            spam_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Maximum number of anime flagged as TOP at once.
    pub count_top_anime: u64,

    pub anime_page_size: u64,

    pub comment_page_size: u64,

    pub user_anime_page_size: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            count_top_anime: 100,
            anime_page_size: 12,
            comment_page_size: 12,
            user_anime_page_size: 12,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// SMTP relay. Mail is disabled while empty.
    pub host: String,

    pub port: Option<u16>,

    pub username: String,

    pub password: String,

    pub use_tls: bool,

    pub default_from: String,
}

impl EmailConfig {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.host.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,

    pub email: String,

    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: "admin@localhost".to_string(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Queue scheduled commands are delivered to. Scheduling is skipped while empty.
    pub queue_name: String,

    /// Messages fetched per poll (at most 10).
    pub max_messages: u64,

    /// Long-poll duration per receive call.
    pub wait_time_seconds: u64,

    /// How long a received message stays hidden from other consumers.
    pub visibility_timeout_seconds: u64,

    /// How often the dispatcher picks up newly stored schedules.
    pub sync_interval_seconds: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            queue_name: "commands".to_string(),
            max_messages: 10,
            wait_time_seconds: 20,
            visibility_timeout_seconds: 10,
            sync_interval_seconds: 30,
        }
    }
}

impl TasksConfig {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.queue_name.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MyAnimeListConfig {
    pub client_id: String,

    pub client_secret: String,

    pub request_timeout_seconds: u64,

    /// Pause before the single retry after a 429 response.
    pub retry_delay_seconds: u64,
}

impl Default for MyAnimeListConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            request_timeout_seconds: 30,
            retry_delay_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            catalog: CatalogConfig::default(),
            email: EmailConfig::default(),
            admin: AdminConfig::default(),
            tasks: TasksConfig::default(),
            myanimelist: MyAnimeListConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Environment variables win over the file, so deployments can keep
    /// secrets out of `config.toml`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let split = |value: String| -> Vec<String> {
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        };

        if let Some(v) = lookup("DATABASE_URL") {
            self.general.database_path = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.general.log_level = v.to_lowercase();
        }
        if let Some(v) = lookup("SECRET_KEY") {
            self.security.secret_key = v;
        }
        if let Some(v) = lookup("ALLOWED_HOSTS") {
            self.server.allowed_hosts = split(v);
        }
        if let Some(v) = lookup("CORS_ALLOWED_ORIGINS") {
            self.server.cors_allowed_origins = split(v);
        }
        if let Some(v) = lookup("EMAIL_HOST") {
            self.email.host = v;
        }
        if let Some(port) = lookup("EMAIL_PORT").and_then(|v| v.parse().ok()) {
            self.email.port = Some(port);
        }
        if let Some(v) = lookup("EMAIL_HOST_USER") {
            self.email.username = v;
        }
        if let Some(v) = lookup("EMAIL_HOST_PASSWORD") {
            self.email.password = v;
        }
        if let Some(v) = lookup("EMAIL_USE_TLS") {
            self.email.use_tls = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(v) = lookup("DEFAULT_FROM_EMAIL") {
            self.email.default_from = v;
        }
        if let Some(v) = lookup("ADMIN_USERNAME") {
            self.admin.username = v;
        }
        if let Some(v) = lookup("ADMIN_PASSWORD") {
            self.admin.password = v;
        }
        if let Some(v) = lookup("MYAL_CLIENT_ID") {
            self.myanimelist.client_id = v;
        }
        if let Some(v) = lookup("MYAL_CLIENT_SECRET") {
            self.myanimelist.client_secret = v;
        }
        if let Some(v) = lookup("TASKS_QUEUE_NAME") {
            self.tasks.queue_name = v;
        }
        if let Some(count) = lookup("COUNT_TOP_ANIME").and_then(|v| v.parse().ok()) {
            self.catalog.count_top_anime = count;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("animeon").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".animeon").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.secret_key.is_empty() {
            anyhow::bail!("security.secret_key cannot be empty");
        }

        if self.security.access_token_lifetime_minutes <= 0
            || self.security.refresh_token_lifetime_minutes <= 0
        {
            anyhow::bail!("Token lifetimes must be > 0");
        }

        if self.catalog.count_top_anime == 0 {
            anyhow::bail!("catalog.count_top_anime must be > 0");
        }

        if self.tasks.max_messages == 0 || self.tasks.max_messages > 10 {
            anyhow::bail!("tasks.max_messages must be between 1 and 10");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.catalog.count_top_anime, 100);
        assert_eq!(config.security.access_token_lifetime_minutes, 1440);
        assert_eq!(config.security.refresh_token_lifetime_minutes, 2880);
        assert_eq!(config.security.spam_timeout_seconds, 30);
        assert!(!config.email.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[security]"));
        assert!(toml_str.contains("[tasks]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [catalog]
            count_top_anime = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.catalog.count_top_anime, 10);

        assert_eq!(config.tasks.queue_name, "commands");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ALLOWED_HOSTS", "api.example.com, example.com"),
            ("COUNT_TOP_ANIME", "5"),
            ("EMAIL_USE_TLS", "True"),
            ("TASKS_QUEUE_NAME", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.server.primary_host(), Some("api.example.com"));
        assert_eq!(config.catalog.count_top_anime, 5);
        assert!(config.email.use_tls);
        assert!(!config.tasks.is_enabled());
    }

    #[test]
    fn test_validate_rejects_zero_top_limit() {
        let mut config = Config::default();
        config.catalog.count_top_anime = 0;
        assert!(config.validate().is_err());
    }
}
