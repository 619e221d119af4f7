use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub membership: MembershipConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
    /// Demo deployments run on in-memory stores and never consult the
    /// membership service.
    Demo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Where browser clients are sent when session auth fails.
    pub login_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

/// Everything the membership gate needs, resolved once at startup and
/// injected into the gate. The gate never reads the process environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipConfig {
    /// Demo deployments skip the gate entirely.
    pub demo_mode: bool,
    /// Absence of the service key disables the gate entirely.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Paths exempt from gating regardless of any other condition.
    /// Compared without a leading slash.
    pub exempt_paths: Vec<String>,
}

impl MembershipConfig {
    pub fn exempt_route_trio() -> Vec<String> {
        vec![
            "api/v1/auth/login".to_string(),
            "api/v1/auth/register-company".to_string(),
            "api/v1/auth/forgot-password".to_string(),
        ]
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            Ok("demo") => Environment::Demo,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
            Environment::Demo => Self::demo(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("LOGIN_PATH") {
            self.server.login_path = v;
        }

        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }

        if let Ok(v) = env::var("MEMBERSHIP_API_KEY") {
            self.membership.api_key = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("MEMBERSHIP_BASE_URL") {
            self.membership.base_url = v;
        }

        self
    }

    fn base(environment: Environment) -> Self {
        let demo_mode = environment == Environment::Demo;
        Self {
            environment,
            server: ServerConfig {
                port: 3000,
                login_path: "/login".to_string(),
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            membership: MembershipConfig {
                demo_mode,
                api_key: None,
                base_url: "https://members.example.com/api".to_string(),
                exempt_paths: MembershipConfig::exempt_route_trio(),
            },
        }
    }

    fn development() -> Self {
        Self::base(Environment::Development)
    }

    fn demo() -> Self {
        Self::base(Environment::Demo)
    }

    fn staging() -> Self {
        let mut config = Self::base(Environment::Staging);
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config
    }

    fn production() -> Self {
        let mut config = Self::base(Environment::Production);
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
