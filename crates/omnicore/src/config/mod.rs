use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub upstream: UpstreamConfig,
    pub portal: PortalConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let api_base = ApiBase::parse(
            &env::var("OMNICORE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        )?;
        let public_origin = env::var("OMNICORE_PUBLIC_ORIGIN")
            .unwrap_or_else(|_| DEFAULT_PUBLIC_ORIGIN.to_string());
        let timeout = match env::var("OMNICORE_HTTP_TIMEOUT_SECS") {
            Ok(raw) if !raw.trim().is_empty() => Some(Duration::from_secs(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout)?,
            )),
            _ => None,
        };

        let portal = PortalConfig {
            url: non_empty_var("OMNICORE_PORTAL_URL"),
            anon_key: non_empty_var("OMNICORE_PORTAL_ANON_KEY"),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            upstream: UpstreamConfig {
                api_base,
                public_origin,
                timeout,
            },
            portal,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:5173";

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the Reviews & Search and Commerce services live.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub api_base: ApiBase,
    /// Origin that relative bases resolve against.
    pub public_origin: String,
    pub timeout: Option<Duration>,
}

impl UpstreamConfig {
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        self.api_base.resolve(&self.public_origin, endpoint)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: ApiBase::Absolute(DEFAULT_API_BASE.to_string()),
            public_origin: DEFAULT_PUBLIC_ORIGIN.to_string(),
            timeout: None,
        }
    }
}

/// Managed identity/database backend behind the customer portal.
#[derive(Debug, Clone, Default)]
pub struct PortalConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

/// API base-URL resolution.
///
/// Deployments disagree on where the backend lives, so exactly three shapes are
/// recognized: an absolute override, a relative `/api` reverse proxy on the public
/// origin, or the backend mounted at the root of the public origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiBase {
    Absolute(String),
    RelativeProxy,
    SameOrigin,
}

impl ApiBase {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let value = raw.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("same-origin") {
            return Ok(Self::SameOrigin);
        }
        if value.trim_end_matches('/') == "/api" {
            return Ok(Self::RelativeProxy);
        }
        if value.starts_with("http://") || value.starts_with("https://") {
            // The `/api` segment is appended on resolution.
            let base = value.trim_end_matches('/');
            let base = base.strip_suffix("/api").unwrap_or(base);
            return Ok(Self::Absolute(base.to_string()));
        }
        Err(ConfigError::InvalidApiBase {
            value: value.to_string(),
        })
    }

    pub fn resolve(&self, origin: &str, endpoint: Endpoint) -> String {
        let origin = origin.trim_end_matches('/');
        match self {
            ApiBase::Absolute(base) => format!("{base}/api/{}", endpoint.path()),
            ApiBase::RelativeProxy => format!("{origin}/api/{}", endpoint.path()),
            ApiBase::SameOrigin => format!("{origin}/{}", endpoint.path()),
        }
    }
}

/// Upstream endpoints the adapters call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Search,
    Reviews,
    CheckoutSession,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Search => "search",
            Endpoint::Reviews => "reviews",
            Endpoint::CheckoutSession => "create-checkout-session",
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidApiBase { value: String },
    InvalidTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidApiBase { value } => write!(
                f,
                "OMNICORE_API_BASE '{value}' must be an absolute http(s) URL, '/api' or empty"
            ),
            ConfigError::InvalidTimeout => {
                write!(f, "OMNICORE_HTTP_TIMEOUT_SECS must be a whole number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidApiBase { .. }
            | ConfigError::InvalidTimeout => None,
        }
    }
}
