use dotenv::dotenv;
use serde::Deserialize;
use std::fmt;

const DEFAULT_DB_HOST: &str = "cluster0.8bgsx7j.mongodb.net";

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mongodb_uri: Option<String>,
    #[serde(default)]
    pub db_user: Option<String>,
    #[serde(default)]
    pub db_pass: Option<String>,
    #[serde(default = "default_db_host")]
    pub db_host: String,
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default)]
    pub stripe_secret_key: String,
    #[serde(default = "default_stripe_api_base")]
    pub stripe_api_base: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_db_host() -> String {
    DEFAULT_DB_HOST.to_string()
}

fn default_db_name() -> String {
    "estatenestDB".to_string()
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl AppConfig {
    /// Reads `.env` (if present) and then the process environment.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        dotenv().ok();
        Self::from_environment(::config::Environment::default())
    }

    /// Values stay strings until serde asks for a number, so credentials such
    /// as `007` keep their leading zeros.
    fn from_environment(env: ::config::Environment) -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    /// Connection string for the document database.
    ///
    /// An explicit `MONGODB_URI` wins; otherwise the Atlas SRV URI is built
    /// from the credential pair.
    pub fn database_uri(&self) -> Result<String, ::config::ConfigError> {
        if let Some(uri) = self.mongodb_uri.as_deref().filter(|u| !u.is_empty()) {
            return Ok(uri.to_string());
        }
        match (self.db_user.as_deref(), self.db_pass.as_deref()) {
            (Some(user), Some(pass)) => Ok(format!(
                "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority&appName=Cluster0",
                user, pass, self.db_host
            )),
            _ => Err(::config::ConfigError::NotFound(
                "MONGODB_URI or DB_USER/DB_PASS".to_string(),
            )),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn redact(value: &Option<String>) -> &'static str {
    match value {
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("mongodb_uri", &redact(&self.mongodb_uri))
            .field("db_user", &self.db_user)
            .field("db_pass", &redact(&self.db_pass))
            .field("db_host", &self.db_host)
            .field("db_name", &self.db_name)
            .field(
                "stripe_secret_key",
                &if self.stripe_secret_key.is_empty() { "<unset>" } else { "<redacted>" },
            )
            .field("stripe_api_base", &self.stripe_api_base)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}
