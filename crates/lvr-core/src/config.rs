//! Service configuration.
//!
//! Resolution order, lowest to highest precedence:
//! 1. compiled defaults
//! 2. TOML file (`--config`, `LVR_CONFIG`, `./lvr.toml`, or
//!    `<config dir>/lvr/config.toml`, first that applies)
//! 3. environment variables
//! 4. command-line flags (applied by the binary)

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::ErrorCode;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub salesforce: SalesforceConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub markets: MarketsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Origin that public projection and tracking URLs are built on.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_base_url: default_public_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// HTTP mail relay. Without `relay_url` mail is logged instead of sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub relay_url: Option<String>,
    #[serde(default)]
    pub relay_token: Option<String>,
    #[serde(default = "default_mail_from")]
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            relay_token: None,
            from: default_mail_from(),
        }
    }
}

/// CRM credentials. The client is disabled unless all of `instance_url`,
/// `client_id` and `client_secret` are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesforceConfig {
    #[serde(default)]
    pub instance_url: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Defaults to `{instance_url}/services/oauth2/token`.
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Lead field that receives the tracking URL.
    #[serde(default = "default_lead_url_field")]
    pub lead_url_field: String,
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            instance_url: None,
            client_id: None,
            client_secret: None,
            token_url: None,
            api_version: default_api_version(),
            lead_url_field: default_lead_url_field(),
        }
    }
}

impl SalesforceConfig {
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.instance_url.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Upper bound on each outbound notification, in seconds.
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_notify_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketsConfig {
    /// JSON file of extra market bundles keyed by market code.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl ServiceConfig {
    /// Parse a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str::<Self>(&content).with_context(|| {
            format!(
                "{}: Failed to parse {}",
                ErrorCode::ConfigParseError.code(),
                path.display()
            )
        })
    }

    /// Apply environment overrides using `lookup` as the variable source.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `LVR_NOTIFY_TIMEOUT_SECS` is not an integer.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("LVR_BIND") {
            self.server.bind = v;
        }
        if let Some(v) = get("PUBLIC_BASE_URL") {
            self.server.public_base_url = v;
        }
        if let Some(v) = get("LVR_DB_PATH") {
            self.storage.db_path = PathBuf::from(v);
        }
        if let Some(v) = get("MAIL_RELAY_URL") {
            self.mail.relay_url = Some(v);
        }
        if let Some(v) = get("MAIL_RELAY_TOKEN") {
            self.mail.relay_token = Some(v);
        }
        if let Some(v) = get("MAIL_FROM") {
            self.mail.from = v;
        }
        if let Some(v) = get("SALESFORCE_INSTANCE_URL") {
            self.salesforce.instance_url = Some(v);
        }
        if let Some(v) = get("SALESFORCE_CLIENT_ID") {
            self.salesforce.client_id = Some(v);
        }
        if let Some(v) = get("SALESFORCE_CLIENT_SECRET") {
            self.salesforce.client_secret = Some(v);
        }
        if let Some(v) = get("SALESFORCE_TOKEN_URL") {
            self.salesforce.token_url = Some(v);
        }
        if let Some(v) = get("LVR_MARKETS_FILE") {
            self.markets.file = Some(PathBuf::from(v));
        }
        if let Some(v) = get("LVR_NOTIFY_TIMEOUT_SECS") {
            self.notify.timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("LVR_NOTIFY_TIMEOUT_SECS must be an integer, got '{v}'"))?;
        }
        Ok(())
    }
}

/// Locate the config file to load, if any.
///
/// An explicit path must exist; the fallbacks are used only when present.
///
/// # Errors
///
/// Returns an error if `explicit` (or `LVR_CONFIG`) names a missing file.
pub fn find_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let requested = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os("LVR_CONFIG").map(PathBuf::from));

    if let Some(path) = requested {
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
        return Ok(Some(path));
    }

    let local = PathBuf::from("lvr.toml");
    if local.exists() {
        return Ok(Some(local));
    }

    Ok(dirs::config_dir()
        .map(|dir| dir.join("lvr/config.toml"))
        .filter(|path| path.exists()))
}

/// Defaults, then the config file, then process environment.
///
/// # Errors
///
/// Returns an error if the config file cannot be found, read or parsed, or an
/// environment override is malformed.
pub fn resolve_config(explicit: Option<&Path>) -> Result<ServiceConfig> {
    let mut config = match find_config_file(explicit)? {
        Some(path) => ServiceConfig::load_file(&path)?,
        None => ServiceConfig::default(),
    };
    config.apply_env(|key| env::var(key).ok())?;
    Ok(config)
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir().map_or_else(
        || PathBuf::from("lvr.sqlite3"),
        |dir| dir.join("lvr").join("lvr.sqlite3"),
    )
}

fn default_mail_from() -> String {
    "LocalVR Projections <projections@golocalvr.com>".to_string()
}

fn default_api_version() -> String {
    "v59.0".to_string()
}

fn default_lead_url_field() -> String {
    "Projection_URL__c".to_string()
}

const fn default_notify_timeout_secs() -> u64 {
    10
}
