use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Admin endpoint of the authorization server when nothing else is configured.
pub const DEFAULT_HYDRA_ADMIN_URL: &str = "http://127.0.0.1:4445";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct HydraConfig {
    #[serde(default = "default_admin_url")]
    pub admin_url: String,
    /// Upper bound for every admin API call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HydraConfig {
    fn default() -> Self {
        Self {
            admin_url: default_admin_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginConfig {
    #[serde(default = "default_true")]
    pub remember: bool,
    /// Remember-for sent when the authorization server lets us skip the prompt.
    #[serde(default = "default_skip_remember_for")]
    pub skip_remember_for: u64,
    /// Remember-for sent after an explicit username/password login.
    #[serde(default = "default_credentials_remember_for")]
    pub credentials_remember_for: u64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            remember: true,
            skip_remember_for: default_skip_remember_for(),
            credentials_remember_for: default_credentials_remember_for(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConsentConfig {
    #[serde(default = "default_true")]
    pub remember: bool,
    /// 0 keeps the consent until it is revoked.
    #[serde(default)]
    pub remember_for: u64,
    /// Intersect user-approved scopes and audiences with what the client requested
    /// and take the subject and client from the challenge rather than the form.
    #[serde(default)]
    pub restrict_to_requested: bool,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            remember: true,
            remember_for: 0,
            restrict_to_requested: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoginPageCopy {
    pub page_title: String,
    pub login_label: String,
    pub username_label: String,
    pub password_label: String,
    pub login_button_label: String,
    pub error_message: String,
}

impl Default for LoginPageCopy {
    fn default() -> Self {
        Self {
            page_title: "Sign in".into(),
            login_label: "Login".into(),
            username_label: "Username or email".into(),
            password_label: "Password".into(),
            login_button_label: "Sign in".into(),
            error_message: "Invalid username or password".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ConsentPageCopy {
    pub page_title: String,
    pub authorize_title: String,
    /// `{client}` is replaced with the requesting client.
    pub request_message: String,
    pub granted_access_label: String,
    pub authorize_button_label: String,
    pub deny_button_label: String,
}

impl Default for ConsentPageCopy {
    fn default() -> Self {
        Self {
            page_title: "Authorize application".into(),
            authorize_title: "Authorize".into(),
            request_message: "{client} wants to access your account".into(),
            granted_access_label: "Token audiences".into(),
            authorize_button_label: "Allow".into(),
            deny_button_label: "Deny".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LogoutPageCopy {
    pub page_title: String,
    pub logout_title: String,
    pub logout_button_label: String,
    pub logout_deny_label: String,
}

impl Default for LogoutPageCopy {
    fn default() -> Self {
        Self {
            page_title: "Sign out".into(),
            logout_title: "Do you want to sign out?".into(),
            logout_button_label: "Sign out".into(),
            logout_deny_label: "Stay signed in".into(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PagesConfig {
    #[serde(default)]
    pub login: LoginPageCopy,
    #[serde(default)]
    pub consent: ConsentPageCopy,
    #[serde(default)]
    pub logout: LogoutPageCopy,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub hydra: HydraConfig,
    #[serde(default)]
    pub login: LoginConfig,
    #[serde(default)]
    pub consent: ConsentConfig,
    #[serde(default)]
    pub pages: PagesConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.hydra.admin_url).map_err(|e| {
            ConfigError::Validation(format!(
                "hydra.admin_url '{}' is not a valid URL: {e}",
                self.hydra.admin_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(
                "hydra.admin_url must use http or https".into(),
            ));
        }
        if self.hydra.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "hydra.timeout_secs must be > 0".into(),
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Validation("database_url must be set".into()));
        }
        Ok(())
    }
}

fn default_admin_url() -> String {
    DEFAULT_HYDRA_ADMIN_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_skip_remember_for() -> u64 {
    3600
}

fn default_credentials_remember_for() -> u64 {
    20
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

/// Load application configuration from an optional `config.yaml` + environment overrides.
///
/// Any variable matching the key path separated by double underscores (e.g.
/// `HYDRA__TIMEOUT_SECS`) overrides the file value. `HYDRA_BASE_URL` is honoured
/// as a shorthand for `hydra.admin_url` and wins over both.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml").required(false))
        .add_source(Environment::default().separator("__"))
        .set_override_option("hydra.admin_url", std::env::var("HYDRA_BASE_URL").ok())?
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
