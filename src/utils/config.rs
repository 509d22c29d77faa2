use std::fmt::Write;
use ansi_term::Colour;
use std::env::VarError;
use config::ConfigError;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use super::errors::{self, InternalError};
use crate::model::{credentials::AccessToken, domain};

lazy_static! {
    /// For those terms that don't support ansi colour set USE_COLOUR to false.
    pub static ref USE_COLOUR: bool = std::env::var("USE_COLOUR")
        .unwrap_or_default()
        .to_lowercase() == "true";

    static ref COLON: String = match *USE_COLOUR {
        true  => Colour::Yellow.paint(":").to_string(),
        false => String::from(":"),
    };
}

///
/// The service configuration - initialised at start-up.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Configuration {
    pub port: u16,                       // The port to run this service on.
    pub base_url: String,                // The root url to host endpoints on.
    pub vendor_url: String,              // The vendor API base url, {domain} is replaced with the domain code.
    pub default_domain: String,          // The domain code used when none is specified.
    pub auth_scheme: String,             // The scheme prefixed to the access token in the Authorization header.
    pub keep_alive: u64,                 // Allow client connections to be re-used for n seconds.
    pub client_timeout: u64,             // Timeout (seconds) client http connections.
    pub server_timeout: u64,             // Timeout (seconds) downstream http connections to the vendor.
    pub redact_error_messages: bool,     // If true, any error responses to clients will only have a code and no descriptive message.
    pub max_upload_bytes: usize,         // The largest spreadsheet or json upload accepted.

    #[serde(default)]
    pub zoho_org_id: Option<String>,     // Seeds the credential store at start-up.

    #[serde(default, skip_serializing)]
    pub zoho_access_token: Option<AccessToken>, // Seeds the credential store at start-up. Never printed.

    #[serde(default)]
    pub zoho_domain: Option<String>,     // Seeds the credential store at start-up.
}

impl Configuration {
    ///
    /// Load the service's configuration.
    ///
    pub fn from_env() -> Result<Configuration, ConfigError> {
        let cfg = config::Config::builder()
            // Set defaults for settings that were not specified.
            .set_default("auth_scheme", "Zoho-oauthtoken")?
            .set_default("base_url", "")?
            .set_default("client_timeout", 30)?
            .set_default("default_domain", domain::DEFAULT_DOMAIN)?
            .set_default("keep_alive", 15)?
            .set_default("max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("port", 8989)?
            .set_default("redact_error_messages", false)?
            .set_default("server_timeout", 20)?
            .set_default("vendor_url", "https://desk.zoho.{domain}/api/v1")?

            // Merge any environment variables with the same name as the struct fields.
            .add_source(config::Environment::default())
            .build()?;

        let config: Configuration = cfg.try_deserialize()?;
        config.validate()?;

        *errors::REDACT_ERROR_MESSAGES.write() = config.redact_error_messages;

        Ok(config)
    }

    ///
    /// Check the settings which can't be expressed by their types.
    ///
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !domain::is_supported(&self.default_domain) {
            return Err(ConfigError::Message(format!("default_domain '{}' is not one of {}", self.default_domain, domain::supported_list())))
        }

        if !self.vendor_url.contains(domain::PLACEHOLDER) {
            return Err(ConfigError::Message(format!("vendor_url must contain the {} placeholder", domain::PLACEHOLDER)))
        }

        Ok(())
    }

    ///
    /// Pretty-print the config with ansi colours.
    ///
    pub fn fmt_console(&self) -> Result<String, InternalError> {
        // Serialise to JSON so we have fields to iterate.
        let values = serde_json::to_value(&self)?;

        // Turn into a map.
        let values = match values.as_object() {
            Some(values) => values.clone(),
            None => return Err(InternalError::InvalidFormatError { cause: "No config props".to_string() }),
        };

        // Sort by keys.
        let mut sorted: Vec<_> = values.iter().collect();
        sorted.sort_by_key(|a| a.0);

        let mut output = String::new();
        for (k, v) in sorted {
            write!(&mut output, "{:>23}{} {}\n",
                k,
                *COLON,
                v)?;
        }

        Ok(output)
    }
}

///
/// If the specified environment variable is not set for this process, set it to the default value specified.
///
pub fn default_env(key: &str, value: &str) {
    if let Err(VarError::NotPresent) = std::env::var(key) {
        std::env::set_var(key, value);
    }
}
