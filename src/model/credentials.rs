use std::fmt;
use utoipa::ToSchema;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use super::domain;
use crate::utils::{config::Configuration, errors::InternalError};

pub const STATUS_CONFIGURED: &str     = "Credentials configured";
pub const STATUS_NOT_CONFIGURED: &str = "Credentials NOT configured";

///
/// A vendor OAuth access token. It can be read from config and requests but it's Debug output is
/// masked and it can't be serialised, so it won't end up in a log or a response.
///
#[derive(Clone, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: &str) -> Self {
        AccessToken(token.to_string())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(****)")
    }
}

///
/// The API schema for POSTing credentials to /auth.
///
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub org_id: String,
    #[schema(value_type = String)]
    pub access_token: AccessToken,
    pub domain: Option<String>,
}

///
/// The response for /auth/status.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub configured: bool,
    pub domain: String,
    pub status: String,
}

///
/// The credentials all outbound vendor calls are made with.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Credentials {
    pub org_id: Option<String>,
    pub access_token: Option<AccessToken>,
    pub domain: String,
}

impl Credentials {
    ///
    /// Both an org id and a token are needed to call the vendor.
    ///
    pub fn is_configured(&self) -> bool {
        let has_org = self.org_id.as_deref().map(|org_id| !org_id.trim().is_empty()).unwrap_or(false);
        let has_token = self.access_token.as_ref().map(|token| !token.is_blank()).unwrap_or(false);
        has_org && has_token
    }
}

///
/// Holds the current credentials for the lifetime of the process. There is only ever one
/// logical session so concurrent writes are last-write-wins.
///
pub struct CredentialStore {
    inner: RwLock<Credentials>,
}

impl CredentialStore {
    pub fn new(credentials: Credentials) -> Self {
        CredentialStore { inner: RwLock::new(credentials) }
    }

    ///
    /// Seed the store from any ZOHO_ORG_ID, ZOHO_ACCESS_TOKEN and ZOHO_DOMAIN settings.
    ///
    pub fn from_config(config: &Configuration) -> Result<Self, InternalError> {
        let domain = domain::normalise(config.zoho_domain.as_deref(), &config.default_domain)?;

        Ok(CredentialStore::new(Credentials {
            org_id: config.zoho_org_id.clone(),
            access_token: config.zoho_access_token.clone(),
            domain,
        }))
    }

    ///
    /// Replace the stored credentials wholesale.
    ///
    pub fn set(&self, credentials: Credentials) {
        *self.inner.write() = credentials;
    }

    pub fn snapshot(&self) -> Credentials {
        self.inner.read().clone()
    }

    pub fn status(&self) -> AuthStatus {
        let credentials = self.inner.read();
        let configured = credentials.is_configured();

        AuthStatus {
            configured,
            domain: credentials.domain.clone(),
            status: match configured {
                true  => STATUS_CONFIGURED.to_string(),
                false => STATUS_NOT_CONFIGURED.to_string(),
            },
        }
    }
}

///
/// Check the incoming request and turn it into a full set of credentials. Nothing is stored here.
///
pub fn validate_auth_request(request: &AuthRequest, default_domain: &str) -> Result<Credentials, InternalError> {
    let domain = domain::normalise(request.domain.as_deref(), default_domain)?;

    if request.org_id.trim().is_empty() {
        return Err(InternalError::MissingParameter { name: "orgId".to_string() })
    }

    if request.access_token.is_blank() {
        return Err(InternalError::MissingParameter { name: "accessToken".to_string() })
    }

    Ok(Credentials {
        org_id: Some(request.org_id.trim().to_string()),
        access_token: Some(AccessToken::new(request.access_token.secret().trim())),
        domain,
    })
}
