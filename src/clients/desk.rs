use serde_json::{json, Value};
use crate::model::{credentials::{AccessToken, Credentials}, domain, mapping::MappingRequest};
use crate::utils::{context::RequestContext, errors::InternalError, http::{HttpResponse, delete, get, patch, post}};

///
/// Calls to the vendor's helpdesk REST API.
///
/// Every call is made with a DeskSession - a snapshot of the stored credentials - so a concurrent
/// /auth can't change the credentials half-way through a request.
///

pub const ORG_ID_HEADER: &str = "orgId";

///
/// The resolved base url and the credentials to call it with.
///
#[derive(Clone, Debug)]
pub struct DeskSession {
    base_url: String,
    org_id: String,
    access_token: AccessToken,
}

impl DeskSession {
    ///
    /// Build a session from the credential store. No network call is made.
    ///
    pub fn from_context(ctx: &RequestContext) -> Result<Self, InternalError> {
        Self::from_credentials(&ctx.credentials().snapshot(), ctx)
    }

    ///
    /// Build a session from the credentials specified, which needn't be stored yet.
    ///
    pub fn from_credentials(credentials: &Credentials, ctx: &RequestContext) -> Result<Self, InternalError> {
        if !credentials.is_configured() {
            return Err(InternalError::MissingCredentials)
        }

        let (org_id, access_token) = match (&credentials.org_id, &credentials.access_token) {
            (Some(org_id), Some(access_token)) => (org_id.clone(), access_token.clone()),
            _ => return Err(InternalError::MissingCredentials),
        };

        let config = ctx.config();
        let base_url = domain::resolve_base_url(&config.vendor_url, Some(&credentials.domain), &config.default_domain)?;

        Ok(DeskSession { base_url, org_id, access_token })
    }

    ///
    /// The auth headers every vendor call needs.
    ///
    pub fn headers(&self, ctx: &RequestContext) -> Vec<(&'static str, String)> {
        vec!(
            ("authorization", format!("{} {}", ctx.config().auth_scheme, self.access_token.secret())),
            (ORG_ID_HEADER, self.org_id.clone()),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

///
/// Build a session and check it's token is still live. Used in front of every protected operation.
///
pub async fn authorised_session(ctx: &RequestContext) -> Result<DeskSession, InternalError> {
    let session = DeskSession::from_context(ctx)?;
    validate_token(&session, ctx).await?;
    Ok(session)
}

///
/// Make a cheap, read-only call to the vendor to confirm the token is accepted.
///
#[tracing::instrument(name="validate_token", skip(session, ctx), level="debug")]
pub async fn validate_token(session: &DeskSession, ctx: &RequestContext) -> Result<(), InternalError> {
    let response = get(session.url("/users"))
        .headers(&session.headers(ctx))
        .send(ctx)
        .await?;

    match response.is_success() {
        true  => Ok(()),
        false => Err(InternalError::InvalidToken { status: response.status(), body: response.text() }),
    }
}

pub async fn list_mappings(layout_id: Option<&str>, session: &DeskSession, ctx: &RequestContext) -> Result<Value, InternalError> {
    let mut request = get(session.url("/dependencyMappings"));
    request.headers(&session.headers(ctx));

    if let Some(layout_id) = layout_id {
        request.query_param("layoutId", layout_id);
    }

    let response = request.send(ctx).await?;
    passthrough(response, "Dependency mappings")
}

pub async fn list_available_fields(layout_id: &str, session: &DeskSession, ctx: &RequestContext) -> Result<Value, InternalError> {
    let response = get(session.url("/availableDependencyMappings"))
        .headers(&session.headers(ctx))
        .query_param("layoutId", layout_id)
        .send(ctx)
        .await?;

    passthrough(response, &format!("Layout {}", layout_id))
}

pub async fn update_mapping(mapping_id: &str, mappings: &Value, session: &DeskSession, ctx: &RequestContext) -> Result<Value, InternalError> {
    let response = patch(session.url(&format!("/dependencyMappings/{}", mapping_id)))
        .headers(&session.headers(ctx))
        .json(&json!({ "mappings": mappings }))
        .send(ctx)
        .await?;

    passthrough(response, &format!("Dependency mapping {}", mapping_id))
}

pub async fn delete_mapping(mapping_id: &str, session: &DeskSession, ctx: &RequestContext) -> Result<(), InternalError> {
    let response = delete(session.url(&format!("/dependencyMappings/{}", mapping_id)))
        .headers(&session.headers(ctx))
        .send(ctx)
        .await?;

    passthrough(response, &format!("Dependency mapping {}", mapping_id)).map(|_| ())
}

pub async fn create_mapping(request: &MappingRequest, session: &DeskSession, ctx: &RequestContext) -> Result<Value, InternalError> {
    let response = post(session.url("/dependencyMappings"))
        .headers(&session.headers(ctx))
        .json(&serde_json::to_value(request)?)
        .send(ctx)
        .await?;

    passthrough(response, &format!("Layout {}", request.layout_id))
}

///
/// Return the vendor's JSON body on success or map the vendor's status onto our errors.
///
fn passthrough(response: HttpResponse, resource: &str) -> Result<Value, InternalError> {
    match response.status() {
        200..=299 => response.json_or_empty(),
        status @ (401 | 403) => Err(InternalError::InvalidToken { status, body: response.text() }),
        404 => Err(InternalError::NotFound { resource: resource.to_string(), body: response.text() }),
        status => Err(InternalError::UpstreamError {
            url: format!("{} {}", response.method(), response.url()),
            status,
            body: response.text(),
        }),
    }
}
