use tracing::info;
use serde_json::json;
use actix_web::{HttpResponse, http::StatusCode, web::Json};
use crate::{clients::desk::{self, DeskSession}, model::credentials::{AuthRequest, AuthStatus, validate_auth_request}, utils::{context::RequestContext, errors::InternalError}};

///
/// Http handler for storing the vendor credentials.
///
#[utoipa::path(
    post,
    path = "/auth",
    operation_id = "set_auth",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Credentials stored, the token is valid"),
        (status = 400, description = "Unsupported domain or missing orgId/accessToken"),
        (status = 401, description = "The token was rejected by the vendor"),
        (status = 503, description = "The vendor could not be reached"),
    ),
    tag = "Auth"
)]
#[tracing::instrument(name="set_auth", skip(request, ctx), level="info")]
pub async fn handle(request: Json<AuthRequest>, ctx: RequestContext)
    -> Result<HttpResponse, InternalError> {

    let status = set_credentials(request.into_inner(), &ctx).await?;

    Ok(HttpResponse::build(StatusCode::OK).json(json!({
        "message": format!("Credentials stored successfully for domain '{}'. Token is valid.", status.domain),
        "configured": status.configured,
        "domain": status.domain,
    })))
}

///
/// Validate the credentials, check the token against the vendor and only then replace the stored
/// credentials. Nothing is stored if any step fails.
///
pub async fn set_credentials(request: AuthRequest, ctx: &RequestContext)
    -> Result<AuthStatus, InternalError> {

    let credentials = validate_auth_request(&request, &ctx.config().default_domain)?;

    let session = DeskSession::from_credentials(&credentials, ctx)?;
    desk::validate_token(&session, ctx).await?;

    ctx.credentials().set(credentials);

    let status = ctx.credentials().status();
    info!("Credentials stored for domain {}", status.domain);
    Ok(status)
}
