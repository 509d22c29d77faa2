use serde::Serialize;
use serde_json::json;
use actix_web::{HttpResponse, http::StatusCode};
use crate::{clients::desk::{self, DeskSession}, utils::{context::RequestContext, errors::InternalError}};

pub const RUNNING: &str = "Zoho Dependency Mapping Tool Running";

#[derive(Serialize)]
struct Health {
    healthy: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>
}

///
/// Liveness - the process is up and serving requests.
///
#[utoipa::path(
    get,
    path = "/",
    operation_id = "health_check",
    responses(
        (status = 200, description = "The service is running"),
    ),
    tag = "Health"
)]
pub async fn handle_liveness() -> HttpResponse {
    HttpResponse::build(StatusCode::OK).json(json!({ "status": RUNNING }))
}

///
/// Readiness - credentials are configured and the vendor accepts the token.
///
#[utoipa::path(
    get,
    path = "/health",
    operation_id = "readiness",
    responses(
        (status = 200, description = "Credentials are configured and the vendor accepts them"),
        (status = 503, description = "Credentials are missing or the vendor is rejecting them"),
    ),
    tag = "Health"
)]
#[tracing::instrument(name="readiness", skip(ctx), level="debug")]
pub async fn handle(ctx: RequestContext) -> Result<HttpResponse, InternalError> {
    let vendor = vendor_health(&ctx).await;

    let status = match vendor.healthy {
        true  => StatusCode::OK,
        false => StatusCode::SERVICE_UNAVAILABLE,
    };

    Ok(HttpResponse::build(status).json(json!(
        {
            "Credentials": ctx.credentials().status(),
            "Vendor": vendor
        }
    )))
}

async fn vendor_health(ctx: &RequestContext) -> Health {
    let session = match DeskSession::from_context(ctx) {
        Ok(session) => session,
        Err(err) => return Health { healthy: false, message: Some(err.to_string()) },
    };

    match desk::validate_token(&session, ctx).await {
        Ok(_) => Health { healthy: true, message: None },
        Err(err) => Health { healthy: false, message: Some(err.to_string()) },
    }
}
