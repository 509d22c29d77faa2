use actix_web::{HttpResponse, http::StatusCode};
use crate::utils::{context::RequestContext, errors::InternalError};

///
/// Allow support staff to view the current configuration of the system. Any seeded access token
/// is never serialised.
///
pub async fn handle(ctx: RequestContext) -> Result<HttpResponse, InternalError> {
    Ok(HttpResponse::build(StatusCode::OK).json(ctx.config()))
}
