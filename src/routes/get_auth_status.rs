use actix_web::{HttpResponse, http::StatusCode};
use crate::{model::credentials::AuthStatus, utils::{context::RequestContext, errors::InternalError}};

///
/// Http handler reporting whether credentials have been configured. Makes no vendor calls.
///
#[utoipa::path(
    get,
    path = "/auth/status",
    operation_id = "get_auth_status",
    responses(
        (status = 200, description = "The credential status", body = AuthStatus),
    ),
    tag = "Auth"
)]
pub async fn handle(ctx: RequestContext) -> Result<HttpResponse, InternalError> {
    Ok(HttpResponse::build(StatusCode::OK).json(ctx.credentials().status()))
}
