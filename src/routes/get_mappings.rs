use serde_json::Value;
use actix_web::{HttpResponse, http::StatusCode, web::Query};
use super::optional_param;
use crate::{clients::desk, model::mapping::LayoutQuery, utils::{context::RequestContext, errors::InternalError}};

///
/// Http handler for listing the dependency mappings, optionally for a single layout.
///
#[utoipa::path(
    get,
    path = "/mappings",
    operation_id = "get_mappings",
    params(
        ("layoutId" = Option<String>, Query, description = "Only return mappings for this layout"),
    ),
    responses(
        (status = 200, description = "The vendor's mapping list, as returned by the vendor"),
        (status = 401, description = "Credentials missing or the token is invalid"),
        (status = 502, description = "The vendor returned an error"),
    ),
    tag = "Mappings"
)]
#[tracing::instrument(name="get_mappings", skip(ctx), level="info")]
pub async fn handle(query: Query<LayoutQuery>, ctx: RequestContext)
    -> Result<HttpResponse, InternalError> {

    Ok(HttpResponse::build(StatusCode::OK)
        .json(get_mappings(optional_param(&query.layout_id), &ctx).await?))
}

pub async fn get_mappings(layout_id: Option<&str>, ctx: &RequestContext)
    -> Result<Value, InternalError> {

    let session = desk::authorised_session(ctx).await?;
    desk::list_mappings(layout_id, &session, ctx).await
}
