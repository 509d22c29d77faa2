use serde_json::Value;
use actix_web::{HttpResponse, http::StatusCode, web::Query};
use super::required_param;
use crate::{clients::desk, model::mapping::LayoutQuery, utils::{context::RequestContext, errors::InternalError}};

///
/// Http handler for listing the fields of a layout that can take part in a mapping.
///
#[utoipa::path(
    get,
    path = "/available-fields",
    operation_id = "get_available_fields",
    params(
        ("layoutId" = String, Query, description = "The layout to list fields for"),
    ),
    responses(
        (status = 200, description = "The vendor's field list, as returned by the vendor"),
        (status = 400, description = "layoutId is missing"),
        (status = 401, description = "Credentials missing or the token is invalid"),
        (status = 404, description = "The layout wasn't found"),
        (status = 502, description = "The vendor returned an error"),
    ),
    tag = "Mappings"
)]
#[tracing::instrument(name="get_available_fields", skip(ctx), level="info")]
pub async fn handle(query: Query<LayoutQuery>, ctx: RequestContext)
    -> Result<HttpResponse, InternalError> {

    Ok(HttpResponse::build(StatusCode::OK)
        .json(get_available_fields(query.layout_id.as_deref(), &ctx).await?))
}

///
/// The layout is checked before anything else - without it there's no point talking to the vendor.
///
pub async fn get_available_fields(layout_id: Option<&str>, ctx: &RequestContext)
    -> Result<Value, InternalError> {

    let layout_id = required_param("layoutId", layout_id)?;
    let session = desk::authorised_session(ctx).await?;
    desk::list_available_fields(layout_id, &session, ctx).await
}
