use serde_json::Value;
use actix_web::{HttpResponse, http::StatusCode, web::{Json, Path}};
use super::path_id;
use crate::{clients::desk, utils::{context::RequestContext, errors::InternalError}};

///
/// Http handler for updating a dependency mapping.
///
/// The body is the mapping itself - parent value to child values - and is sent to the vendor
/// as the mapping's new "mappings".
///
#[utoipa::path(
    patch,
    path = "/mappings/{mappingId}",
    operation_id = "update_mapping",
    params(
        ("mappingId" = String, Path, description = "The vendor's mapping id"),
    ),
    responses(
        (status = 200, description = "The updated mapping, as returned by the vendor"),
        (status = 400, description = "The body isn't a JSON object"),
        (status = 401, description = "Credentials missing or the token is invalid"),
        (status = 404, description = "The mapping wasn't found"),
        (status = 502, description = "The vendor returned an error"),
    ),
    tag = "Mappings"
)]
#[tracing::instrument(name="update_mapping", skip(mappings, ctx), level="info")]
pub async fn handle(mapping_id: Path<String>, mappings: Json<Value>, ctx: RequestContext)
    -> Result<HttpResponse, InternalError> {

    let updated = update_mapping(&mapping_id, &mappings, &ctx).await?;

    Ok(HttpResponse::build(StatusCode::OK).json(updated))
}

pub async fn update_mapping(mapping_id: &str, mappings: &Value, ctx: &RequestContext)
    -> Result<Value, InternalError> {

    let mapping_id = path_id("mappingId", mapping_id)?;

    if !mappings.is_object() {
        return Err(InternalError::InvalidPayload { reason: "the body must be a JSON object of parent value to child values".to_string() })
    }

    let session = desk::authorised_session(ctx).await?;
    desk::update_mapping(mapping_id, mappings, &session, ctx).await
}
