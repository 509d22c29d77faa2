use tracing::info;
use serde_json::json;
use actix_web::{HttpResponse, http::StatusCode, web::Path};
use super::path_id;
use crate::{clients::desk, utils::{context::RequestContext, errors::InternalError}};

///
/// Http handler for deleting a dependency mapping.
///
#[utoipa::path(
    delete,
    path = "/mappings/{mappingId}",
    operation_id = "delete_mapping",
    params(
        ("mappingId" = String, Path, description = "The vendor's mapping id"),
    ),
    responses(
        (status = 200, description = "The mapping was deleted"),
        (status = 401, description = "Credentials missing or the token is invalid"),
        (status = 404, description = "The mapping wasn't found"),
        (status = 502, description = "The vendor returned an error"),
    ),
    tag = "Mappings"
)]
#[tracing::instrument(name="delete_mapping", skip(ctx), level="info")]
pub async fn handle(mapping_id: Path<String>, ctx: RequestContext)
    -> Result<HttpResponse, InternalError> {

    delete_mapping(&mapping_id, &ctx).await?;

    Ok(HttpResponse::build(StatusCode::OK).json(json!({
        "message": "Dependency Mapping Deleted Successfully"
    })))
}

pub async fn delete_mapping(mapping_id: &str, ctx: &RequestContext)
    -> Result<(), InternalError> {

    let mapping_id = path_id("mappingId", mapping_id)?;
    let session = desk::authorised_session(ctx).await?;
    desk::delete_mapping(mapping_id, &session, ctx).await?;

    info!("Dependency mapping {} deleted", mapping_id);
    Ok(())
}
