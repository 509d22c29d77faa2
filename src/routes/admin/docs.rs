use utoipa::OpenApi;
use utoipa::openapi::{self, server::Server};
use actix_web::{HttpResponse, http::{StatusCode, header::ContentType}};
use crate::{model::{credentials::{AuthRequest, AuthStatus}, mapping::{MappingRequest, UploadResult}}, utils::{context::RequestContext, errors::InternalError}};

pub const TITLE: &str = "Zoho Dependency Mapping API";
pub const DEVELOPER: &str = "Dependency Mapping Tools";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Zoho Dependency Mapping API",
        description = "Manage Zoho Desk dependency mappings and bulk-create them from spreadsheets."
    ),
    paths(
        super::health::handle_liveness,
        super::health::handle,
        crate::routes::set_auth::handle,
        crate::routes::get_auth_status::handle,
        crate::routes::get_mappings::handle,
        crate::routes::get_available_fields::handle,
        crate::routes::update_mapping::handle,
        crate::routes::delete_mapping::handle,
        crate::routes::upload_mappings::handle,
    ),
    components(schemas(AuthRequest, AuthStatus, MappingRequest, UploadResult)),
    tags(
        (name = "Auth", description = "Vendor credentials"),
        (name = "Mappings", description = "Read, update and delete dependency mappings"),
        (name = "Upload", description = "Create a dependency mapping from a spreadsheet or JSON"),
        (name = "Health", description = "Liveness and readiness"),
    )
)]
pub struct ApiDoc;

///
/// The OpenAPI document, with the server set to the configured base url.
///
pub fn document(base_url: &str) -> openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let base_url = base_url.trim_end_matches('/');

    if !base_url.is_empty() {
        doc.servers = Some(vec!(Server::new(base_url)));
    }

    doc
}

pub async fn handle_openapi(ctx: RequestContext) -> Result<HttpResponse, InternalError> {
    Ok(HttpResponse::build(StatusCode::OK).json(document(&ctx.config().base_url)))
}

///
/// A Swagger UI page which loads the OpenAPI document from this service.
///
pub async fn handle_docs(ctx: RequestContext) -> Result<HttpResponse, InternalError> {
    Ok(HttpResponse::build(StatusCode::OK)
        .insert_header(ContentType::html())
        .body(swagger_page(&ctx.config().base_url)))
}

fn swagger_page(base_url: &str) -> String {
    let document_url = format!("{}/openapi.json", base_url.trim_end_matches('/'));

    format!(r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>{title}</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
  <style>
    footer {{ text-align: center; padding: 16px; font-family: sans-serif; color: #555; }}
  </style>
</head>
<body>
  <div id="swagger-ui"></div>
  <footer>Developed by {developer}</footer>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {{
      window.ui = SwaggerUIBundle({{ url: "{document_url}", dom_id: "#swagger-ui" }});
    }};
  </script>
</body>
</html>
"##,
        title = TITLE,
        developer = DEVELOPER,
        document_url = document_url)
}
