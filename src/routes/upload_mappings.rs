use tracing::info;
use serde::Deserialize;
use futures::TryStreamExt;
use std::collections::HashMap;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, http::StatusCode, web::{self, Query}};
use super::{optional_param, required_param};
use crate::clients::desk;
use crate::model::mapping::{ColumnSelection, MappingRequest, UploadIds, UploadResult, group_rows, parse_json_upload};
use crate::utils::{context::RequestContext, errors::InternalError, tabular::{SpreadsheetReader, Table, TabularReader}};

/// The multipart field holding the spreadsheet.
pub const FILE_FIELD: &str = "file";

/// The multipart field holding an inline mapping request.
pub const JSON_FIELD: &str = "json_data";

///
/// The upload's parameters. Each can be a query parameter or a multipart text field.
///
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    pub layout_id: Option<String>,
    pub parent_id: Option<String>,
    pub child_id: Option<String>,
    pub parent_column: Option<String>,
    pub child_column: Option<String>,
}

impl UploadParams {
    ///
    /// Any multipart text field overrides the query parameter of the same name.
    ///
    fn merge(self, fields: &HashMap<String, String>) -> Self {
        let pick = |name: &str, current: Option<String>| fields.get(name).cloned().or(current);

        UploadParams {
            layout_id: pick("layoutId", self.layout_id),
            parent_id: pick("parentId", self.parent_id),
            child_id: pick("childId", self.child_id),
            parent_column: pick("parentColumn", self.parent_column),
            child_column: pick("childColumn", self.child_column),
        }
    }

    fn ids(&self) -> UploadIds {
        UploadIds {
            layout_id: optional_param(&self.layout_id).map(str::to_string),
            parent_id: optional_param(&self.parent_id).map(str::to_string),
            child_id: optional_param(&self.child_id).map(str::to_string),
        }
    }
}

#[derive(Debug)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

///
/// The parts of a multipart upload we care about.
///
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub json_data: Option<String>,
    pub fields: HashMap<String, String>,
}

///
/// A mapping request ready to send with the counts to report back.
///
#[derive(Debug, PartialEq)]
pub struct PreparedUpload {
    pub request: MappingRequest,
    pub records_processed: usize,
    pub rows_skipped: usize,
}

///
/// Http handler for uploading a spreadsheet (or inline JSON) of parent/child values and creating a
/// dependency mapping from it.
///
#[utoipa::path(
    post,
    path = "/dependency/upload",
    operation_id = "upload_mappings",
    description = "Multipart upload with either a `file` part (a spreadsheet with at least two columns - Parent & Child) \
                   or a `json_data` part (a mapping request). Parameters may also be sent as multipart text fields.",
    params(
        ("layoutId" = String, Query, description = "The vendor layout id"),
        ("parentId" = Option<String>, Query, description = "Parent field id, defaults to the parent column's header"),
        ("childId" = Option<String>, Query, description = "Child field id, defaults to the child column's header"),
        ("parentColumn" = Option<String>, Query, description = "Header of the parent column, defaults to the first column"),
        ("childColumn" = Option<String>, Query, description = "Header of the child column, defaults to the second column"),
    ),
    responses(
        (status = 200, description = "The mapping was created", body = UploadResult),
        (status = 400, description = "Missing parameters or an invalid file or payload"),
        (status = 401, description = "Credentials missing or the token is invalid"),
        (status = 502, description = "The vendor returned an error"),
    ),
    tag = "Upload"
)]
#[tracing::instrument(name="upload_mappings", skip(payload, ctx), level="info")]
pub async fn handle(query: Query<UploadParams>, payload: Multipart, ctx: RequestContext)
    -> Result<HttpResponse, InternalError> {

    let form = read_form(payload, ctx.config().max_upload_bytes).await?;
    let params = query.into_inner().merge(&form.fields);

    let result = upload_mappings(params, form, &ctx).await?;

    Ok(HttpResponse::build(StatusCode::OK).json(result))
}

///
/// Validate the upload and turn it into a mapping request, check the token, then create the
/// mapping at the vendor.
///
pub async fn upload_mappings(params: UploadParams, form: UploadForm, ctx: &RequestContext)
    -> Result<UploadResult, InternalError> {

    let prepared = match (form.file, form.json_data) {
        (Some(file), None) => {
            required_param("layoutId", params.layout_id.as_deref())?;
            let table = read_table(SpreadsheetReader, file).await?;
            prepare_from_table(&params, &table)?
        },
        (None, Some(json_data)) => prepare_from_json(&params, &json_data)?,
        (Some(_), Some(_)) => return Err(InternalError::InvalidPayload { reason: format!("supply either {} or {}, not both", FILE_FIELD, JSON_FIELD) }),
        (None, None) => return Err(InternalError::InvalidPayload { reason: format!("a {} or {} is required", FILE_FIELD, JSON_FIELD) }),
    };

    let session = desk::authorised_session(ctx).await?;
    let vendor_response = desk::create_mapping(&prepared.request, &session, ctx).await?;

    info!("Created dependency mapping for layout {} from {} records ({} skipped)",
        prepared.request.layout_id,
        prepared.records_processed,
        prepared.rows_skipped);

    Ok(UploadResult {
        status: "success",
        records_processed: prepared.records_processed,
        rows_skipped: prepared.rows_skipped,
        parent_categories: prepared.request.mappings.len(),
        vendor_response,
    })
}

///
/// Spreadsheet parsing is CPU-bound so it's moved off the worker thread.
///
async fn read_table<R>(reader: R, file: UploadedFile) -> Result<Table, InternalError>
where
    R: TabularReader + Send + 'static
{
    let filename = file.filename.unwrap_or_default();
    let table = web::block(move || reader.read(&file.bytes)).await??;
    info!("Read {} rows from '{}'", table.rows.len(), filename);
    Ok(table)
}

///
/// Build the mapping request from the sheet. Field ids not specified default to the column
/// headers.
///
pub fn prepare_from_table(params: &UploadParams, table: &Table) -> Result<PreparedUpload, InternalError> {
    let layout_id = required_param("layoutId", params.layout_id.as_deref())?;

    let columns = ColumnSelection::locate(table, optional_param(&params.parent_column), optional_param(&params.child_column))?;
    let grouping = group_rows(table, &columns);

    if grouping.records_processed == 0 {
        return Err(InternalError::InvalidFile { reason: "the sheet contains no rows with both a parent and child value".to_string() })
    }

    let parent_id = optional_param(&params.parent_id).or(Some(table.headers[columns.parent].as_str()));
    let child_id = optional_param(&params.child_id).or(Some(table.headers[columns.child].as_str()));

    Ok(PreparedUpload {
        request: MappingRequest {
            layout_id: layout_id.to_string(),
            parent_id: required_param("parentId", parent_id)?.to_string(),
            child_id: required_param("childId", child_id)?.to_string(),
            mappings: grouping.mappings,
        },
        records_processed: grouping.records_processed,
        rows_skipped: grouping.rows_skipped,
    })
}

pub fn prepare_from_json(params: &UploadParams, json_data: &str) -> Result<PreparedUpload, InternalError> {
    let request = parse_json_upload(json_data, &params.ids())?;

    Ok(PreparedUpload {
        records_processed: request.pair_count(),
        rows_skipped: 0,
        request,
    })
}

///
/// Read the multipart stream. Unknown parts are read and kept as text fields.
///
async fn read_form(mut payload: Multipart, limit: usize) -> Result<UploadForm, InternalError> {
    let mut form = UploadForm::default();
    let mut total = 0;

    while let Some(mut field) = payload.try_next().await? {
        let (name, filename) = match field.content_disposition() {
            Some(disposition) => (
                disposition.get_name().unwrap_or_default().to_string(),
                disposition.get_filename().map(str::to_string)),
            None => (String::default(), None),
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            total += chunk.len();
            if total > limit {
                return Err(InternalError::InvalidFile { reason: format!("the upload exceeds {} bytes", limit) })
            }
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            FILE_FIELD => {
                // Forms post an empty, nameless part when no file was chosen.
                let chosen = filename.as_deref().map(|name| !name.is_empty()).unwrap_or(false);
                if chosen || !bytes.is_empty() {
                    form.file = Some(UploadedFile { filename, bytes });
                }
            },
            JSON_FIELD => {
                let text = field_text(JSON_FIELD, bytes)?;
                if !text.trim().is_empty() {
                    form.json_data = Some(text);
                }
            },
            _ => {
                let text = field_text(&name, bytes)?;
                form.fields.insert(name, text);
            },
        }
    }

    Ok(form)
}

fn field_text(name: &str, bytes: Vec<u8>) -> Result<String, InternalError> {
    String::from_utf8(bytes).map_err(|_| InternalError::InvalidPayload { reason: format!("{} is not valid UTF-8 text", name) })
}
