use serde_json::Value;
use utoipa::ToSchema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use crate::utils::{errors::InternalError, tabular::Table};

/// Parent value to the child values it unlocks, in first-seen order.
pub type Mappings = IndexMap<String, Vec<String>>;

///
/// The body the vendor expects when creating a dependency mapping.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MappingRequest {
    pub layout_id: String,
    pub parent_id: String,
    pub child_id: String,
    #[schema(value_type = Object)]
    pub mappings: Mappings,
}

impl MappingRequest {
    ///
    /// The total number of parent/child pairs.
    ///
    pub fn pair_count(&self) -> usize {
        self.mappings.values().map(Vec::len).sum()
    }
}

///
/// The query string of the endpoints which take a layout.
///
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutQuery {
    pub layout_id: Option<String>,
}

///
/// The result of folding upload rows into parent -> children.
///
#[derive(Debug, Default, PartialEq)]
pub struct Grouping {
    pub mappings: Mappings,
    pub records_processed: usize,
    pub rows_skipped: usize,
}

///
/// What an upload returns to the caller.
///
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    #[schema(value_type = String)]
    pub status: &'static str,
    pub records_processed: usize,
    pub rows_skipped: usize,
    pub parent_categories: usize,
    #[schema(value_type = Object)]
    pub vendor_response: Value,
}

///
/// Which two columns of a table hold the parent and child values.
///
#[derive(Debug, PartialEq)]
pub struct ColumnSelection {
    pub parent: usize,
    pub child: usize,
}

impl ColumnSelection {
    ///
    /// Locate the columns by header name if specified, otherwise the first two columns are used.
    ///
    pub fn locate(table: &Table, parent_column: Option<&str>, child_column: Option<&str>) -> Result<Self, InternalError> {
        if table.width() < 2 {
            return Err(InternalError::MissingColumns {
                reason: format!("the sheet must contain at least 2 columns but has {}", table.width())
            })
        }

        Ok(ColumnSelection {
            parent: find_column(table, parent_column, 0)?,
            child: find_column(table, child_column, 1)?,
        })
    }
}

fn find_column(table: &Table, name: Option<&str>, position: usize) -> Result<usize, InternalError> {
    match name.map(str::trim).filter(|name| !name.is_empty()) {
        None => Ok(position),
        Some(name) => table.headers.iter()
            .position(|header| header.eq_ignore_ascii_case(name))
            .ok_or(InternalError::MissingColumns { reason: format!("no column named '{}'", name) }),
    }
}

///
/// Fold the table's rows into parent -> children.
///
/// A row is used only when both it's parent and child are non-blank, anything else is skipped and
/// counted. Parents keep the order they were first seen in and so do the children within a parent.
/// Duplicate children are kept.
///
pub fn group_rows(table: &Table, columns: &ColumnSelection) -> Grouping {
    let mut grouping = Grouping::default();

    for row in &table.rows {
        let parent = row.get(columns.parent).map(|value| value.trim()).unwrap_or_default();
        let child = row.get(columns.child).map(|value| value.trim()).unwrap_or_default();

        if parent.is_empty() || child.is_empty() {
            grouping.rows_skipped += 1;
            continue
        }

        grouping.mappings
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());

        grouping.records_processed += 1;
    }

    grouping
}

///
/// An inline JSON upload. Any ids missing from the payload may come from the request parameters.
///
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonUpload {
    layout_id: Option<String>,
    parent_id: Option<String>,
    child_id: Option<String>,
    mappings: Mappings,
}

///
/// The ids an upload can be given as request parameters.
///
#[derive(Debug, Default)]
pub struct UploadIds {
    pub layout_id: Option<String>,
    pub parent_id: Option<String>,
    pub child_id: Option<String>,
}

///
/// Parse and validate an inline json_data payload into a MappingRequest.
///
pub fn parse_json_upload(json_data: &str, ids: &UploadIds) -> Result<MappingRequest, InternalError> {
    let upload: JsonUpload = serde_json::from_str(json_data)
        .map_err(|err| InternalError::InvalidPayload { reason: format!("json_data is not a mapping request: {}", err) })?;

    let request = MappingRequest {
        layout_id: required_id("layoutId", upload.layout_id, &ids.layout_id)?,
        parent_id: required_id("parentId", upload.parent_id, &ids.parent_id)?,
        child_id: required_id("childId", upload.child_id, &ids.child_id)?,
        mappings: upload.mappings,
    };

    if request.mappings.is_empty() {
        return Err(InternalError::InvalidPayload { reason: "mappings is empty".to_string() })
    }

    for (parent, children) in &request.mappings {
        if parent.trim().is_empty() {
            return Err(InternalError::InvalidPayload { reason: "mappings contains a blank parent value".to_string() })
        }

        if children.iter().any(|child| child.trim().is_empty()) {
            return Err(InternalError::InvalidPayload { reason: format!("mappings for '{}' contains a blank child value", parent) })
        }
    }

    Ok(request)
}

fn required_id(name: &str, from_payload: Option<String>, from_params: &Option<String>) -> Result<String, InternalError> {
    from_payload
        .or_else(|| from_params.clone())
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(InternalError::InvalidPayload { reason: format!("{} is required", name) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str)]) -> Table {
        Table {
            headers: vec!["Category".to_string(), "Sub Category".to_string()],
            rows: rows.iter().map(|(parent, child)| vec![parent.to_string(), child.to_string()]).collect(),
        }
    }

    #[test]
    fn test_rows_group_by_parent_and_skip_blanks() {
        let table = table(&[("Parent1", "Child1"), ("Parent1", "Child2"), ("Parent2", "Child3"), ("", "Child4"), ("Parent3", "")]);
        let grouping = group_rows(&table, &ColumnSelection::locate(&table, None, None).unwrap());

        let mut expected = Mappings::new();
        expected.insert("Parent1".to_string(), vec!["Child1".to_string(), "Child2".to_string()]);
        expected.insert("Parent2".to_string(), vec!["Child3".to_string()]);

        assert_eq!(grouping.mappings, expected);
        assert_eq!(grouping.records_processed, 3);
        assert_eq!(grouping.rows_skipped, 2);
    }

    #[test]
    fn test_first_seen_order_and_duplicates_are_kept() {
        let table = table(&[("B", "2"), ("A", "1"), ("B", "1"), ("B", "2"), (" A ", " 3 ")]);
        let grouping = group_rows(&table, &ColumnSelection { parent: 0, child: 1 });

        let keys: Vec<&String> = grouping.mappings.keys().collect();
        assert_eq!(keys, vec!["B", "A"]);
        assert_eq!(grouping.mappings["B"], vec!["2", "1", "2"]);
        assert_eq!(grouping.mappings["A"], vec!["1", "3"]);
        assert_eq!(grouping.records_processed, 5);
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let mut table = table(&[("A", "1")]);
        table.rows.push(vec!["B".to_string()]);
        let grouping = group_rows(&table, &ColumnSelection { parent: 0, child: 1 });
        assert_eq!(grouping.records_processed, 1);
        assert_eq!(grouping.rows_skipped, 1);
    }

    #[test]
    fn test_columns_can_be_located_by_name() {
        let mut table = table(&[]);
        table.headers.insert(0, "Notes".to_string());
        let columns = ColumnSelection::locate(&table, Some("category"), Some("Sub Category")).unwrap();
        assert_eq!(columns, ColumnSelection { parent: 1, child: 2 });
    }

    #[test]
    fn test_unknown_column_name_is_missing_columns() {
        let table = table(&[]);
        assert!(matches!(ColumnSelection::locate(&table, Some("Status"), None), Err(InternalError::MissingColumns { .. })));
    }

    #[test]
    fn test_single_column_table_is_missing_columns() {
        let table = Table { headers: vec!["Only".to_string()], rows: vec![vec!["x".to_string()]] };
        assert!(matches!(ColumnSelection::locate(&table, None, None), Err(InternalError::MissingColumns { .. })));
    }

    #[test]
    fn test_json_upload_counts_every_pair() {
        let request = parse_json_upload(r#"{
            "layoutId": "L1",
            "parentId": "P1",
            "childId": "C1",
            "mappings": { "Hardware": ["Laptop", "Monitor"], "Software": ["Licence"] }
        }"#, &UploadIds::default()).unwrap();

        assert_eq!(request.layout_id, "L1");
        assert_eq!(request.pair_count(), 3);
        assert_eq!(request.mappings.keys().collect::<Vec<_>>(), vec!["Hardware", "Software"]);
    }

    #[test]
    fn test_json_upload_ids_can_come_from_params() {
        let ids = UploadIds { layout_id: Some("L9".to_string()), parent_id: Some("P9".to_string()), child_id: Some("C9".to_string()) };
        let request = parse_json_upload(r#"{ "layoutId": "L1", "mappings": { "A": ["1"] } }"#, &ids).unwrap();
        assert_eq!(request.layout_id, "L1");
        assert_eq!(request.parent_id, "P9");
        assert_eq!(request.child_id, "C9");
    }

    #[test]
    fn test_malformed_json_uploads_are_invalid_payloads() {
        let ids = UploadIds::default();
        for payload in [
            "not json",
            r#"{ "layoutId": 12, "mappings": ["A", "B"] }"#,
            r#"{ "layoutId": "L1", "parentId": "P1", "childId": "C1", "mappings": { "A": "1" } }"#,
            r#"{ "layoutId": "L1", "parentId": "P1", "childId": "C1", "mappings": {} }"#,
            r#"{ "layoutId": "L1", "parentId": "P1", "childId": "C1", "mappings": { "": ["1"] } }"#,
            r#"{ "layoutId": "L1", "parentId": "P1", "childId": "C1", "mappings": { "A": [" "] } }"#,
            r#"{ "parentId": "P1", "childId": "C1", "mappings": { "A": ["1"] } }"#,
        ] {
            assert!(matches!(parse_json_upload(payload, &ids), Err(InternalError::InvalidPayload { .. })), "{}", payload);
        }
    }
}
