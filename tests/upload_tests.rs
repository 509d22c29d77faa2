mod common;

#[cfg(test)]
mod tests {
    use actix_web::test;
    use serde_json::json;
    use mockito::{Matcher, Server};
    use assert_json_diff::assert_json_eq;
    use crate::common::{configured, fixture, http::post, mock_no_calls, mock_token_ok, multipart::Form, start_app, test_config};

    #[actix_rt::test]
    async fn test_spreadsheet_upload_happy_path() {
        // Given the vendor will accept the grouped mapping.
        let mut server = Server::new_async().await;
        let users = mock_token_ok(&mut server).await;
        let create = server.mock("POST", "/com/api/v1/dependencyMappings")
            .match_body(Matcher::Json(json!({
                "layoutId": "L1",
                "parentId": "P1",
                "childId": "C1",
                "mappings": {
                    "Parent1": ["Child1", "Child2"],
                    "Parent2": ["Child3"]
                }
            })))
            .with_status(200)
            .with_body(r#"{"id":"M1"}"#)
            .create_async()
            .await;
        let service = test::init_service(start_app(configured(&server))).await;

        // When the spreadsheet is uploaded.
        let resp = post("/dependency/upload")
            .query_param("layoutId", "L1")
            .query_param("parentId", "P1")
            .query_param("childId", "C1")
            .multipart(Form::new().file("file", "mappings.xlsx", &fixture("mappings.xlsx")))
            .send(&service)
            .await;

        // Then the counts and the vendor's response are returned.
        assert_eq!(resp.status(), 200);
        assert_json_eq!(resp.json(), json!({
            "status": "success",
            "recordsProcessed": 3,
            "rowsSkipped": 2,
            "parentCategories": 2,
            "vendorResponse": { "id": "M1" }
        }));
        users.assert_async().await;
        create.assert_async().await;
    }

    #[actix_rt::test]
    async fn test_upload_alias_with_form_fields_and_named_columns() {
        // Given the vendor will accept the mapping - field ids default to the headers.
        let mut server = Server::new_async().await;
        let _users = mock_token_ok(&mut server).await;
        let create = server.mock("POST", "/com/api/v1/dependencyMappings")
            .match_body(Matcher::Json(json!({
                "layoutId": "L2",
                "parentId": "Region",
                "childId": "Office",
                "mappings": {
                    "North": ["101", "102.5"],
                    "South": ["201"]
                }
            })))
            .with_status(200)
            .with_body(r#"{"id":"M2"}"#)
            .create_async()
            .await;
        let service = test::init_service(start_app(configured(&server))).await;

        // When the parameters are sent as form fields, overriding the query.
        let resp = post("/upload")
            .query_param("layoutId", "ignored")
            .multipart(Form::new()
                .text("layoutId", "L2")
                .text("parentColumn", "Region")
                .text("childColumn", "Office")
                .file("file", "numbered.xlsx", &fixture("numbered.xlsx")))
            .send(&service)
            .await;

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.json()["recordsProcessed"], 3);
        assert_eq!(resp.json()["parentCategories"], 2);
        create.assert_async().await;
    }

    #[actix_rt::test]
    async fn test_json_upload_happy_path() {
        let mut server = Server::new_async().await;
        let _users = mock_token_ok(&mut server).await;
        let create = server.mock("POST", "/com/api/v1/dependencyMappings")
            .match_body(Matcher::Json(json!({
                "layoutId": "L1",
                "parentId": "P1",
                "childId": "C1",
                "mappings": { "A": ["1", "2"], "B": ["3"] }
            })))
            .with_status(200)
            .with_body(r#"{"id":"M3"}"#)
            .create_async()
            .await;
        let service = test::init_service(start_app(configured(&server))).await;

        let json_data = json!({
            "layoutId": "L1",
            "parentId": "P1",
            "childId": "C1",
            "mappings": { "A": ["1", "2"], "B": ["3"] }
        });

        let resp = post("/dependency/upload")
            .multipart(Form::new().text("json_data", &json_data.to_string()))
            .send(&service)
            .await;

        assert_eq!(resp.status(), 200);
        assert_json_eq!(resp.json(), json!({
            "status": "success",
            "recordsProcessed": 3,
            "rowsSkipped": 0,
            "parentCategories": 2,
            "vendorResponse": { "id": "M3" }
        }));
        create.assert_async().await;
    }

    #[actix_rt::test]
    async fn test_malformed_json_upload_is_an_invalid_payload() {
        let mut server = Server::new_async().await;
        let no_calls = mock_no_calls(&mut server).await;
        let service = test::init_service(start_app(configured(&server))).await;

        let resp = post("/dependency/upload")
            .multipart(Form::new().text("json_data", "{ \"layoutId\": "))
            .send(&service)
            .await;

        assert_eq!(resp.status(), 400);
        assert_eq!(resp.json()["errorCode"], 1022);
        no_calls.assert_async().await;
    }

    #[actix_rt::test]
    async fn test_spreadsheet_upload_needs_a_layout() {
        let mut server = Server::new_async().await;
        let no_calls = mock_no_calls(&mut server).await;
        let service = test::init_service(start_app(configured(&server))).await;

        let resp = post("/dependency/upload")
            .multipart(Form::new().file("file", "mappings.xlsx", &fixture("mappings.xlsx")))
            .send(&service)
            .await;

        assert_eq!(resp.status(), 400);
        assert_json_eq!(resp.json(), json!({
            "errorCode": 1011,
            "message": "Missing required parameter layoutId"
        }));
        no_calls.assert_async().await;
    }

    #[actix_rt::test]
    async fn test_rejected_uploads() {
        // Given valid credentials.
        let mut server = Server::new_async().await;
        let no_calls = mock_no_calls(&mut server).await;
        let service = test::init_service(start_app(configured(&server))).await;

        // A single column sheet.
        let resp = post("/dependency/upload")
            .query_param("layoutId", "L1")
            .multipart(Form::new().file("file", "single_column.xlsx", &fixture("single_column.xlsx")))
            .send(&service)
            .await;
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.json()["errorCode"], 1021);

        // A column that isn't in the sheet.
        let resp = post("/dependency/upload")
            .query_param("layoutId", "L1")
            .query_param("childColumn", "Nope")
            .multipart(Form::new().file("file", "mappings.xlsx", &fixture("mappings.xlsx")))
            .send(&service)
            .await;
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.json()["errorCode"], 1021);

        // Something that isn't a spreadsheet.
        let resp = post("/dependency/upload")
            .query_param("layoutId", "L1")
            .multipart(Form::new().file("file", "notes.xlsx", b"not a spreadsheet"))
            .send(&service)
            .await;
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.json()["errorCode"], 1020);

        // Neither a file nor json.
        let resp = post("/dependency/upload")
            .query_param("layoutId", "L1")
            .multipart(Form::new().text("parentId", "P1"))
            .send(&service)
            .await;
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.json()["errorCode"], 1022);

        // Both a file and json.
        let resp = post("/dependency/upload")
            .query_param("layoutId", "L1")
            .multipart(Form::new()
                .file("file", "mappings.xlsx", &fixture("mappings.xlsx"))
                .text("json_data", "{}"))
            .send(&service)
            .await;
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.json()["errorCode"], 1022);

        // None of these reached the vendor.
        no_calls.assert_async().await;
    }

    #[actix_rt::test]
    async fn test_oversized_upload_is_rejected() {
        let server = Server::new_async().await;
        let mut config = configured(&server);
        config.max_upload_bytes = 16;
        let service = test::init_service(start_app(config)).await;

        let resp = post("/dependency/upload")
            .query_param("layoutId", "L1")
            .multipart(Form::new().file("file", "mappings.xlsx", &fixture("mappings.xlsx")))
            .send(&service)
            .await;

        assert_eq!(resp.status(), 400);
        assert_eq!(resp.json()["errorCode"], 1020);
    }

    #[actix_rt::test]
    async fn test_upload_without_credentials_makes_no_vendor_call() {
        let mut server = Server::new_async().await;
        let no_calls = mock_no_calls(&mut server).await;
        let service = test::init_service(start_app(test_config(&server))).await;

        let resp = post("/dependency/upload")
            .query_param("layoutId", "L1")
            .multipart(Form::new().file("file", "mappings.xlsx", &fixture("mappings.xlsx")))
            .send(&service)
            .await;

        assert_eq!(resp.status(), 401);
        assert_eq!(resp.json()["errorCode"], 1002);
        no_calls.assert_async().await;
    }
}
