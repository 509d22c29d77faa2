#![allow(dead_code)]

use std::sync::Arc;
use mockito::{Mock, ServerGuard};
use actix_web::{App, body::MessageBody, dev::{ServiceFactory, ServiceRequest, ServiceResponse}};
use deskmap::{Configuration, model::credentials::AccessToken};

pub const ORG_ID: &str = "60001234";
pub const TOKEN: &str = "1000.test-token";
pub const AUTHORIZATION: &str = "Zoho-oauthtoken 1000.test-token";

///
/// A configuration pointing the vendor url at the mock server. No credentials are seeded.
///
pub fn test_config(server: &ServerGuard) -> Configuration {
    Configuration {
        port: 8989,
        base_url: String::default(),
        vendor_url: format!("{}/{{domain}}/api/v1", server.url()),
        default_domain: "com".to_string(),
        auth_scheme: "Zoho-oauthtoken".to_string(),
        keep_alive: 15,
        client_timeout: 30,
        server_timeout: 5,
        redact_error_messages: false,
        max_upload_bytes: 1024 * 1024,
        zoho_org_id: None,
        zoho_access_token: None,
        zoho_domain: None,
    }
}

///
/// A configuration with credentials already in the store.
///
pub fn configured(server: &ServerGuard) -> Configuration {
    Configuration {
        zoho_org_id: Some(ORG_ID.to_string()),
        zoho_access_token: Some(AccessToken::new(TOKEN)),
        ..test_config(server)
    }
}

///
/// Get an instance of an App with routes and the credential store set-up.
///
pub fn start_app(config: Configuration) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = ()>> {

    let ctx = match deskmap::init_context(config) {
        Ok(ctx) => ctx,
        Err(err) => panic!("init_context failed: {}", err),
    };
    deskmap::app(Arc::new(ctx))
}

///
/// The vendor accepts the token - every protected operation checks this first.
///
pub async fn mock_token_ok(server: &mut ServerGuard) -> Mock {
    server.mock("GET", "/com/api/v1/users")
        .match_header("authorization", AUTHORIZATION)
        .match_header("orgid", ORG_ID)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":[]}"#)
        .create_async()
        .await
}

pub async fn mock_token_rejected(server: &mut ServerGuard) -> Mock {
    server.mock("GET", "/com/api/v1/users")
        .with_status(401)
        .with_body(r#"{"errorCode":"INVALID_OAUTH"}"#)
        .create_async()
        .await
}

///
/// Every vendor operation checks the token first, so this proves no vendor call was made.
///
pub async fn mock_no_calls(server: &mut ServerGuard) -> Mock {
    server.mock("GET", "/com/api/v1/users")
        .expect(0)
        .create_async()
        .await
}

pub fn fixture(name: &str) -> Vec<u8> {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read(&path).unwrap_or_else(|err| panic!("Unable to read fixture {}: {}", path, err))
}


// _    _ _______ _______ _____
// | |  | |__   __|__   __|  __ \
// | |__| |  | |     | |  | |__) |
// |  __  |  | |     | |  |  ___/
// | |  | |  | |     | |  | |
// |_|  |_|  |_|     |_|  |_|
//
// A wrapper around the actix test wrapper around the actix web client.
//
// Why? Just makes your tests a little less verbose.
//
// It's similar to the one in the main utils::http module but subtly different. It panics and
// returns the whole response for the test to inspect.
//
pub mod http {
    use serde::Serialize;
    use serde_json::Value;
    use actix_http::Request;
    use actix_web::{body::MessageBody, dev::{Service, ServiceResponse}, http::{Method, header::HeaderMap}, test, web::Bytes};

    pub struct HttpRequest {
        url: String,
        method: Method,
        body: Option<Vec<u8>>,
        headers: Vec<(String, String)>,
        query_params: Vec<(String, String)>,
    }

    impl HttpRequest {
        fn new(method: Method, url: &str) -> Self {
            HttpRequest {
                url: url.to_string(),
                body: None,
                method,
                headers: Vec::new(),
                query_params: Vec::new(),
            }
        }

        pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
            self.headers.push((name.to_string(), value.to_string()));
            self
        }

        pub fn query_param(&mut self, name: &str, value: &str) -> &mut Self {
            self.query_params.push((name.to_string(), value.to_string()));
            self
        }

        pub fn json<T: Serialize>(&mut self, body: T) -> &mut Self {
            self.body = Some(serde_json::to_vec(&body).unwrap_or_else(|_| panic!("Cant set test body for {}", self.url)));
            self.header("content-type", "application/json")
        }

        pub fn raw(&mut self, content_type: &str, body: &[u8]) -> &mut Self {
            self.body = Some(body.to_vec());
            self.header("content-type", content_type)
        }

        pub fn multipart(&mut self, form: super::multipart::Form) -> &mut Self {
            let (content_type, body) = form.finish();
            self.body = Some(body);
            self.header("content-type", &content_type)
        }

        pub async fn send<S, B, E>(&self, app: &S) -> HttpResponse
        where
            S: Service<Request, Response = ServiceResponse<B>, Error = E>,
            B: MessageBody,
            E: std::fmt::Debug,
        {
            let url = match self.query_params.is_empty() {
                true  => self.url.clone(),
                false => format!("{}?{}", self.url, url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&self.query_params)
                    .finish()),
            };

            // Build an actix web client request.
            let mut req = test::TestRequest::default().method(self.method.clone()).uri(&url);

            // Append all the specified header.
            for (name, value) in &self.headers {
                req = req.insert_header((name.as_str(), value.as_str()));
            }

            if let Some(bytes) = &self.body {
                req = req.set_payload(bytes.clone());
            }

            let resp = test::call_service(app, req.to_request()).await;
            let status = resp.status().as_u16();
            let headers = resp.headers().clone();
            let body = test::read_body(resp).await;

            HttpResponse { url, method: self.method.clone(), status, headers, body }
        }
    }

    pub struct HttpResponse {
        url: String,     // The original request URL.
        method: Method,  // The original request HTTP method.
        status: u16,
        headers: HeaderMap,
        body: Bytes,
    }

    impl HttpResponse {
        pub fn status(&self) -> u16 {
            self.status
        }

        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers.get(name).and_then(|value| value.to_str().ok())
        }

        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.body).to_string()
        }

        pub fn json(&self) -> Value {
            serde_json::from_slice(&self.body).unwrap_or_else(|_| panic!("Failed to read json response for {} {}: {}", self.method, self.url, self.text()))
        }
    }

    #[allow(dead_code)]
    pub fn post(url: &str) -> HttpRequest {
        HttpRequest::new(Method::POST, url)
    }

    #[allow(dead_code)]
    pub fn patch(url: &str) -> HttpRequest {
        HttpRequest::new(Method::PATCH, url)
    }

    #[allow(dead_code)]
    pub fn get(url: &str) -> HttpRequest {
        HttpRequest::new(Method::GET, url)
    }

    #[allow(dead_code)]
    pub fn delete(url: &str) -> HttpRequest {
        HttpRequest::new(Method::DELETE, url)
    }
}

///
/// Build a multipart/form-data body by hand.
///
pub mod multipart {
    const BOUNDARY: &str = "----deskmap-test-boundary";

    #[derive(Default)]
    pub struct Form {
        body: Vec<u8>,
    }

    impl Form {
        pub fn new() -> Self {
            Form::default()
        }

        pub fn text(mut self, name: &str, value: &str) -> Self {
            self.part(&format!("Content-Disposition: form-data; name=\"{}\"", name), value.as_bytes());
            self
        }

        pub fn file(mut self, name: &str, filename: &str, bytes: &[u8]) -> Self {
            self.part(&format!("Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream", name, filename), bytes);
            self
        }

        fn part(&mut self, headers: &str, bytes: &[u8]) {
            self.body.extend_from_slice(format!("--{}\r\n{}\r\n\r\n", BOUNDARY, headers).as_bytes());
            self.body.extend_from_slice(bytes);
            self.body.extend_from_slice(b"\r\n");
        }

        pub fn finish(mut self) -> (String, Vec<u8>) {
            self.body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
            (format!("multipart/form-data; boundary={}", BOUNDARY), self.body)
        }
    }
}
