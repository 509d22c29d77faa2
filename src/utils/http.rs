use url::Url;
use std::str::FromStr;
use std::time::Duration;
use serde_json::Value;
use tracing::debug;
use itertools::Itertools;
use actix_web::web::Bytes;
use awc::{Client, ClientRequest, Connector};
use actix_web::http::{Method, StatusCode, header::{self, HeaderName, HeaderValue}};
use crate::{APP_NAME, middleware::request_id::REQUEST_ID_HEADER};
use super::{config::Configuration, context::RequestContext, errors::{self, InternalError}};

/// The largest vendor response body we'll buffer.
const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

///
/// The https connector needs a process-wide rustls crypto provider. Only the first install wins so
/// repeat calls (tests initialise many apps) are ignored.
///
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

///
/// Construct a configured HTTP client.
///
pub fn http_client(config: &Configuration) -> Client {
    Client::builder()
        .add_default_header((header::USER_AGENT, APP_NAME))
        .timeout(Duration::from_secs(config.server_timeout))
        .connector(Connector::new()
            .timeout(Duration::from_secs(config.server_timeout)))
        .finish()
}

///
/// Our own library-agnostic wrapper around a HTTP request.
///
/// We can tweak it's api to suit our usage and make our code more readable than if we relied
/// on other libraries directly.
///
/// Example: -
///    let response = get(format!("{}/remote/endpoint/{}", address, id))
///        .query_param("name", "value")
///        .header("name1", "value1")
///        .json(&<json>)
///        .send(ctx)
///        .await?;
///
///    let thing: Value = match response.status() {
///        200 => response.json_or_empty()?
///        400 => return Err(yyyy)
///          _ => return Err(xxxx)
///    }
///
/// Requests are sent once. A transport failure is an UpstreamUnavailable error, any response
/// (whatever the status) is returned to the caller to interpret.
///
pub struct HttpRequest {
    url: String,
    method: Method,
    body: Option<Vec<u8>>,
    headers: Vec<(String, String)>,
    query_params: Vec<(String, String)>,
    body_error: Option<InternalError> // Send when the body is set externally but fails to serialise. This means we can handle errors on send() not body().
}

impl HttpRequest {
    fn new(method: Method, url: String) -> Self {
        HttpRequest {
            url,
            body: None,
            method,
            headers: Vec::new(),
            query_params: Vec::new(),
            body_error: None
        }
    }

    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn headers(&mut self, headers: &[(&str, String)]) -> &mut Self {
        for (name, value) in headers {
            self.header(name, value);
        }
        self
    }

    pub fn query_param(&mut self, name: &str, value: &str) -> &mut Self {
        self.query_params.push((name.to_string(), value.to_string()));
        self
    }

    ///
    /// Set a JSON body to be sent.
    ///
    pub fn json(&mut self, body: &Value) -> &mut Self {
        match serde_json::to_vec(&body) {
            Ok(bytes) => self.body = Some(bytes),
            Err(err) => self.body_error = Some(InternalError::InvalidJsonError { cause: err.to_string() })
        };
        self.header("content-type", "application/json")
    }

    ///
    /// Send the HTTP request - and return a response.
    ///
    pub async fn send(&mut self, ctx: &RequestContext) -> Result<HttpResponse, InternalError> {
        // If we failed to serailise the body, fail at this point.
        if let Some(body_error) = &self.body_error {
            return Err(body_error.to_owned())
        }

        // Parse the url and query params and urlencode.
        let mut url = Url::parse(&self.url)?;

        for (name, value) in &self.query_params {
            url.query_pairs_mut().append_pair(name, value);
        }

        // Build an actix web client request.
        let mut req = ctx.client().request(self.method.clone(), url.as_str());

        // Append all the specified header.
        for (name, value) in &self.headers {
            append_header(name, value, &mut req)?;
        }

        // Add the request_id header.
        append_header(REQUEST_ID_HEADER, ctx.request_id(), &mut req)?;

        self.trace_request(&url);

        // Make the request now with the appropriate body type.
        let resp = match &self.body {
            None => req.send().await,
            Some(body) => req.send_body(body.clone()).await
        };

        let mut resp = resp.map_err(|err| errors::upstream_unavailable(url.as_str(), err))?;

        let body = resp.body()
            .limit(MAX_RESPONSE_BYTES)
            .await
            .map_err(|err| errors::upstream_payload(url.as_str(), err))?;

        let resp = HttpResponse {
            url: url.to_string(),
            method: self.method.clone(),
            status: resp.status(),
            body,
        };

        resp.trace();
        Ok(resp)
    }

    fn trace_request(&self, url: &Url) {
        let body = match &self.body {
            None => String::default(),
            Some(body) => format!("\n{}", String::from_utf8_lossy(body)),
        };

        let headers = match self.headers.is_empty() {
            true => String::default(),
            false => format!("\n{}", self.headers.iter().map(|(key, value)| format!("{}: {}", key, mask_header(key, value))).join("\n"))
        };

        debug!("Sending downstream request\n{} {}{}{}",
            self.method,
            url,
            headers,
            body);
    }
}

///
/// Never let an access token reach the logs.
///
fn mask_header<'a>(name: &str, value: &'a str) -> &'a str {
    match name.eq_ignore_ascii_case(header::AUTHORIZATION.as_str()) {
        true  => "****",
        false => value,
    }
}

fn append_header(name: &str, value: &str, req: &mut ClientRequest) -> Result<(), InternalError> {
    req.headers_mut().append(
        HeaderName::from_str(name)?,
        HeaderValue::from_str(value)?);
    Ok(())
}

pub struct HttpResponse {
    url: String,        // The original request URL.
    method: Method,     // The original request HTTP method.
    status: StatusCode, // The response status.
    body: Bytes,        // Any received payload.
}

impl HttpResponse {
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> Method {
        self.method.clone()
    }

    ///
    /// The payload as text - used to pass vendor error details back to the caller.
    ///
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    fn trace(&self) {
        let body = match self.body.len() {
            0 => String::default(),
            _ => format!("\n{}", String::from_utf8_lossy(&self.body)),
        };

        debug!("Received response from downstream request\n{} {} {}{}",
            self.method,
            self.url,
            self.status,
            body);
    }

    ///
    /// The payload as JSON, an empty payload (eg. a 204) is an empty object. A payload which isn't
    /// JSON is treated as a vendor failure.
    ///
    pub fn json_or_empty(&self) -> Result<Value, InternalError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Default::default()))
        }

        serde_json::from_slice(&self.body).map_err(|_| InternalError::UpstreamError {
            url: format!("{} {}", self.method, self.url),
            status: self.status(),
            body: self.text(),
        })
    }
}

pub fn post(url: String) -> HttpRequest {
    HttpRequest::new(Method::POST, url)
}

pub fn patch(url: String) -> HttpRequest {
    HttpRequest::new(Method::PATCH, url)
}

pub fn get(url: String) -> HttpRequest {
    HttpRequest::new(Method::GET, url)
}

pub fn delete(url: String) -> HttpRequest {
    HttpRequest::new(Method::DELETE, url)
}
