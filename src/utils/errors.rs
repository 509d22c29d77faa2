use url::ParseError;
use config::ConfigError;
use serde_json::{json, Value};
use parking_lot::RwLock;
use tracing::{error, warn};
use lazy_static::lazy_static;
use derive_more::{Display, Error};
use actix_multipart::MultipartError;
use awc::error::{PayloadError, SendRequestError};
use actix_web::{HttpResponse, ResponseError, error::BlockingError, http::{StatusCode, header::{InvalidHeaderName, InvalidHeaderValue}}, web::{JsonConfig, QueryConfig}};

lazy_static! {
    // In general configuration should be passed in a context struct via Actix .data extractors.
    // Any configuration in a lazy static block exists because there are sections are code where
    // The contexts cannot be accessed or where it becomes increasingly complex to do so.
    // For example, actix middleware, extractors, error responders, etc.

    /// When an error is returned to the client, a useful error message will be sent, along with
    /// any status and body the vendor returned. In production this may expose more than we'd like,
    /// so this setting is used to redact these details and leave only the errorCode.
    pub static ref REDACT_ERROR_MESSAGES: RwLock<bool> = RwLock::new(false);
}

///
/// An error type used throughout the services code which can be converted into a HTTP error response.
///
/// All possible library or system errors are converted into one of these InternalErrors so our code
/// can have a clean Result<blah, InternalError> signature declaration and avoids excessive use or
/// operation.await.map_err(|err| blah) type call.
///
/// Conversion from a source error to an InternalError is done futher below with a series of From<T>
/// trait implementations.
///
/// None of these variants ever hold an access token - they are logged and returned to callers.
///
#[derive(Clone, Debug, Display, Error)]
pub enum InternalError {
    #[display(fmt = "Unsupported domain '{}'. Supported: {}", domain, supported)]
    InvalidDomain{ domain: String, supported: String },

    #[display(fmt = "Vendor credentials not configured. Use /auth endpoint first.")]
    MissingCredentials,

    #[display(fmt = "OAuth token is invalid, expired or lacks permission (vendor status {}). Please set /auth with a valid token.", status)]
    InvalidToken{ status: u16, body: String },

    #[display(fmt = "Unable to reach {}: {}", url, cause)]
    UpstreamUnavailable{ url: String, cause: String },

    #[display(fmt = "Request to {} failed with status {}", url, status)]
    UpstreamError{ url: String, status: u16, body: String },

    #[display(fmt = "Missing required parameter {}", name)]
    MissingParameter{ name: String },

    #[display(fmt = "Invalid file: {}", reason)]
    InvalidFile{ reason: String },

    #[display(fmt = "Missing columns: {}", reason)]
    MissingColumns{ reason: String },

    #[display(fmt = "Invalid payload: {}", reason)]
    InvalidPayload{ reason: String },

    #[display(fmt = "{} not found", resource)]
    NotFound{ resource: String, body: String },

    #[display(fmt = "Request format invalid: {}", reason)]
    RequestFormatError{ reason: String },

    #[display(fmt = "Url could not be parsed: {}", cause)]
    InvalidUrl{ cause: String },

    #[display(fmt = "Unable to convert to json: {}", cause)]
    InvalidJsonError{ cause: String },

    #[display(fmt = "InvalidFormatError: {}", cause)]
    InvalidFormatError{ cause: String },

    #[display(fmt = "The request context was not initialised")]
    RequestContextMissing,

    #[display(fmt = "The service configuration is not correct: {}", cause)]
    ConfigurationError{ cause: String },
}

impl InternalError {
    ///
    /// The status and body the vendor returned, for those errors which came from a vendor response.
    ///
    fn vendor_details(&self) -> Option<(u16, &str)> {
        match self {
            InternalError::InvalidToken { status, body }      => Some((*status, body)),
            InternalError::UpstreamError { status, body, .. } => Some((*status, body)),
            InternalError::NotFound { body, .. }              => Some((404, body)),
            _ => None,
        }
    }

    ///
    /// The JSON body returned to the client. A redacted body only has the errorCode.
    ///
    fn response_body(&self, redact: bool) -> Value {
        let mut body = json!({ "errorCode": self.error_code() });

        if !redact {
            body["message"] = json!(self.to_string());

            // Keep the vendor's view of the failure for diagnostics.
            if let Some((status, vendor_body)) = self.vendor_details() {
                body["vendorStatus"] = json!(status);
                body["vendorBody"] = json!(vendor_body);
            }
        }

        body
    }

    fn error_code(&self) -> u16 {
        match *self {
            InternalError::InvalidFormatError { .. }    => 0400,
            InternalError::RequestContextMissing        => 0500,
            InternalError::ConfigurationError { .. }    => 0501,
            InternalError::InvalidDomain { .. }         => 1001,
            InternalError::MissingCredentials           => 1002,
            InternalError::InvalidToken { .. }          => 1003,
            InternalError::RequestFormatError { .. }    => 1010,
            InternalError::MissingParameter { .. }      => 1011,
            InternalError::InvalidFile { .. }           => 1020,
            InternalError::MissingColumns { .. }        => 1021,
            InternalError::InvalidPayload { .. }        => 1022,
            InternalError::NotFound { .. }              => 1030,
            InternalError::InvalidJsonError { .. }      => 2105,
            InternalError::InvalidUrl { .. }            => 2150,
            InternalError::UpstreamUnavailable { .. }   => 3000,
            InternalError::UpstreamError { .. }         => 3001,
        }
    }
}

impl ResponseError for InternalError {
    fn status_code(&self) -> StatusCode {
        match *self {
            InternalError::InvalidFormatError { .. }    => StatusCode::INTERNAL_SERVER_ERROR,
            InternalError::RequestContextMissing        => StatusCode::INTERNAL_SERVER_ERROR,
            InternalError::ConfigurationError { .. }    => StatusCode::INTERNAL_SERVER_ERROR,
            InternalError::InvalidDomain { .. }         => StatusCode::BAD_REQUEST,
            InternalError::MissingCredentials           => StatusCode::UNAUTHORIZED,
            InternalError::InvalidToken { .. }          => StatusCode::UNAUTHORIZED,
            InternalError::RequestFormatError { .. }    => StatusCode::BAD_REQUEST,
            InternalError::MissingParameter { .. }      => StatusCode::BAD_REQUEST,
            InternalError::InvalidFile { .. }           => StatusCode::BAD_REQUEST,
            InternalError::MissingColumns { .. }        => StatusCode::BAD_REQUEST,
            InternalError::InvalidPayload { .. }        => StatusCode::BAD_REQUEST,
            InternalError::NotFound { .. }              => StatusCode::NOT_FOUND,
            InternalError::InvalidJsonError { .. }      => StatusCode::INTERNAL_SERVER_ERROR,
            InternalError::InvalidUrl { .. }            => StatusCode::INTERNAL_SERVER_ERROR,
            InternalError::UpstreamUnavailable { .. }   => StatusCode::SERVICE_UNAVAILABLE,
            InternalError::UpstreamError { .. }         => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self.status_code().is_client_error() {
            true  => warn!("{}", self),
            false => error!("{}", self),
        };

        let redact = *REDACT_ERROR_MESSAGES.read();
        HttpResponse::build(self.status_code()).json(self.response_body(redact))
    }
}

impl From<serde_json::Error> for InternalError {
    fn from(error: serde_json::Error) -> Self {
        InternalError::InvalidJsonError { cause: error.to_string() }
    }
}

impl From<InternalError> for std::io::Error {
    fn from(error: InternalError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, error.to_string() )
    }
}

impl From<ParseError> for InternalError {
    fn from(error: ParseError) -> Self {
        InternalError::InvalidUrl { cause: error.to_string() }
    }
}

impl From<InvalidHeaderName> for InternalError {
    fn from(error: InvalidHeaderName) -> Self {
        InternalError::RequestFormatError { reason: error.to_string() }
    }
}

impl From<InvalidHeaderValue> for InternalError {
    fn from(error: InvalidHeaderValue) -> Self {
        InternalError::RequestFormatError { reason: error.to_string() }
    }
}

impl From<MultipartError> for InternalError {
    fn from(error: MultipartError) -> Self {
        InternalError::InvalidPayload { reason: error.to_string() }
    }
}

impl From<ConfigError> for InternalError {
    fn from(error: ConfigError) -> Self {
        InternalError::ConfigurationError { cause: error.to_string() }
    }
}

impl From<BlockingError> for InternalError {
    fn from(error: BlockingError) -> Self {
        InternalError::InvalidFormatError { cause: error.to_string() }
    }
}

impl From<std::fmt::Error> for InternalError {
    fn from(error: std::fmt::Error) -> Self {
        InternalError::InvalidFormatError { cause: error.to_string() }
    }
}

///
/// A transport failure talking to the vendor - there's no response to pass back.
///
pub fn upstream_unavailable(url: &str, error: SendRequestError) -> InternalError {
    InternalError::UpstreamUnavailable { url: url.to_string(), cause: error.to_string() }
}

///
/// The vendor responded but we couldn't read the whole payload.
///
pub fn upstream_payload(url: &str, error: PayloadError) -> InternalError {
    InternalError::UpstreamUnavailable { url: url.to_string(), cause: error.to_string() }
}

///
/// Return JSON parse details as an error to the client.
///
pub fn configure_json_extractor() -> JsonConfig {
    JsonConfig::default()
        .error_handler(|err, _req| {
            InternalError::RequestFormatError { reason: err.to_string() }.into()
        })
}

///
/// Return query-string parse details as an error to the client.
///
pub fn configure_query_extractor() -> QueryConfig {
    QueryConfig::default()
        .error_handler(|err, _req| {
            InternalError::RequestFormatError { reason: err.to_string() }.into()
        })
}
