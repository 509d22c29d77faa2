use std::sync::Arc;
use awc::Client;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, err, ok};
use crate::model::credentials::CredentialStore;
use super::{config::Configuration, errors::InternalError, http::http_client};

///
/// Everything created once at start-up and shared by every worker.
///
pub struct InitialisationContext {
    config: Configuration,
    credentials: CredentialStore,
}

impl InitialisationContext {
    pub fn new(config: Configuration, credentials: CredentialStore) -> Self {
        InitialisationContext { config, credentials }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }
}

///
/// The per-worker part of a request context. The HTTP client isn't Send so each worker gets it's own.
///
pub struct PartialRequestContext {
    init: Arc<InitialisationContext>,
    client: Client,
}

impl From<Arc<InitialisationContext>> for PartialRequestContext {
    fn from(init: Arc<InitialisationContext>) -> Self {
        let client = http_client(init.config());
        PartialRequestContext { init, client }
    }
}

///
/// Passed into HTTP request handlers to access config, the credential store, the HTTP client and
/// the request's correlation id.
///
/// The request_id middleware places one of these in each request's extensions.
///
#[derive(Clone)]
pub struct RequestContext {
    partial: Data<PartialRequestContext>,
    request_id: String,
}

impl RequestContext {
    pub fn from(partial: Data<PartialRequestContext>, request_id: String) -> Self {
        RequestContext { partial, request_id }
    }

    pub fn config(&self) -> &Configuration {
        self.partial.init.config()
    }

    pub fn credentials(&self) -> &CredentialStore {
        self.partial.init.credentials()
    }

    pub fn client(&self) -> &Client {
        &self.partial.client
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext").field("request_id", &self.request_id).finish()
    }
}

impl FromRequest for RequestContext {
    type Error = InternalError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<RequestContext>() {
            Some(ctx) => ok(ctx.clone()),
            None => err(InternalError::RequestContextMissing),
        }
    }
}
