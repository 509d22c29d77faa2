pub mod utils;
pub mod model;
mod routes;
mod clients;
mod middleware;

use tracing::info;
use dotenv::dotenv;
use std::{sync::Arc, time::Duration};
use middleware::request_id;
use model::credentials::CredentialStore;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};
use actix_web::{App, HttpServer, body::MessageBody, dev::{ServiceFactory, ServiceRequest, ServiceResponse}, web, web::Data};
use utils::{config::default_env, context::PartialRequestContext, http::install_crypto_provider, errors::{configure_json_extractor, configure_query_extractor, InternalError}};
use routes::{admin::{docs, health, settings}, delete_mapping, get_auth_status, get_available_fields, get_mappings, set_auth, update_mapping, upload_mappings};

pub use utils::config::Configuration;
pub use utils::context::InitialisationContext;

pub const APP_NAME: &'static str = "Deskmap"; // Keep in sync with cargo.toml

///
/// The HTTP endpoints are wired-in here.
///
fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Admin/internal
        .route("/", web::get().to(health::handle_liveness))
        .route("/health", web::get().to(health::handle))
        .route("/settings", web::get().to(settings::handle))
        .route("/openapi.json", web::get().to(docs::handle_openapi))
        .route("/docs", web::get().to(docs::handle_docs))

        // Credentials
        .route("/auth", web::post().to(set_auth::handle))
        .route("/auth/status", web::get().to(get_auth_status::handle))

        // Mappings
        .route("/mappings", web::get().to(get_mappings::handle))
        .route("/available-fields", web::get().to(get_available_fields::handle))
        .route("/mappings/{mapping_id}", web::patch().to(update_mapping::handle))
        .route("/mappings/{mapping_id}", web::delete().to(delete_mapping::handle))

        // Uploads
        .route("/dependency/upload", web::post().to(upload_mappings::handle))
        .route("/upload", web::post().to(upload_mappings::handle));
}

///
/// Initialise config, tracing and the credential store, and start the HTTP server.
///
/// Called from main.rs. The split from binary to library means we can write integration tests
/// in the /tests folder which can call various public methods in this file to create the service
/// with near-identical set-up as the runtime instance.
///
pub async fn lib_main() -> Result<(), std::io::Error> {
    let init_ctx = Arc::new(init_everything()?);
    let server_cfg = init_ctx.config().clone();

    // Start the HTTP server now, spawning an App for each worker thread.
    HttpServer::new(move || app(init_ctx.clone()))
        .bind(format!("0.0.0.0:{}", server_cfg.port))?
        .keep_alive(Duration::from_secs(server_cfg.keep_alive))
        .client_request_timeout(Duration::from_secs(server_cfg.client_timeout))
        .run()
        .await
}

///
/// Initialise configuration and tracing.
///
/// Return a context object which can be passed into HTTP request handlers to access config and
/// the credential store.
///
pub fn init_everything() -> Result<InitialisationContext, InternalError> {
    // Load any local dev settings as environment variables from a .env file.
    dotenv().ok();

    // Default log level to INFO if it's not specified.
    default_env("RUST_LOG", "INFO");

    // Load the service configuration into struct and initialise any lazy statics.
    let config = Configuration::from_env()?;

    init_tracing();

    info!("{}\n{}", BANNER, config.fmt_console()?);

    init_context(config)
}

///
/// Create a context object that can be used as a parameter in any HTTP request handler. The
/// credential store is seeded from any credentials in the config. The TLS crypto provider must be
/// installed before any worker builds it's HTTP client.
///
pub fn init_context(config: Configuration) -> Result<InitialisationContext, InternalError> {
    install_crypto_provider();

    let credentials = CredentialStore::from_config(&config)?;

    info!("{}", credentials.status().status);

    Ok(InitialisationContext::new(config, credentials))
}

///
/// Initialise tracing with the level taken from the RUST_LOG env variable.
///
fn init_tracing() {
    if let Err(err) = Registry::default()
        .with(EnvFilter::from_default_env()) // Set the tracing level to match RUST_LOG env variable.
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init() {
            info!("Tracing already initialised: {}", err.to_string()); // Allowed error here - tests call this fn repeatedly.
    }
}

///
/// Create a configured actix_web HttpServer App with configured middleware, data and routes.
///
pub fn app(ctx: Arc<InitialisationContext>) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = ()>> {

    let base_url = ctx.config().base_url.trim_end_matches('/').to_string();

    App::new()
        .wrap(request_id::Middleware::new(Data::new(PartialRequestContext::from(ctx))))

        // Ensure all endpoints return detailed Json and query-string parse errors.
        .app_data(configure_json_extractor())
        .app_data(configure_query_extractor())

        // Add the routes to this root url path.
        .service(web::scope(&base_url).configure(configure_routes))
}

const BANNER: &str = r#"
  ___          _
 |   \ ___ ___| |__ _ __  __ _ _ __   Rust
 | |) / -_|_-<| / /| '  \/ _` | '_ \  Zoho Desk
 |___/\___/__/|_\_\|_|_|_\__,_| .__/  Actix Web
                              |_|
"#;
