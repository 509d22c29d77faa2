pub mod http;
pub mod config;
pub mod errors;
pub mod context;
pub mod tabular;
