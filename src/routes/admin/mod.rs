///
/// These are endpoints that are used by the platform, support staff or API consumers rather
/// than the mapping workflow itself.
///
pub mod docs;
pub mod health;
pub mod settings;
