pub mod admin;
pub mod set_auth;
pub mod get_mappings;
pub mod delete_mapping;
pub mod update_mapping;
pub mod upload_mappings;
pub mod get_auth_status;
pub mod get_available_fields;

use crate::utils::errors::InternalError;

///
/// A blank query parameter is treated as absent.
///
pub fn optional_param(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

pub fn required_param<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, InternalError> {
    value.map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(InternalError::MissingParameter { name: name.to_string() })
}

///
/// Ids are placed into vendor urls so only allow characters that can't change the url's meaning.
///
pub fn path_id<'a>(name: &str, value: &'a str) -> Result<&'a str, InternalError> {
    let value = required_param(name, Some(value))?;

    match value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        true  => Ok(value),
        false => Err(InternalError::RequestFormatError { reason: format!("{} '{}' contains invalid characters", name, value) }),
    }
}
