use itertools::Itertools;
use crate::utils::errors::InternalError;

/// The domain codes the vendor hosts its regional APIs on.
pub const SUPPORTED_DOMAINS: [&str; 6] = ["com", "in", "eu", "sa", "cn", "au"];

pub const DEFAULT_DOMAIN: &str = "com";

/// Replaced in the configured vendor_url with the domain code.
pub const PLACEHOLDER: &str = "{domain}";

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_DOMAINS.contains(&code)
}

pub fn supported_list() -> String {
    SUPPORTED_DOMAINS.iter().join(", ")
}

///
/// Lower-case and validate a domain code. An absent (or blank) code becomes the default, an
/// unknown code is rejected rather than being silently defaulted.
///
pub fn normalise(code: Option<&str>, default: &str) -> Result<String, InternalError> {
    let code = match code.map(str::trim).filter(|code| !code.is_empty()) {
        Some(code) => code.to_lowercase(),
        None => default.to_lowercase(),
    };

    match is_supported(&code) {
        true  => Ok(code),
        false => Err(InternalError::InvalidDomain { domain: code, supported: supported_list() }),
    }
}

///
/// Return the vendor API base url for the domain code, eg. https://desk.zoho.eu/api/v1
///
pub fn resolve_base_url(template: &str, code: Option<&str>, default: &str) -> Result<String, InternalError> {
    let code = normalise(code, default)?;
    Ok(template.replace(PLACEHOLDER, &code))
}
