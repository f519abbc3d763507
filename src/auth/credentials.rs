/// Credential extraction from the `Authorization` header.
///
/// The header must be exactly `<Scheme> <credential>`: two whitespace-separated
/// fields with a case-sensitive scheme. Schemes never substitute for each other.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

pub const BEARER_SCHEME: &str = "Bearer";
pub const API_KEY_SCHEME: &str = "ApiKey";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no usable credential in authorization header")]
pub struct CredentialMissing;

pub fn extract<'a>(header_value: &'a str, expected_scheme: &str) -> Result<&'a str, CredentialMissing> {
    let mut fields = header_value.split_whitespace();

    match (fields.next(), fields.next(), fields.next()) {
        (Some(scheme), Some(credential), None) if scheme == expected_scheme => Ok(credential),
        _ => Err(CredentialMissing),
    }
}

pub fn from_headers(headers: &HeaderMap, expected_scheme: &str) -> Result<String, CredentialMissing> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(CredentialMissing)?
        .to_str()
        .map_err(|_| CredentialMissing)?;

    extract(value, expected_scheme).map(str::to_string)
}

pub fn bearer_token(headers: &HeaderMap) -> Result<String, CredentialMissing> {
    from_headers(headers, BEARER_SCHEME)
}

pub fn api_key(headers: &HeaderMap) -> Result<String, CredentialMissing> {
    from_headers(headers, API_KEY_SCHEME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract("Bearer abc123", BEARER_SCHEME), Ok("abc123"));
    }

    #[test]
    fn test_scheme_mismatch_fails() {
        assert_eq!(extract("ApiKey abc123", BEARER_SCHEME), Err(CredentialMissing));
        assert_eq!(extract("Bearer abc123", API_KEY_SCHEME), Err(CredentialMissing));
    }

    #[test]
    fn test_wrong_field_count_fails() {
        assert_eq!(extract("Bearer", BEARER_SCHEME), Err(CredentialMissing));
        assert_eq!(extract("Bearer a b", BEARER_SCHEME), Err(CredentialMissing));
        assert_eq!(extract("", BEARER_SCHEME), Err(CredentialMissing));
    }

    #[test]
    fn test_scheme_is_case_sensitive() {
        assert_eq!(extract("bearer abc123", BEARER_SCHEME), Err(CredentialMissing));
        assert_eq!(extract("apikey abc123", API_KEY_SCHEME), Err(CredentialMissing));
    }

    #[test]
    fn test_extra_whitespace_tolerated() {
        assert_eq!(extract("  Bearer \t abc123  ", BEARER_SCHEME), Ok("abc123"));
    }

    #[test]
    fn test_header_helpers() {
        assert_eq!(bearer_token(&headers("Bearer tok")), Ok("tok".to_string()));
        assert_eq!(api_key(&headers("ApiKey svc-key-123")), Ok("svc-key-123".to_string()));
        assert_eq!(api_key(&headers("Bearer svc-key-123")), Err(CredentialMissing));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(CredentialMissing));
    }
}
