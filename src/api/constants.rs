//! Galasa API server endpoints and request constants

/// Token issuing endpoint, relative to the API server URL
pub const TOKENS_PATH: &str = "/auth/tokens";

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("galasactl/", env!("CARGO_PKG_VERSION"));

/// Standard headers
pub mod headers {
    /// Content type for JSON requests
    pub const CONTENT_TYPE_JSON: &str = "application/json";
}

/// Join an API-relative path onto the server URL
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Build the token issuing endpoint URL
pub fn tokens_endpoint(base_url: &str) -> String {
    endpoint(base_url, TOKENS_PATH)
}

/// Build the URL for a single token record
pub fn token_endpoint(base_url: &str, token_id: &str) -> String {
    format!("{}/{}", tokens_endpoint(base_url), urlencoding::encode(token_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_handle_trailing_slashes() {
        assert_eq!(
            tokens_endpoint("https://galasa.example.com/api/"),
            "https://galasa.example.com/api/auth/tokens"
        );
        assert_eq!(
            endpoint("https://galasa.example.com/api", "runs"),
            "https://galasa.example.com/api/runs"
        );
    }

    #[test]
    fn test_token_id_is_encoded() {
        assert_eq!(
            token_endpoint("http://localhost:8080", "abc/def 1"),
            "http://localhost:8080/auth/tokens/abc%2Fdef%201"
        );
    }
}
