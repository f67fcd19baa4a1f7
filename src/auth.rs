//! Basic-Auth credentials for model servers behind an authenticating proxy

use reqwest::RequestBuilder;

/// Immutable username/password pair used for HTTP Basic authentication.
///
/// Constructed once by the caller and reused across any number of calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    /// Create a credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Username half of the credential pair
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password half of the credential pair
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Decorate an outbound request with an `Authorization: Basic
    /// base64(username:password)` header.
    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;

    #[test]
    fn test_accessors() {
        let auth = BasicAuth::new("alice", "s3cret");
        assert_eq!(auth.username(), "alice");
        assert_eq!(auth.password(), "s3cret");
    }

    #[test]
    fn test_apply_sets_basic_auth_header() {
        let auth = BasicAuth::new("user", "pass");
        let builder = reqwest::Client::new().post("http://localhost/api/chat");
        let request = auth.apply(builder).build().unwrap();

        let header = request.headers().get(AUTHORIZATION).unwrap();
        // base64("user:pass")
        assert_eq!(header.to_str().unwrap(), "Basic dXNlcjpwYXNz");
    }
}
