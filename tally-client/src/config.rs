//! Client configuration

/// Upstream connection settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GraphQL endpoint (e.g., "https://shop.example.com/admin/api/2025-01/graphql.json")
    pub graphql_url: String,

    /// Access token sent with every upstream request
    pub access_token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl ClientConfig {
    pub fn new(graphql_url: impl Into<String>) -> Self {
        Self {
            graphql_url: graphql_url.into(),
            access_token: None,
            timeout: 30,
        }
    }

    /// Set the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8081/graphql")
    }
}
