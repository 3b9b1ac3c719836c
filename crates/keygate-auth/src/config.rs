//! Authentication configuration.

/// Configuration for the authentication service.
///
/// Refresh tokens are deliberately short-lived: the single stored
/// token per principal is the only revocation mechanism, so there is
/// no revocation list to lean on.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token lifetime in seconds (default: 300 = 5 minutes).
    pub access_token_lifetime_secs: u64,
    /// Refresh token lifetime in seconds (default: 1200 = 20 minutes).
    pub refresh_token_lifetime_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime_secs: 300,
            refresh_token_lifetime_secs: 1200,
        }
    }
}
