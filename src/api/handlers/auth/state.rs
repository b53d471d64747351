//! Auth configuration and shared state.

use super::verifier::AssertionVerifier;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    google_client_id: String,
    session_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(google_client_id: String) -> Self {
        Self {
            google_client_id,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn google_client_id(&self) -> &str {
        &self.google_client_id
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }
}

/// Injected dependencies shared by the auth handlers; constructed once at
/// startup, never ambient.
pub struct AuthState {
    config: AuthConfig,
    verifier: AssertionVerifier,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, verifier: AssertionVerifier) -> Self {
        Self { config, verifier }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn verifier(&self) -> &AssertionVerifier {
        &self.verifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new("client-id".to_string());
        assert_eq!(config.google_client_id(), "client-id");
        assert_eq!(
            config.session_ttl_seconds(),
            super::DEFAULT_SESSION_TTL_SECONDS
        );

        let config = config.with_session_ttl_seconds(3600);
        assert_eq!(config.session_ttl_seconds(), 3600);
    }
}
