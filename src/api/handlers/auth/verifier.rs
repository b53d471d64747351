//! External identity assertion verification.
//!
//! Google ID tokens are resolved against the `tokeninfo` endpoint and the
//! returned claims are then checked offline: audience must match the
//! configured client id, the token must be unexpired and the email must be
//! reported verified. A token is either fully trusted or rejected; there is
//! no partial acceptance. A static source exists for tests and local
//! development, mirroring how keysets can be pinned instead of fetched.

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use url::Url;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const TOKENINFO_TIMEOUT: Duration = Duration::from_secs(5);

/// Verified identity extracted from an accepted assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAssertion {
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    /// Stable subject identifier issued by the provider.
    pub subject: String,
}

#[derive(Debug, Error)]
pub enum AssertionError {
    /// The assertion is malformed, expired, or not meant for us.
    #[error("invalid identity assertion: {0}")]
    Invalid(String),
    /// The upstream verifier could not be reached; distinct from a policy
    /// rejection so handlers can return 502 instead of 401.
    #[error("identity verifier unavailable: {0}")]
    Unavailable(String),
}

/// Claims subset returned by the `tokeninfo` endpoint. All values arrive as
/// strings on the wire.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AssertionClaims {
    pub(crate) aud: String,
    pub(crate) exp: String,
    pub(crate) sub: String,
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) email_verified: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) picture: Option<String>,
}

#[derive(Debug)]
enum AssertionSource {
    /// Resolve tokens against Google's tokeninfo endpoint.
    Google { client: Client },
    /// Fixed token -> claims map, never refreshed.
    Static { assertions: HashMap<String, AssertionClaims> },
}

/// Verifies identity assertions against a configured expected audience.
#[derive(Debug)]
pub struct AssertionVerifier {
    source: AssertionSource,
    audience: String,
}

impl AssertionVerifier {
    /// Verifier backed by Google's tokeninfo endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new_google(audience: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(TOKENINFO_TIMEOUT)
            .build()?;
        Ok(Self {
            source: AssertionSource::Google { client },
            audience,
        })
    }

    /// Verifier backed by a fixed token map; used in tests and local
    /// development where no provider is reachable.
    #[must_use]
    pub(crate) fn new_static(
        audience: String,
        assertions: HashMap<String, AssertionClaims>,
    ) -> Self {
        Self {
            source: AssertionSource::Static { assertions },
            audience,
        }
    }

    /// Resolve and validate an assertion token.
    ///
    /// # Errors
    /// `Invalid` for any signature/audience/expiry/claim problem,
    /// `Unavailable` when the upstream verifier cannot be reached.
    pub async fn verify(&self, token: &str) -> Result<VerifiedAssertion, AssertionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AssertionError::Invalid("empty assertion token".to_string()));
        }

        let claims = match &self.source {
            AssertionSource::Google { client } => fetch_claims(client, token).await?,
            AssertionSource::Static { assertions } => assertions
                .get(token)
                .cloned()
                .ok_or_else(|| AssertionError::Invalid("unknown assertion token".to_string()))?,
        };

        check_claims(&claims, &self.audience, unix_now())?;

        Ok(VerifiedAssertion {
            email: claims.email,
            name: claims.name.unwrap_or_default(),
            avatar_url: claims.picture,
            subject: claims.sub,
        })
    }
}

async fn fetch_claims(client: &Client, token: &str) -> Result<AssertionClaims, AssertionError> {
    let url = Url::parse_with_params(TOKENINFO_URL, &[("id_token", token)])
        .map_err(|err| AssertionError::Invalid(format!("malformed token: {err}")))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| AssertionError::Unavailable(err.to_string()))?;

    // tokeninfo answers 4xx for any token it does not recognize.
    if response.status().is_client_error() {
        return Err(AssertionError::Invalid(
            "assertion rejected by provider".to_string(),
        ));
    }
    if !response.status().is_success() {
        return Err(AssertionError::Unavailable(format!(
            "provider answered {}",
            response.status()
        )));
    }

    response
        .json::<AssertionClaims>()
        .await
        .map_err(|err| AssertionError::Invalid(format!("malformed claims: {err}")))
}

/// Offline checks applied to claims the provider vouched for.
pub(crate) fn check_claims(
    claims: &AssertionClaims,
    audience: &str,
    now_unix: i64,
) -> Result<(), AssertionError> {
    if claims.aud != audience {
        return Err(AssertionError::Invalid(
            "assertion audience mismatch".to_string(),
        ));
    }
    let expires = claims
        .exp
        .parse::<i64>()
        .map_err(|_| AssertionError::Invalid("malformed expiry claim".to_string()))?;
    if expires <= now_unix {
        return Err(AssertionError::Invalid("assertion expired".to_string()));
    }
    if claims.email.trim().is_empty() {
        return Err(AssertionError::Invalid("missing email claim".to_string()));
    }
    if claims.email_verified.as_deref() != Some("true") {
        return Err(AssertionError::Invalid(
            "provider email not verified".to_string(),
        ));
    }
    Ok(())
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_AUDIENCE: &str = "melodymart-web.apps.googleusercontent.com";

    pub(crate) fn claims(email: &str) -> AssertionClaims {
        AssertionClaims {
            aud: TEST_AUDIENCE.to_string(),
            exp: (unix_now() + 3600).to_string(),
            sub: "113366528911".to_string(),
            email: email.to_string(),
            email_verified: Some("true".to_string()),
            name: Some("Bea Ortiz".to_string()),
            picture: Some("https://lh3.example.com/bea".to_string()),
        }
    }

    pub(crate) fn static_verifier(token: &str, email: &str) -> AssertionVerifier {
        let mut assertions = HashMap::new();
        assertions.insert(token.to_string(), claims(email));
        AssertionVerifier::new_static(TEST_AUDIENCE.to_string(), assertions)
    }

    #[test]
    fn check_claims_accepts_valid() {
        assert!(check_claims(&claims("bea@example.com"), TEST_AUDIENCE, unix_now()).is_ok());
    }

    #[test]
    fn check_claims_rejects_audience_mismatch() {
        let claims = claims("bea@example.com");
        let result = check_claims(&claims, "another-client-id", unix_now());
        assert!(matches!(result, Err(AssertionError::Invalid(_))));
    }

    #[test]
    fn check_claims_rejects_expired() {
        let mut claims = claims("bea@example.com");
        claims.exp = (unix_now() - 10).to_string();
        let result = check_claims(&claims, TEST_AUDIENCE, unix_now());
        assert!(matches!(result, Err(AssertionError::Invalid(_))));
    }

    #[test]
    fn check_claims_rejects_unverified_email() {
        let mut claims = claims("bea@example.com");
        claims.email_verified = Some("false".to_string());
        let result = check_claims(&claims, TEST_AUDIENCE, unix_now());
        assert!(matches!(result, Err(AssertionError::Invalid(_))));

        claims.email_verified = None;
        let result = check_claims(&claims, TEST_AUDIENCE, unix_now());
        assert!(matches!(result, Err(AssertionError::Invalid(_))));
    }

    #[tokio::test]
    async fn static_verifier_resolves_known_tokens_only() {
        let verifier = static_verifier("good-token", "bea@example.com");

        let assertion = verifier.verify("good-token").await.unwrap();
        assert_eq!(assertion.email, "bea@example.com");
        assert_eq!(assertion.subject, "113366528911");

        let result = verifier.verify("bad-token").await;
        assert!(matches!(result, Err(AssertionError::Invalid(_))));

        let result = verifier.verify("  ").await;
        assert!(matches!(result, Err(AssertionError::Invalid(_))));
    }
}
