use crate::api;
use anyhow::Result;
use std::sync::Arc;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub google_client_id: String,
    pub session_ttl_seconds: i64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the verifier cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let verifier = api::handlers::auth::AssertionVerifier::new_google(args.google_client_id.clone())?;

    let auth_config = api::handlers::auth::AuthConfig::new(args.google_client_id)
        .with_session_ttl_seconds(args.session_ttl_seconds);

    let auth_state = Arc::new(api::handlers::auth::AuthState::new(auth_config, verifier));

    api::new(args.port, args.dsn, auth_state).await
}
