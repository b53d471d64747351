use crate::account::repo::{self, AdminBootstrap};
use crate::api::handlers::auth;
use anyhow::{bail, Context, Result};
use sqlx::postgres::PgPoolOptions;

#[derive(Debug)]
pub struct Args {
    pub dsn: String,
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Seed or promote the admin account, then exit.
///
/// The review workflow is only reachable by admins, so a fresh deployment
/// needs this one-shot action before any account can be reviewed.
/// # Errors
/// Returns an error on invalid input or when the database is unreachable.
pub async fn execute(args: Args) -> Result<()> {
    let email = auth::normalize_email(&args.email);
    if !auth::valid_email(&email) {
        bail!("invalid admin email: {}", args.email);
    }
    if args.password.len() < auth::MIN_PASSWORD_LEN {
        bail!(
            "admin password must be at least {} characters",
            auth::MIN_PASSWORD_LEN
        );
    }
    let name = args.name.trim();
    if name.is_empty() {
        bail!("admin name must not be blank");
    }

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&args.dsn)
        .await
        .context("failed to connect to the database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let password_hash = auth::hash_password(&args.password)?;
    match repo::ensure_admin_account(&pool, name, &email, &password_hash).await? {
        AdminBootstrap::Created(account) => {
            println!("Admin account created: {} <{}>", account.name, account.email);
        }
        AdminBootstrap::Promoted(account) => {
            println!(
                "Existing account promoted to admin: {} <{}>",
                account.name, account.email
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_invalid_input_before_touching_the_database() {
        let base = || Args {
            dsn: "postgres://postgres@localhost/melodymart".to_string(),
            email: "admin@melodymart.com".to_string(),
            password: "s3cret-Admin".to_string(),
            name: "Admin User".to_string(),
        };

        let mut bad_email = base();
        bad_email.email = "not-an-email".to_string();
        assert!(execute(bad_email).await.is_err());

        let mut short_password = base();
        short_password.password = "short".to_string();
        assert!(execute(short_password).await.is_err());

        let mut blank_name = base();
        blank_name.name = "   ".to_string();
        assert!(execute(blank_name).await.is_err());
    }
}
