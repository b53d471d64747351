//! Postgres repository for accounts.
//!
//! Mutating operations load the row with `SELECT ... FOR UPDATE`, apply the
//! pure transition from [`machine`](super::machine) and write the result in
//! the same transaction, so concurrent transitions against one account
//! serialize and no observer can see a half-applied state.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::Instrument;
use uuid::Uuid;

use super::machine::{self, ProfileSubmission, ReviewDecision, TransitionError};
use super::models::{Account, Role};

const ACCOUNT_COLUMNS: &str = r"
    id, name, email, avatar_url, provider, google_sub, password_hash,
    role, profile_completed, verification_status, documents,
    specialization, experience_years, hourly_rate, bio,
    service_types, certifications, phone, address, admin_notes,
    created_at, updated_at
";

/// Outcome when inserting a new account.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Box<Account>),
    EmailTaken,
}

/// Outcome of the admin bootstrap.
#[derive(Debug)]
pub enum AdminBootstrap {
    Created(Box<Account>),
    Promoted(Box<Account>),
}

/// Outcome of a profile-completion transition.
#[derive(Debug)]
pub enum ProfileOutcome {
    Updated(Box<Account>),
    NotFound,
    Refused(TransitionError),
}

/// Outcome of an admin review transition.
#[derive(Debug)]
pub enum ReviewOutcome {
    Updated(Box<Account>),
    NotFound,
    Refused(TransitionError),
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

pub async fn fetch_account(pool: &PgPool, account_id: Uuid) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, Account>(&query)
        .bind(account_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch account by id")
}

/// Lookup on the normalized (trimmed, lowercased) email.
pub async fn fetch_by_email(pool: &PgPool, email_normalized: &str) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, Account>(&query)
        .bind(email_normalized)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch account by email")
}

/// Insert a local signup: role stays `pending` until profile completion.
pub async fn create_local_account(
    pool: &PgPool,
    name: &str,
    email_normalized: &str,
    password_hash: &str,
) -> Result<CreateOutcome> {
    let query = format!(
        r"
        INSERT INTO accounts
            (id, name, email, provider, password_hash, role, profile_completed,
             verification_status, documents)
        VALUES ($1, $2, $3, 'local', $4, 'pending', FALSE, 'none', '[]'::jsonb)
        RETURNING {ACCOUNT_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query_as::<_, Account>(&query)
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(email_normalized)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(account) => Ok(CreateOutcome::Created(Box::new(account))),
        Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::EmailTaken),
        Err(err) => Err(err).context("failed to insert local account"),
    }
}

/// Insert an account for a first-time Google login. Customers are
/// auto-approved, so the row is born with a completed profile.
pub async fn create_google_account(
    pool: &PgPool,
    name: &str,
    email_normalized: &str,
    avatar_url: Option<&str>,
    google_sub: &str,
) -> Result<CreateOutcome> {
    let query = format!(
        r"
        INSERT INTO accounts
            (id, name, email, avatar_url, provider, google_sub, role,
             profile_completed, verification_status, documents)
        VALUES ($1, $2, $3, $4, 'google', $5, 'customer', TRUE, 'approved', '[]'::jsonb)
        RETURNING {ACCOUNT_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query_as::<_, Account>(&query)
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(email_normalized)
        .bind(avatar_url)
        .bind(google_sub)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(account) => Ok(CreateOutcome::Created(Box::new(account))),
        Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::EmailTaken),
        Err(err) => Err(err).context("failed to insert google account"),
    }
}

/// Insert or promote the bootstrap admin account.
///
/// A fresh database has no way to mint an admin through the API, so the
/// `create-admin` action seeds one here. If the email already exists the row
/// is promoted to an approved admin in place (credentials are left alone).
pub async fn ensure_admin_account(
    pool: &PgPool,
    name: &str,
    email_normalized: &str,
    password_hash: &str,
) -> Result<AdminBootstrap> {
    let mut tx = pool
        .begin()
        .await
        .context("failed to begin admin bootstrap transaction")?;

    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1 FOR UPDATE");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let existing = sqlx::query_as::<_, Account>(&query)
        .bind(email_normalized)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to lock admin row")?;

    let account = if let Some(existing) = existing {
        let query = format!(
            r"
            UPDATE accounts
            SET role = 'admin', profile_completed = TRUE,
                verification_status = 'approved', updated_at = $2
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
        "
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query.as_str()
        );
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(existing.id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .instrument(span)
            .await
            .context("failed to promote admin account")?;
        AdminBootstrap::Promoted(Box::new(account))
    } else {
        let query = format!(
            r"
            INSERT INTO accounts
                (id, name, email, provider, password_hash, role, profile_completed,
                 verification_status, documents)
            VALUES ($1, $2, $3, 'local', $4, 'admin', TRUE, 'approved', '[]'::jsonb)
            RETURNING {ACCOUNT_COLUMNS}
        "
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query.as_str()
        );
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(Uuid::now_v7())
            .bind(name)
            .bind(email_normalized)
            .bind(password_hash)
            .fetch_one(&mut *tx)
            .instrument(span)
            .await
            .context("failed to insert admin account")?;
        AdminBootstrap::Created(Box::new(account))
    };

    tx.commit()
        .await
        .context("failed to commit admin bootstrap transaction")?;
    Ok(account)
}

/// Run the profile-completion transition under a row lock.
pub async fn complete_profile(
    pool: &PgPool,
    account_id: Uuid,
    submission: ProfileSubmission,
) -> Result<ProfileOutcome> {
    let mut tx = pool
        .begin()
        .await
        .context("failed to begin profile transaction")?;

    let Some(mut account) = lock_account(&mut tx, account_id).await? else {
        tx.rollback()
            .await
            .context("failed to rollback profile transaction")?;
        return Ok(ProfileOutcome::NotFound);
    };

    if let Err(denied) = machine::apply_profile(&mut account, submission, Utc::now()) {
        tx.rollback()
            .await
            .context("failed to rollback profile transaction")?;
        return Ok(ProfileOutcome::Refused(denied));
    }

    write_profile(&mut tx, &account).await?;
    tx.commit()
        .await
        .context("failed to commit profile transaction")?;
    Ok(ProfileOutcome::Updated(Box::new(account)))
}

/// Run an admin review decision under a row lock.
pub async fn review_account(
    pool: &PgPool,
    account_id: Uuid,
    decision: ReviewDecision,
    notes: Option<String>,
) -> Result<ReviewOutcome> {
    let mut tx = pool
        .begin()
        .await
        .context("failed to begin review transaction")?;

    let Some(mut account) = lock_account(&mut tx, account_id).await? else {
        tx.rollback()
            .await
            .context("failed to rollback review transaction")?;
        return Ok(ReviewOutcome::NotFound);
    };

    if let Err(denied) = machine::apply_review(&mut account, decision, notes, Utc::now()) {
        tx.rollback()
            .await
            .context("failed to rollback review transaction")?;
        return Ok(ReviewOutcome::Refused(denied));
    }

    let query = r"
        UPDATE accounts
        SET verification_status = $2, admin_notes = $3, updated_at = $4
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account.id)
        .bind(account.verification_status.as_db())
        .bind(account.admin_notes.as_deref())
        .bind(account.updated_at)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to update review state")?;

    tx.commit()
        .await
        .context("failed to commit review transaction")?;
    Ok(ReviewOutcome::Updated(Box::new(account)))
}

/// Professional accounts waiting on review, newest first.
pub async fn list_pending(pool: &PgPool) -> Result<Vec<Account>> {
    let query = format!(
        r"
        SELECT {ACCOUNT_COLUMNS}
        FROM accounts
        WHERE role IN ('tutor', 'repair_specialist')
          AND verification_status = 'pending_approval'
        ORDER BY created_at DESC
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, Account>(&query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list pending accounts")
}

/// All accounts, optionally filtered by role and/or approval, newest first.
pub async fn list_accounts(
    pool: &PgPool,
    role: Option<Role>,
    verified: Option<bool>,
) -> Result<Vec<Account>> {
    let query = format!(
        r"
        SELECT {ACCOUNT_COLUMNS}
        FROM accounts
        WHERE ($1::text IS NULL OR role = $1)
          AND ($2::boolean IS NULL
               OR (verification_status = 'approved') = $2)
        ORDER BY created_at DESC
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, Account>(&query)
        .bind(role.map(Role::as_db))
        .bind(verified)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list accounts")
}

async fn lock_account(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 FOR UPDATE");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, Account>(&query)
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to lock account row")
}

async fn write_profile(tx: &mut Transaction<'_, Postgres>, account: &Account) -> Result<()> {
    let documents =
        serde_json::to_value(&account.documents).context("failed to serialize documents")?;
    let query = r"
        UPDATE accounts
        SET role = $2, profile_completed = $3, verification_status = $4,
            documents = $5, specialization = $6, experience_years = $7,
            hourly_rate = $8, bio = $9, service_types = $10,
            certifications = $11, phone = $12, address = $13, updated_at = $14
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account.id)
        .bind(account.role.as_db())
        .bind(account.profile_completed)
        .bind(account.verification_status.as_db())
        .bind(documents)
        .bind(account.specialization.as_deref())
        .bind(account.experience_years)
        .bind(account.hourly_rate)
        .bind(account.bio.as_deref())
        .bind(&account.service_types)
        .bind(&account.certifications)
        .bind(account.phone.as_deref())
        .bind(account.address.as_deref())
        .bind(account.updated_at)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to update profile state")?;
    Ok(())
}
