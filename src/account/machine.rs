//! Pure account lifecycle transitions.
//!
//! All state changes to an account funnel through the functions here:
//! `apply_profile` for role selection / profile completion and
//! `apply_review` for admin decisions. Both validate before mutating, so a
//! rejected transition leaves the account untouched. The repository wraps
//! them in a row-locked transaction; nothing in this module touches the
//! database.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{Account, Role, VerificationDocument, VerificationStatus};

/// Rejected profile or review transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid role selection")]
    InvalidRole,
    #[error("at least one verification document is required")]
    MissingDocuments,
    #[error("only tutors and repair specialists require verification")]
    NotReviewable,
    #[error("cannot modify admin account status")]
    CannotModifyAdmin,
}

/// Why a login attempt was refused before or after the password check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalBlock {
    Pending,
    Rejected,
}

/// Failures of the credential verification path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("account not found")]
    NotFound,
    #[error("account was created through a different sign-in provider")]
    WrongProvider,
    #[error("account is not approved")]
    NotApproved { reason: ApprovalBlock },
    #[error("invalid credentials")]
    BadCredential,
}

/// Role selection plus the role-specific fields supplied with it.
#[derive(Debug, Clone, Default)]
pub struct ProfileSubmission {
    pub role: Option<Role>,
    pub specialization: Option<String>,
    pub experience_years: Option<i32>,
    pub hourly_rate: Option<f64>,
    pub bio: Option<String>,
    pub service_types: Vec<String>,
    pub certifications: Vec<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub documents: Vec<DocumentUpload>,
}

/// A stored-file reference handed back by the upload collaborator.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: String,
    pub url: String,
}

/// Review outcome an admin can hand down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    #[must_use]
    pub const fn as_status(self) -> VerificationStatus {
        match self {
            Self::Approved => VerificationStatus::Approved,
            Self::Rejected => VerificationStatus::Rejected,
        }
    }
}

/// Apply role selection and profile completion to an account.
///
/// Customers are auto-approved. Professional roles require at least one
/// document and enter `pending_approval`, except when an already-approved
/// account re-submits the same role, which only refreshes fields. A
/// rejected professional re-submitting re-enters the queue.
///
/// # Errors
/// `CannotModifyAdmin` when the account is an admin, `InvalidRole` for
/// non-selectable roles, `MissingDocuments` for a professional submission
/// without evidence. The account is unchanged on error.
pub fn apply_profile(
    account: &mut Account,
    submission: ProfileSubmission,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    if account.role == Role::Admin {
        return Err(TransitionError::CannotModifyAdmin);
    }
    let Some(role) = submission.role else {
        return Err(TransitionError::InvalidRole);
    };
    if !role.selectable() {
        return Err(TransitionError::InvalidRole);
    }
    if role.professional() && submission.documents.is_empty() {
        return Err(TransitionError::MissingDocuments);
    }

    // Validation passed; safe to mutate from here on.
    let keep_approved =
        account.role == role && account.verification_status == VerificationStatus::Approved;

    clear_role_fields(account);
    account.role = role;
    account.profile_completed = true;

    match role {
        Role::Customer => {
            account.verification_status = VerificationStatus::Approved;
            account.phone = submission.phone;
            account.address = submission.address;
        }
        Role::Tutor => {
            account.verification_status = if keep_approved {
                VerificationStatus::Approved
            } else {
                VerificationStatus::PendingApproval
            };
            account.specialization = submission.specialization;
            account.experience_years = submission.experience_years;
            account.hourly_rate = submission.hourly_rate;
            account.bio = submission.bio;
        }
        Role::RepairSpecialist => {
            account.verification_status = if keep_approved {
                VerificationStatus::Approved
            } else {
                VerificationStatus::PendingApproval
            };
            account.service_types = submission.service_types;
            account.certifications = submission.certifications;
        }
        // Unreachable: selectable() filtered these out above.
        Role::Pending | Role::Admin => return Err(TransitionError::InvalidRole),
    }

    account.documents = submission
        .documents
        .into_iter()
        .map(|doc| VerificationDocument {
            filename: doc.filename,
            url: doc.url,
            uploaded_at: now,
        })
        .collect();
    account.updated_at = now;

    Ok(())
}

/// Apply an admin review decision to a professional account.
///
/// Reversing an already-approved or already-rejected account is an explicit
/// override; when the admin supplies no notes, an override line is appended
/// to `admin_notes` so the reversal stays on record.
///
/// # Errors
/// `CannotModifyAdmin` when the target is an admin, `NotReviewable` when it
/// holds any other non-professional role. The account is unchanged on error.
pub fn apply_review(
    account: &mut Account,
    decision: ReviewDecision,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    if account.role == Role::Admin {
        return Err(TransitionError::CannotModifyAdmin);
    }
    if !account.role.professional() {
        return Err(TransitionError::NotReviewable);
    }

    let previous = account.verification_status;
    let next = decision.as_status();
    let overriding = previous != next
        && matches!(
            previous,
            VerificationStatus::Approved | VerificationStatus::Rejected
        );

    account.verification_status = next;
    if notes.is_some() {
        account.admin_notes = notes;
    } else if overriding {
        let line = format!(
            "Override on {}: {} -> {}",
            now.format("%Y-%m-%d"),
            previous.as_db(),
            next.as_db()
        );
        account.admin_notes = Some(match account.admin_notes.take() {
            Some(existing) => format!("{existing}\n{line}"),
            None => line,
        });
    }
    account.updated_at = now;

    Ok(())
}

/// Provider and approval gates applied before any password comparison.
///
/// # Errors
/// `WrongProvider` for accounts created through another identity provider,
/// `NotApproved` for rejected or still-pending professional accounts.
pub fn login_gates(
    account: &Account,
    via: super::models::AuthProvider,
) -> Result<(), CredentialError> {
    if account.provider != via {
        return Err(CredentialError::WrongProvider);
    }
    match account.verification_status {
        VerificationStatus::Rejected => Err(CredentialError::NotApproved {
            reason: ApprovalBlock::Rejected,
        }),
        VerificationStatus::PendingApproval => Err(CredentialError::NotApproved {
            reason: ApprovalBlock::Pending,
        }),
        VerificationStatus::None | VerificationStatus::Approved => Ok(()),
    }
}

/// Structural invariants every persisted account must satisfy. Exercised by
/// the randomized transition tests.
#[must_use]
pub fn invariants_hold(account: &Account) -> bool {
    use super::models::AuthProvider;

    let status_ok = match account.role {
        Role::Tutor | Role::RepairSpecialist => matches!(
            account.verification_status,
            VerificationStatus::PendingApproval
                | VerificationStatus::Approved
                | VerificationStatus::Rejected
        ),
        Role::Customer => account.verification_status == VerificationStatus::Approved,
        Role::Pending | Role::Admin => true,
    };
    let provider_ok = match account.provider {
        AuthProvider::Local => account.password_hash.is_some() && account.google_sub.is_none(),
        AuthProvider::Google => account.password_hash.is_none() && account.google_sub.is_some(),
    };
    status_ok && provider_ok
}

fn clear_role_fields(account: &mut Account) {
    account.specialization = None;
    account.experience_years = None;
    account.hourly_rate = None;
    account.bio = None;
    account.service_types = Vec::new();
    account.certifications = Vec::new();
    account.phone = None;
    account.address = None;
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{google_customer, local_account};
    use super::*;
    use crate::account::models::{AuthProvider, Role, VerificationStatus};
    use chrono::Utc;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn one_document() -> Vec<DocumentUpload> {
        vec![DocumentUpload {
            filename: "diploma.pdf".to_string(),
            url: "https://files.melodymart.dev/diploma.pdf".to_string(),
        }]
    }

    fn tutor_submission(documents: Vec<DocumentUpload>) -> ProfileSubmission {
        ProfileSubmission {
            role: Some(Role::Tutor),
            specialization: Some("Violin".to_string()),
            experience_years: Some(6),
            hourly_rate: Some(45.0),
            bio: Some("Conservatory trained".to_string()),
            documents,
            ..ProfileSubmission::default()
        }
    }

    #[test]
    fn customer_is_auto_approved() {
        let mut account = local_account();
        let submission = ProfileSubmission {
            role: Some(Role::Customer),
            phone: Some("+45 1234 5678".to_string()),
            ..ProfileSubmission::default()
        };
        apply_profile(&mut account, submission, Utc::now()).unwrap();
        assert_eq!(account.role, Role::Customer);
        assert_eq!(account.verification_status, VerificationStatus::Approved);
        assert!(account.is_verified());
        assert!(account.profile_completed);
    }

    #[test]
    fn tutor_without_documents_fails_and_leaves_state_unchanged() {
        let mut account = local_account();
        let before = account.clone();
        let result = apply_profile(&mut account, tutor_submission(Vec::new()), Utc::now());
        assert_eq!(result, Err(TransitionError::MissingDocuments));
        assert_eq!(account, before);
    }

    #[test]
    fn tutor_with_document_enters_pending_approval() {
        let mut account = local_account();
        apply_profile(&mut account, tutor_submission(one_document()), Utc::now()).unwrap();
        assert_eq!(account.role, Role::Tutor);
        assert_eq!(
            account.verification_status,
            VerificationStatus::PendingApproval
        );
        assert!(!account.is_verified());
        assert_eq!(account.documents.len(), 1);
    }

    #[test]
    fn selecting_pending_or_admin_is_invalid() {
        let mut account = local_account();
        for role in [Some(Role::Pending), Some(Role::Admin), None] {
            let submission = ProfileSubmission {
                role,
                ..ProfileSubmission::default()
            };
            let result = apply_profile(&mut account, submission, Utc::now());
            assert_eq!(result, Err(TransitionError::InvalidRole));
        }
    }

    #[test]
    fn review_approves_and_rejects_professionals() {
        let mut account = local_account();
        apply_profile(&mut account, tutor_submission(one_document()), Utc::now()).unwrap();

        apply_review(
            &mut account,
            ReviewDecision::Approved,
            Some("Looks good".to_string()),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(account.verification_status, VerificationStatus::Approved);
        assert!(account.is_verified());
        assert_eq!(account.admin_notes.as_deref(), Some("Looks good"));

        apply_review(&mut account, ReviewDecision::Rejected, None, Utc::now()).unwrap();
        assert_eq!(account.verification_status, VerificationStatus::Rejected);
        assert!(!account.is_verified());
        // Reversing a decision without notes appends an override line.
        let notes = account.admin_notes.as_deref().unwrap();
        assert!(notes.starts_with("Looks good\nOverride on "));
        assert!(notes.ends_with("approved -> rejected"));
    }

    #[test]
    fn terminal_override_without_notes_is_recorded() {
        let mut account = local_account();
        apply_profile(&mut account, tutor_submission(one_document()), Utc::now()).unwrap();
        apply_review(&mut account, ReviewDecision::Approved, None, Utc::now()).unwrap();
        assert_eq!(account.admin_notes, None);

        apply_review(&mut account, ReviewDecision::Rejected, None, Utc::now()).unwrap();
        let notes = account.admin_notes.as_deref().unwrap();
        assert!(notes.starts_with("Override on "));
        assert!(notes.ends_with("approved -> rejected"));

        // Re-applying the same decision is not an override and adds nothing.
        let before = account.admin_notes.clone();
        apply_review(&mut account, ReviewDecision::Rejected, None, Utc::now()).unwrap();
        assert_eq!(account.admin_notes, before);
    }

    #[test]
    fn admins_cannot_change_their_own_role() {
        let mut account = local_account();
        account.role = Role::Admin;
        let before = account.clone();
        let submission = ProfileSubmission {
            role: Some(Role::Customer),
            ..ProfileSubmission::default()
        };
        let result = apply_profile(&mut account, submission, Utc::now());
        assert_eq!(result, Err(TransitionError::CannotModifyAdmin));
        assert_eq!(account, before);
    }

    #[test]
    fn review_refuses_customers() {
        let mut account = google_customer();
        let before = account.clone();
        let result = apply_review(&mut account, ReviewDecision::Approved, None, Utc::now());
        assert_eq!(result, Err(TransitionError::NotReviewable));
        assert_eq!(account, before);
    }

    #[test]
    fn review_refuses_admin_targets() {
        let mut account = local_account();
        account.role = Role::Admin;
        let result = apply_review(&mut account, ReviewDecision::Rejected, None, Utc::now());
        assert_eq!(result, Err(TransitionError::CannotModifyAdmin));
        assert_eq!(account.role, Role::Admin);
    }

    #[test]
    fn rejected_professional_resubmission_reenters_queue() {
        let mut account = local_account();
        apply_profile(&mut account, tutor_submission(one_document()), Utc::now()).unwrap();
        apply_review(&mut account, ReviewDecision::Rejected, None, Utc::now()).unwrap();

        apply_profile(&mut account, tutor_submission(one_document()), Utc::now()).unwrap();
        assert_eq!(
            account.verification_status,
            VerificationStatus::PendingApproval
        );
    }

    #[test]
    fn approved_professional_resubmission_keeps_approval() {
        let mut account = local_account();
        apply_profile(&mut account, tutor_submission(one_document()), Utc::now()).unwrap();
        apply_review(&mut account, ReviewDecision::Approved, None, Utc::now()).unwrap();

        let mut refresh = tutor_submission(one_document());
        refresh.hourly_rate = Some(60.0);
        apply_profile(&mut account, refresh, Utc::now()).unwrap();
        assert_eq!(account.verification_status, VerificationStatus::Approved);
        assert_eq!(account.hourly_rate, Some(60.0));
    }

    #[test]
    fn customer_becoming_tutor_reenters_queue() {
        let mut account = google_customer();
        apply_profile(&mut account, tutor_submission(one_document()), Utc::now()).unwrap();
        assert_eq!(account.role, Role::Tutor);
        assert_eq!(
            account.verification_status,
            VerificationStatus::PendingApproval
        );
        // Customer fields are cleared on the role change.
        assert_eq!(account.phone, None);
    }

    #[test]
    fn login_gates_block_wrong_provider_before_anything_else() {
        let account = google_customer();
        assert_eq!(
            login_gates(&account, AuthProvider::Local),
            Err(CredentialError::WrongProvider)
        );
    }

    #[test]
    fn login_gates_block_unapproved_professionals() {
        let mut account = local_account();
        apply_profile(
            &mut account,
            tutor_submission(one_document()),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(
            login_gates(&account, AuthProvider::Local),
            Err(CredentialError::NotApproved {
                reason: ApprovalBlock::Pending
            })
        );

        apply_review(&mut account, ReviewDecision::Rejected, None, Utc::now()).unwrap();
        assert_eq!(
            login_gates(&account, AuthProvider::Local),
            Err(CredentialError::NotApproved {
                reason: ApprovalBlock::Rejected
            })
        );

        apply_review(&mut account, ReviewDecision::Approved, None, Utc::now()).unwrap();
        assert_eq!(login_gates(&account, AuthProvider::Local), Ok(()));
    }

    #[test]
    fn login_gates_allow_fresh_pending_accounts() {
        let account = local_account();
        assert_eq!(login_gates(&account, AuthProvider::Local), Ok(()));
    }

    #[test]
    fn random_transition_sequences_never_violate_invariants() {
        let mut rng = StdRng::seed_from_u64(0x4d65_6c6f);
        for _ in 0..200 {
            let mut account = if rng.gen_bool(0.5) {
                local_account()
            } else {
                google_customer()
            };
            assert!(invariants_hold(&account));
            for _ in 0..rng.gen_range(1..20) {
                let now = Utc::now();
                match rng.gen_range(0..5) {
                    0 => {
                        let submission = ProfileSubmission {
                            role: Some(Role::Customer),
                            ..ProfileSubmission::default()
                        };
                        let _ = apply_profile(&mut account, submission, now);
                    }
                    1 | 2 => {
                        let role = if rng.gen_bool(0.5) {
                            Role::Tutor
                        } else {
                            Role::RepairSpecialist
                        };
                        let documents = if rng.gen_bool(0.7) {
                            one_document()
                        } else {
                            Vec::new()
                        };
                        let submission = ProfileSubmission {
                            role: Some(role),
                            documents,
                            ..ProfileSubmission::default()
                        };
                        let _ = apply_profile(&mut account, submission, now);
                    }
                    _ => {
                        let decision = if rng.gen_bool(0.5) {
                            ReviewDecision::Approved
                        } else {
                            ReviewDecision::Rejected
                        };
                        let _ = apply_review(&mut account, decision, None, now);
                    }
                }
                assert!(
                    invariants_hold(&account),
                    "invariant violated for {account:?}"
                );
            }
        }
    }
}
