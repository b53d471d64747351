//! Account lifecycle: data model, pure transitions, authorization checks
//! and the Postgres repository that serializes them.

pub mod guard;
pub mod machine;
pub mod models;
pub mod repo;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use uuid::Uuid;

    use super::models::{Account, AuthProvider, Role, VerificationStatus};

    /// Fresh local signup: role still pending, password hash present.
    pub(crate) fn local_account() -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::now_v7(),
            name: "Alex Reed".to_string(),
            email: "alex@example.com".to_string(),
            avatar_url: None,
            provider: AuthProvider::Local,
            google_sub: None,
            password_hash: Some("$argon2id$stub".to_string()),
            role: Role::Pending,
            profile_completed: false,
            verification_status: VerificationStatus::None,
            documents: Vec::new(),
            specialization: None,
            experience_years: None,
            hourly_rate: None,
            bio: None,
            service_types: Vec::new(),
            certifications: Vec::new(),
            phone: None,
            address: None,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Account as created by a first Google login: auto-approved customer.
    pub(crate) fn google_customer() -> Account {
        let mut account = local_account();
        account.email = "bea@example.com".to_string();
        account.provider = AuthProvider::Google;
        account.google_sub = Some("113366528911".to_string());
        account.password_hash = None;
        account.role = Role::Customer;
        account.profile_completed = true;
        account.verification_status = VerificationStatus::Approved;
        account
    }
}
