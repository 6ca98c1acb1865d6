//! # Seeding
//!
//! Staff accounts are only created by other staff, so the very first
//! administrator has to be written straight into the staff collection.
//!
//! - Validates the same fields the API validates
//! - Refuses a username already held by any tutor, veterinarian or staff member
//! - Refuses an email already held by another staff member
//! - Appends through the same whole-file rewrite the server uses
use std::path::Path;

use chrono::Utc;
use records::{
    Credentials, Store, StoreError,
    accounts::find_account,
    models::{StaffMember, StaffRole},
    next_id,
    validate::{self, ValidationError},
};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Username {0} is already taken")]
    UsernameTaken(String),

    #[error("Email {0} is already registered to a staff member")]
    EmailTaken(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct NewAdministrator {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

pub fn seed_administrator(
    data_dir: &Path,
    backup: bool,
    admin: NewAdministrator,
) -> Result<StaffMember, SeedError> {
    let username = validate::username(&admin.username)?;
    validate::password(&admin.password)?;
    let name = validate::required("name", &admin.name)?;
    let email = validate::email(&admin.email)?;
    let phone = validate::phone(&admin.phone)?;

    let store = Store::open(data_dir, backup)?;
    if find_account(&store, &username)?.is_some() {
        return Err(SeedError::UsernameTaken(username));
    }

    let member = store.collection::<StaffMember>().modify(|staff| {
        if staff.iter().any(|member| member.email == email) {
            return Err(SeedError::EmailTaken(email.clone()));
        }

        let member = StaffMember {
            id: next_id(staff),
            name,
            email: email.clone(),
            phone,
            role: StaffRole::Administrator,
            active: true,
            credentials: Credentials::new(&username, &admin.password),
            created_at: Utc::now(),
        };
        staff.push(member.clone());

        Ok(member)
    })?;

    info!("Seeded administrator {} in {}", member.id, store.root().display());
    Ok(member)
}

#[cfg(test)]
mod tests {
    use records::models::Role;

    use super::*;

    fn admin(username: &str, email: &str) -> NewAdministrator {
        NewAdministrator {
            username: username.to_string(),
            password: "changeme1".to_string(),
            name: " Clinic   Admin ".to_string(),
            email: email.to_string(),
            phone: "+55 11 99999-0000".to_string(),
        }
    }

    #[test]
    fn test_seed_creates_administrator() {
        let dir = tempfile::tempdir().unwrap();

        let member =
            seed_administrator(dir.path(), false, admin("Admin", "admin@clinic.test")).unwrap();

        assert_eq!(member.id, 1);
        assert_eq!(member.role, StaffRole::Administrator);
        assert_eq!(member.name, "Clinic Admin");
        assert_eq!(member.phone, "5511999990000");

        let store = Store::open(dir.path(), false).unwrap();
        let account = find_account(&store, "admin").unwrap().unwrap();
        assert_eq!(account.role, Role::Staff);
        assert!(account.credentials.verify("changeme1"));
    }

    #[test]
    fn test_seed_refuses_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        seed_administrator(dir.path(), false, admin("admin", "admin@clinic.test")).unwrap();

        assert!(matches!(
            seed_administrator(dir.path(), false, admin("admin", "other@clinic.test")),
            Err(SeedError::UsernameTaken(_))
        ));
        assert!(matches!(
            seed_administrator(dir.path(), false, admin("second", "admin@clinic.test")),
            Err(SeedError::EmailTaken(_))
        ));
    }

    #[test]
    fn test_seed_validates_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut weak = admin("admin", "admin@clinic.test");
        weak.password = "short".to_string();

        assert!(matches!(
            seed_administrator(dir.path(), false, weak),
            Err(SeedError::Invalid(_))
        ));
        assert!(!dir.path().join("staff.json").exists());
    }
}
