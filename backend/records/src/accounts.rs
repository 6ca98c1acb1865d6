//! Username lookup across the three user collections.
use crate::{
    Credentials, Store, StoreError,
    models::{Role, StaffMember, Tutor, Veterinarian},
};

/// A login candidate found by username.
pub struct Account {
    pub role: Role,
    pub user_id: u64,
    pub active: bool,
    pub credentials: Credentials,
}

/// Usernames are unique across all three user collections.
pub fn find_account(store: &Store, username: &str) -> Result<Option<Account>, StoreError> {
    if let Some(tutor) = store
        .collection::<Tutor>()
        .load()?
        .into_iter()
        .find(|t| t.credentials.username == username)
    {
        return Ok(Some(Account {
            role: Role::Tutor,
            user_id: tutor.id,
            active: true,
            credentials: tutor.credentials,
        }));
    }

    if let Some(vet) = store
        .collection::<Veterinarian>()
        .load()?
        .into_iter()
        .find(|v| v.credentials.username == username)
    {
        return Ok(Some(Account {
            role: Role::Veterinarian,
            user_id: vet.id,
            active: vet.active,
            credentials: vet.credentials,
        }));
    }

    Ok(store
        .collection::<StaffMember>()
        .load()?
        .into_iter()
        .find(|s| s.credentials.username == username)
        .map(|member| Account {
            role: Role::Staff,
            user_id: member.id,
            active: member.active,
            credentials: member.credentials,
        }))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_lookup_spans_collections() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path(), false).unwrap();

        store
            .collection::<StaffMember>()
            .save(&[StaffMember {
                id: 3,
                name: "Root".into(),
                email: "root@clinic.test".into(),
                phone: "5511999990000".into(),
                role: crate::models::StaffRole::Administrator,
                active: false,
                credentials: Credentials::new("root", "changeme1"),
                created_at: Utc::now(),
            }])
            .unwrap();

        let account = find_account(&store, "root").unwrap().unwrap();
        assert_eq!(account.role, Role::Staff);
        assert_eq!(account.user_id, 3);
        assert!(!account.active);
        assert!(account.credentials.verify("changeme1"));

        assert!(find_account(&store, "nobody").unwrap().is_none());
    }
}
