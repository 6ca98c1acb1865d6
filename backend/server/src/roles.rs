//! # Staff role transitions
//!
//! Who may hand which staff role to whom.
//!
//! | actor         | target currently         | may assign               |
//! |---------------|--------------------------|--------------------------|
//! | receptionist  | nobody                   | nothing                  |
//! | manager       | new account, receptionist| receptionist, manager    |
//! | administrator | anyone                   | any role                 |
//!
//! Nobody changes their own role, and re-assigning the current role is rejected.
//!
//! Managing an account (activate, deactivate, edit someone else's profile) follows
//! the same ladder: administrators manage everyone else, managers manage
//! receptionists, receptionists manage nobody.
use records::models::StaffRole::{self, Administrator, Manager, Receptionist};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Staff members cannot change their own role or status")]
    SelfChange,

    #[error("A {actor:?} cannot move a {from:?} to {to:?}")]
    NotPermitted {
        actor: StaffRole,
        from: Option<StaffRole>,
        to: StaffRole,
    },

    #[error("A {actor:?} cannot manage a {target:?}")]
    NotManageable { actor: StaffRole, target: StaffRole },

    #[error("Staff member already holds the {0:?} role")]
    Unchanged(StaffRole),
}

#[derive(Clone, Copy, Debug)]
pub struct Actor {
    pub id: u64,
    pub role: StaffRole,
}

/// `current` is `None` when the account is being created.
#[derive(Clone, Copy, Debug)]
pub struct Assignment {
    pub target_id: Option<u64>,
    pub current: Option<StaffRole>,
    pub requested: StaffRole,
}

fn may_assign(actor: StaffRole, current: Option<StaffRole>, requested: StaffRole) -> bool {
    match actor {
        Receptionist => false,
        Manager => {
            matches!(current, None | Some(Receptionist)) && matches!(requested, Receptionist | Manager)
        }
        Administrator => true,
    }
}

fn may_manage(actor: StaffRole, target: StaffRole) -> bool {
    match actor {
        Receptionist => false,
        Manager => target == Receptionist,
        Administrator => true,
    }
}

pub fn check_assignment(actor: Actor, assignment: Assignment) -> Result<(), TransitionError> {
    if assignment.target_id == Some(actor.id) {
        return Err(TransitionError::SelfChange);
    }

    if assignment.current == Some(assignment.requested) {
        return Err(TransitionError::Unchanged(assignment.requested));
    }

    if !may_assign(actor.role, assignment.current, assignment.requested) {
        return Err(TransitionError::NotPermitted {
            actor: actor.role,
            from: assignment.current,
            to: assignment.requested,
        });
    }

    Ok(())
}

pub fn check_management(
    actor: Actor,
    target_id: u64,
    target: StaffRole,
) -> Result<(), TransitionError> {
    if target_id == actor.id {
        return Err(TransitionError::SelfChange);
    }

    if !may_manage(actor.role, target) {
        return Err(TransitionError::NotManageable {
            actor: actor.role,
            target,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [StaffRole; 3] = [Receptionist, Manager, Administrator];

    fn actor(role: StaffRole) -> Actor {
        Actor { id: 1, role }
    }

    fn change(current: StaffRole, requested: StaffRole) -> Assignment {
        Assignment {
            target_id: Some(2),
            current: Some(current),
            requested,
        }
    }

    #[test]
    fn test_receptionist_assigns_nothing() {
        for requested in ROLES {
            let creation = Assignment {
                target_id: None,
                current: None,
                requested,
            };
            assert!(check_assignment(actor(Receptionist), creation).is_err());
        }
        assert!(check_assignment(actor(Receptionist), change(Receptionist, Manager)).is_err());
    }

    #[test]
    fn test_manager_promotes_receptionists_only() {
        let manager = actor(Manager);

        assert_eq!(check_assignment(manager, change(Receptionist, Manager)), Ok(()));
        assert!(check_assignment(manager, change(Receptionist, Administrator)).is_err());
        assert!(check_assignment(manager, change(Manager, Receptionist)).is_err());
        assert!(check_assignment(manager, change(Administrator, Manager)).is_err());
    }

    #[test]
    fn test_manager_creates_up_to_manager() {
        let manager = actor(Manager);
        let create = |requested| Assignment {
            target_id: None,
            current: None,
            requested,
        };

        assert_eq!(check_assignment(manager, create(Receptionist)), Ok(()));
        assert_eq!(check_assignment(manager, create(Manager)), Ok(()));
        assert_eq!(
            check_assignment(manager, create(Administrator)),
            Err(TransitionError::NotPermitted {
                actor: Manager,
                from: None,
                to: Administrator,
            })
        );
    }

    #[test]
    fn test_administrator_assigns_anything() {
        for current in ROLES {
            for requested in ROLES {
                let result = check_assignment(actor(Administrator), change(current, requested));
                if current == requested {
                    assert_eq!(result, Err(TransitionError::Unchanged(requested)));
                } else {
                    assert_eq!(result, Ok(()));
                }
            }
        }
    }

    #[test]
    fn test_self_change_is_rejected() {
        let admin = actor(Administrator);
        let own = Assignment {
            target_id: Some(admin.id),
            current: Some(Administrator),
            requested: Receptionist,
        };

        assert_eq!(check_assignment(admin, own), Err(TransitionError::SelfChange));
        assert_eq!(
            check_management(admin, admin.id, Administrator),
            Err(TransitionError::SelfChange)
        );
    }

    #[test]
    fn test_management_ladder() {
        assert!(check_management(actor(Administrator), 2, Administrator).is_ok());
        assert!(check_management(actor(Manager), 2, Receptionist).is_ok());
        assert!(check_management(actor(Manager), 2, Manager).is_err());
        assert!(check_management(actor(Receptionist), 2, Receptionist).is_err());
    }
}
