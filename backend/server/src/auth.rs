//! # Sessions
//!
//! Bearer tokens issued at login.
//!
//! - Token: UUID v4, stored in `sessions.json` with the user id, role and expiry
//! - Login prunes expired sessions in the same write that adds the new one
//! - Deactivating or deleting an account revokes all of its sessions
//! - Every authenticated request re-reads the account, so a deactivated
//!   veterinarian or staff member is locked out even if a token survived
use std::{sync::Arc, time::Duration};

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Utc};
use records::{
    Store,
    accounts::find_account,
    models::{Role, Session, StaffMember, StaffRole, Tutor, Veterinarian},
    next_id,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{error::AppError, roles::Actor, state::AppState};

/// The authenticated user behind a request.
#[derive(Clone, Copy, Debug)]
pub struct Caller {
    pub session_id: u64,
    pub user_id: u64,
    pub role: Role,
    pub staff_role: Option<StaffRole>,
}

impl Caller {
    pub fn require(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden("role not allowed for this operation"))
        }
    }

    pub fn is(&self, role: Role, user_id: u64) -> bool {
        self.role == role && self.user_id == user_id
    }

    pub fn staff(&self) -> Result<Actor, AppError> {
        match self.staff_role {
            Some(role) if self.role == Role::Staff => Ok(Actor {
                id: self.user_id,
                role,
            }),
            _ => Err(AppError::Forbidden("staff only")),
        }
    }

    pub fn manager(&self) -> Result<Actor, AppError> {
        let actor = self.staff()?;
        if actor.role < StaffRole::Manager {
            return Err(AppError::Forbidden("managers and administrators only"));
        }

        Ok(actor)
    }
}

fn bearer(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or(AppError::Unauthorized)
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)?.ok_or(AppError::Unauthorized)?;
        let store = state.store().await;

        resolve(&store, token, Utc::now())
    }
}

impl OptionalFromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Some(token) = bearer(parts)? else {
            return Ok(None);
        };
        let store = state.store().await;

        resolve(&store, token, Utc::now()).map(Some)
    }
}

pub fn resolve(store: &Store, token: &str, now: DateTime<Utc>) -> Result<Caller, AppError> {
    let session = store
        .collection::<Session>()
        .load()?
        .into_iter()
        .find(|session| session.token == token)
        .filter(|session| !session.is_expired(now))
        .ok_or(AppError::Unauthorized)?;

    let staff_role = match session.role {
        Role::Tutor => {
            store
                .collection::<Tutor>()
                .find(session.user_id)?
                .ok_or(AppError::Unauthorized)?;
            None
        }
        Role::Veterinarian => {
            store
                .collection::<Veterinarian>()
                .find(session.user_id)?
                .filter(|vet| vet.active)
                .ok_or(AppError::Unauthorized)?;
            None
        }
        Role::Staff => {
            let member = store
                .collection::<StaffMember>()
                .find(session.user_id)?
                .filter(|member| member.active)
                .ok_or(AppError::Unauthorized)?;
            Some(member.role)
        }
    };

    Ok(Caller {
        session_id: session.id,
        user_id: session.user_id,
        role: session.role,
        staff_role,
    })
}

pub fn ensure_username_free(store: &Store, username: &str) -> Result<(), AppError> {
    if find_account(store, username)?.is_some() {
        return Err(AppError::Conflict(format!("username {username} is taken")));
    }

    Ok(())
}

pub fn open_session(
    store: &Store,
    role: Role,
    user_id: u64,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<Session, AppError> {
    let expires_at = chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    store.collection::<Session>().modify(|sessions| {
        let before = sessions.len();
        sessions.retain(|session| !session.is_expired(now));
        if sessions.len() != before {
            debug!("Pruned {} expired sessions", before - sessions.len());
        }

        let session = Session {
            id: next_id(sessions),
            token: Uuid::new_v4().to_string(),
            user_id,
            role,
            created_at: now,
            expires_at,
        };
        sessions.push(session.clone());

        info!("Opened session for {role:?} {user_id}");
        Ok(session)
    })
}

pub fn close_session(store: &Store, caller: &Caller) -> Result<(), AppError> {
    store.collection::<Session>().modify(|sessions| {
        sessions.retain(|session| session.id != caller.session_id);
        Ok(())
    })
}

pub fn revoke_sessions(store: &Store, role: Role, user_id: u64) -> Result<(), AppError> {
    store.collection::<Session>().modify(|sessions| {
        let before = sessions.len();
        sessions.retain(|session| !(session.user_id == user_id && session.role == role));
        if sessions.len() != before {
            info!("Revoked {} sessions of {role:?} {user_id}", before - sessions.len());
        }
        Ok(())
    })
}
