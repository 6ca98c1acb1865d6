use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use records::{
    accounts::find_account,
    models::{Role, StaffMember, Tutor, Veterinarian},
    validate,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    auth::{Caller, close_session, open_session},
    error::AppError,
    state::AppState,
    utils::{Payload, find},
    views::Profile,
};

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
    role: Role,
    user_id: u64,
    expires_at: DateTime<Utc>,
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Payload(request): Payload<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = request.username.trim().to_lowercase();
    let store = state.store().await;

    let account = find_account(&store, &username)?
        .filter(|account| account.credentials.verify(&request.password))
        .ok_or_else(|| {
            warn!("Failed login for {username}");
            AppError::BadCredentials
        })?;

    if !account.active {
        warn!("Login attempt on deactivated account {username}");
        return Err(AppError::Forbidden("account is deactivated"));
    }

    let session = open_session(
        &store,
        account.role,
        account.user_id,
        state.config.session_ttl,
        Utc::now(),
    )?;

    Ok(Json(LoginResponse {
        token: session.token,
        role: session.role,
        user_id: session.user_id,
        expires_at: session.expires_at,
    }))
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<StatusCode, AppError> {
    let store = state.store().await;
    close_session(&store, &caller)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Profile>, AppError> {
    let store = state.store().await;
    let id = caller.user_id;

    let profile = match caller.role {
        Role::Tutor => Profile::Tutor(
            store
                .collection::<Tutor>()
                .find(id)?
                .ok_or(AppError::NotFound("Tutor", id))?
                .into(),
        ),
        Role::Veterinarian => Profile::Veterinarian(
            store
                .collection::<Veterinarian>()
                .find(id)?
                .ok_or(AppError::NotFound("Veterinarian", id))?
                .into(),
        ),
        Role::Staff => Profile::Staff(
            store
                .collection::<StaffMember>()
                .find(id)?
                .ok_or(AppError::NotFound("Staff member", id))?
                .into(),
        ),
    };

    Ok(Json(profile))
}

#[derive(Deserialize)]
pub struct PasswordChange {
    current_password: String,
    new_password: String,
}

pub async fn password_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Payload(change): Payload<PasswordChange>,
) -> Result<StatusCode, AppError> {
    validate::password(&change.new_password)?;
    let store = state.store().await;
    let id = caller.user_id;

    let rotate = |credentials: &mut records::Credentials| {
        if !credentials.verify(&change.current_password) {
            return Err(AppError::BadCredentials);
        }
        credentials.set_password(&change.new_password);
        Ok(())
    };

    match caller.role {
        Role::Tutor => store
            .collection::<Tutor>()
            .modify(|all| rotate(&mut find(all, id, "Tutor")?.credentials))?,
        Role::Veterinarian => store
            .collection::<Veterinarian>()
            .modify(|all| rotate(&mut find(all, id, "Veterinarian")?.credentials))?,
        Role::Staff => store
            .collection::<StaffMember>()
            .modify(|all| rotate(&mut find(all, id, "Staff member")?.credentials))?,
    }

    info!("Password changed for {:?} {id}", caller.role);
    Ok(StatusCode::NO_CONTENT)
}
