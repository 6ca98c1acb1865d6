use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use records::{
    Credentials,
    models::{Role, StaffMember, StaffPatch, StaffRole},
    next_id, validate,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::{Caller, ensure_username_free, revoke_sessions},
    error::AppError,
    roles::{Assignment, check_assignment, check_management},
    routes::veterinarians::ActiveChange,
    state::AppState,
    utils::{Contact, Payload, ensure_email_free, find, normalize_contact},
    views::StaffView,
};

#[derive(Deserialize)]
pub struct NewStaffMember {
    username: String,
    password: String,
    name: String,
    email: String,
    phone: String,
    #[serde(default = "default_role")]
    role: StaffRole,
}

fn default_role() -> StaffRole {
    StaffRole::Receptionist
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Payload(new): Payload<NewStaffMember>,
) -> Result<(StatusCode, Json<StaffView>), AppError> {
    check_assignment(
        caller.staff()?,
        Assignment {
            target_id: None,
            current: None,
            requested: new.role,
        },
    )?;

    let username = validate::username(&new.username)?;
    validate::password(&new.password)?;
    let contact = Contact::parse(&new.name, &new.email, &new.phone)?;

    let store = state.store().await;
    ensure_username_free(&store, &username)?;

    let member = store.collection::<StaffMember>().modify(|staff| {
        ensure_email_free(staff, &contact.email, None, |s| s.email.as_str())?;

        let member = StaffMember {
            id: next_id(staff),
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            role: new.role,
            active: true,
            credentials: Credentials::new(&username, &new.password),
            created_at: Utc::now(),
        };
        staff.push(member.clone());

        Ok::<_, AppError>(member)
    })?;

    info!("Registered {:?} {} ({})", member.role, member.id, username);
    Ok((StatusCode::CREATED, Json(member.into())))
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<StaffView>>, AppError> {
    caller.staff()?;
    let store = state.store().await;

    let staff = store.collection::<StaffMember>().load()?;
    Ok(Json(staff.into_iter().map(StaffView::from).collect()))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<StaffView>, AppError> {
    caller.staff()?;
    let store = state.store().await;

    let member = store
        .collection::<StaffMember>()
        .find(id)?
        .ok_or(AppError::NotFound("Staff member", id))?;
    Ok(Json(member.into()))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
    Payload(mut patch): Payload<StaffPatch>,
) -> Result<Json<StaffView>, AppError> {
    let actor = caller.staff()?;
    normalize_contact(&mut patch.name, &mut patch.email, &mut patch.phone)?;

    let store = state.store().await;
    let member = store.collection::<StaffMember>().modify(|staff| {
        if let Some(email) = patch.email.as_deref() {
            ensure_email_free(staff, email, Some(id), |s| s.email.as_str())?;
        }

        let member = find(staff, id, "Staff member")?;
        if id != actor.id {
            check_management(actor, id, member.role)?;
        }
        patch.apply(member);

        Ok::<_, AppError>(member.clone())
    })?;

    Ok(Json(member.into()))
}

#[derive(Deserialize)]
pub struct RoleChange {
    role: StaffRole,
}

pub async fn role_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
    Payload(change): Payload<RoleChange>,
) -> Result<Json<StaffView>, AppError> {
    let actor = caller.staff()?;
    let store = state.store().await;

    let member = store.collection::<StaffMember>().modify(|staff| {
        let member = find(staff, id, "Staff member")?;
        check_assignment(
            actor,
            Assignment {
                target_id: Some(id),
                current: Some(member.role),
                requested: change.role,
            },
        )?;

        info!(
            "{:?} {} moved staff member {id} from {:?} to {:?}",
            actor.role, actor.id, member.role, change.role
        );
        member.role = change.role;

        Ok::<_, AppError>(member.clone())
    })?;

    Ok(Json(member.into()))
}

pub async fn active_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
    Payload(change): Payload<ActiveChange>,
) -> Result<Json<StaffView>, AppError> {
    let actor = caller.staff()?;
    let store = state.store().await;

    let member = store.collection::<StaffMember>().modify(|staff| {
        let member = find(staff, id, "Staff member")?;
        check_management(actor, id, member.role)?;
        member.active = change.active;

        Ok::<_, AppError>(member.clone())
    })?;

    if !member.active {
        revoke_sessions(&store, Role::Staff, id)?;
    }

    info!("Staff member {id} active: {}", member.active);
    Ok(Json(member.into()))
}
