use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use records::{
    Credentials,
    models::{Role, Veterinarian, VeterinarianPatch},
    next_id, validate,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::{Caller, ensure_username_free, revoke_sessions},
    error::AppError,
    state::AppState,
    utils::{Contact, Payload, ensure_email_free, find, normalize_contact},
    views::VeterinarianView,
};

#[derive(Deserialize)]
pub struct NewVeterinarian {
    username: String,
    password: String,
    name: String,
    email: String,
    phone: String,
    license: String,
    specialty: Option<String>,
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Payload(new): Payload<NewVeterinarian>,
) -> Result<(StatusCode, Json<VeterinarianView>), AppError> {
    caller.manager()?;

    let username = validate::username(&new.username)?;
    validate::password(&new.password)?;
    let contact = Contact::parse(&new.name, &new.email, &new.phone)?;
    let license = validate::required("license", &new.license)?;
    let specialty = validate::optional("specialty", new.specialty)?;

    let store = state.store().await;
    ensure_username_free(&store, &username)?;

    let vet = store.collection::<Veterinarian>().modify(|vets| {
        ensure_email_free(vets, &contact.email, None, |v| v.email.as_str())?;
        if vets.iter().any(|v| v.license == license) {
            return Err(AppError::Conflict(format!("license {license} is already registered")));
        }

        let vet = Veterinarian {
            id: next_id(vets),
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            license,
            specialty,
            active: true,
            credentials: Credentials::new(&username, &new.password),
            created_at: Utc::now(),
        };
        vets.push(vet.clone());

        Ok::<_, AppError>(vet)
    })?;

    info!("Registered veterinarian {} ({})", vet.id, username);
    Ok((StatusCode::CREATED, Json(vet.into())))
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
) -> Result<Json<Vec<VeterinarianView>>, AppError> {
    let store = state.store().await;

    let vets = store.collection::<Veterinarian>().load()?;
    Ok(Json(vets.into_iter().map(VeterinarianView::from).collect()))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<VeterinarianView>, AppError> {
    let store = state.store().await;

    let vet = store
        .collection::<Veterinarian>()
        .find(id)?
        .ok_or(AppError::NotFound("Veterinarian", id))?;
    Ok(Json(vet.into()))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
    Payload(mut patch): Payload<VeterinarianPatch>,
) -> Result<Json<VeterinarianView>, AppError> {
    if !caller.is(Role::Veterinarian, id) {
        caller.manager()?;
    }

    normalize_contact(&mut patch.name, &mut patch.email, &mut patch.phone)?;
    if let Some(license) = patch.license.as_deref() {
        patch.license = Some(validate::required("license", license)?);
    }
    if let Some(specialty) = patch.specialty.take() {
        patch.specialty = Some(validate::optional("specialty", specialty)?);
    }

    let store = state.store().await;
    let vet = store.collection::<Veterinarian>().modify(|vets| {
        if let Some(email) = patch.email.as_deref() {
            ensure_email_free(vets, email, Some(id), |v| v.email.as_str())?;
        }
        if let Some(license) = patch.license.as_deref() {
            if vets.iter().any(|v| v.id != id && v.license == license) {
                return Err(AppError::Conflict(format!("license {license} is already registered")));
            }
        }

        let vet = find(vets, id, "Veterinarian")?;
        patch.apply(vet);

        Ok::<_, AppError>(vet.clone())
    })?;

    Ok(Json(vet.into()))
}

#[derive(Deserialize)]
pub struct ActiveChange {
    pub active: bool,
}

pub async fn active_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
    Payload(change): Payload<ActiveChange>,
) -> Result<Json<VeterinarianView>, AppError> {
    caller.manager()?;
    let store = state.store().await;

    let vet = store.collection::<Veterinarian>().modify(|vets| {
        let vet = find(vets, id, "Veterinarian")?;
        vet.active = change.active;

        Ok::<_, AppError>(vet.clone())
    })?;

    if !vet.active {
        revoke_sessions(&store, Role::Veterinarian, id)?;
    }

    info!("Veterinarian {id} active: {}", vet.active);
    Ok(Json(vet.into()))
}
