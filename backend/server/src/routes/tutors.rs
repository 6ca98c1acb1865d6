use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use records::{
    Credentials,
    models::{Pet, Role, Tutor, TutorPatch},
    next_id, validate,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::{Caller, ensure_username_free, revoke_sessions},
    error::AppError,
    state::AppState,
    utils::{Contact, Payload, ensure_email_free, find, normalize_contact},
    views::TutorView,
};

#[derive(Deserialize)]
pub struct NewTutor {
    username: String,
    password: String,
    name: String,
    email: String,
    phone: String,
    document: String,
    address: Option<String>,
}

/// Open to anonymous callers so tutors can sign themselves up.
pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    caller: Option<Caller>,
    Payload(new): Payload<NewTutor>,
) -> Result<(StatusCode, Json<TutorView>), AppError> {
    if let Some(caller) = caller {
        caller.require(&[Role::Staff])?;
    }

    let username = validate::username(&new.username)?;
    validate::password(&new.password)?;
    let contact = Contact::parse(&new.name, &new.email, &new.phone)?;
    let document = validate::required("document", &new.document)?;
    let address = validate::optional("address", new.address)?;

    let store = state.store().await;
    ensure_username_free(&store, &username)?;

    let tutor = store.collection::<Tutor>().modify(|tutors| {
        ensure_email_free(tutors, &contact.email, None, |t| t.email.as_str())?;

        let tutor = Tutor {
            id: next_id(tutors),
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            document,
            address,
            credentials: Credentials::new(&username, &new.password),
            created_at: Utc::now(),
        };
        tutors.push(tutor.clone());

        Ok::<_, AppError>(tutor)
    })?;

    info!("Registered tutor {} ({})", tutor.id, username);
    Ok((StatusCode::CREATED, Json(tutor.into())))
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<TutorView>>, AppError> {
    caller.require(&[Role::Veterinarian, Role::Staff])?;
    let store = state.store().await;

    let tutors = store.collection::<Tutor>().load()?;
    Ok(Json(tutors.into_iter().map(TutorView::from).collect()))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<TutorView>, AppError> {
    if !caller.is(Role::Tutor, id) {
        caller.require(&[Role::Veterinarian, Role::Staff])?;
    }
    let store = state.store().await;

    let tutor = store
        .collection::<Tutor>()
        .find(id)?
        .ok_or(AppError::NotFound("Tutor", id))?;
    Ok(Json(tutor.into()))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
    Payload(mut patch): Payload<TutorPatch>,
) -> Result<Json<TutorView>, AppError> {
    if !caller.is(Role::Tutor, id) {
        caller.staff()?;
    }

    normalize_contact(&mut patch.name, &mut patch.email, &mut patch.phone)?;
    if let Some(document) = patch.document.as_deref() {
        patch.document = Some(validate::required("document", document)?);
    }
    if let Some(address) = patch.address.take() {
        patch.address = Some(validate::optional("address", address)?);
    }

    let store = state.store().await;
    let tutor = store.collection::<Tutor>().modify(|tutors| {
        if let Some(email) = patch.email.as_deref() {
            ensure_email_free(tutors, email, Some(id), |t| t.email.as_str())?;
        }

        let tutor = find(tutors, id, "Tutor")?;
        patch.apply(tutor);

        Ok::<_, AppError>(tutor.clone())
    })?;

    Ok(Json(tutor.into()))
}

/// Tutors who still own pets cannot be removed; move or delete the pets first.
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    caller.manager()?;
    let store = state.store().await;

    let owned = store
        .collection::<Pet>()
        .load()?
        .iter()
        .filter(|pet| pet.tutor_id == id)
        .count();
    if owned > 0 {
        return Err(AppError::Conflict(format!("tutor {id} still owns {owned} pets")));
    }

    store.collection::<Tutor>().modify(|tutors| {
        let before = tutors.len();
        tutors.retain(|tutor| tutor.id != id);
        if tutors.len() == before {
            return Err(AppError::NotFound("Tutor", id));
        }
        Ok(())
    })?;
    revoke_sessions(&store, Role::Tutor, id)?;

    info!("Deleted tutor {id}");
    Ok(StatusCode::NO_CONTENT)
}
