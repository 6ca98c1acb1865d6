use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use records::{
    Store,
    models::{Pet, PetPatch, Role, Sex, Tutor},
    next_id, validate,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::Caller,
    error::AppError,
    state::AppState,
    utils::{Payload, ensure_can_edit, find, load_pet, today},
};

#[derive(Deserialize)]
pub struct NewPet {
    tutor_id: Option<u64>,
    name: String,
    species: String,
    breed: Option<String>,
    #[serde(default)]
    sex: Sex,
    birth_date: Option<NaiveDate>,
    weight_kg: Option<f64>,
    notes: Option<String>,
}

fn ensure_tutor_exists(store: &Store, tutor_id: u64) -> Result<(), AppError> {
    store
        .collection::<Tutor>()
        .find(tutor_id)?
        .map(|_| ())
        .ok_or(AppError::NotFound("Tutor", tutor_id))
}

fn species(value: &str) -> Result<String, AppError> {
    Ok(validate::required("species", value)?.to_lowercase())
}

fn birth_date(value: Option<NaiveDate>) -> Result<Option<NaiveDate>, AppError> {
    value
        .map(|date| validate::not_future("birth_date", date, today()))
        .transpose()
        .map_err(AppError::from)
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Payload(new): Payload<NewPet>,
) -> Result<(StatusCode, Json<Pet>), AppError> {
    let tutor_id = match caller.role {
        Role::Tutor => match new.tutor_id {
            Some(id) if id != caller.user_id => {
                return Err(AppError::Forbidden("tutors register their own pets only"));
            }
            _ => caller.user_id,
        },
        Role::Staff => new
            .tutor_id
            .ok_or_else(|| AppError::MalformedPayload("tutor_id is required".to_string()))?,
        Role::Veterinarian => return Err(AppError::Forbidden("veterinarians cannot register pets")),
    };

    let name = validate::required("name", &new.name)?;
    let species = species(&new.species)?;
    let breed = validate::optional("breed", new.breed)?;
    let birth_date = birth_date(new.birth_date)?;
    let weight_kg = validate::weight(new.weight_kg)?;
    let notes = validate::optional("notes", new.notes)?;

    let store = state.store().await;
    ensure_tutor_exists(&store, tutor_id)?;

    let pet = store.collection::<Pet>().modify(|pets| {
        let now = Utc::now();
        let pet = Pet {
            id: next_id(pets),
            tutor_id,
            name,
            species,
            breed,
            sex: new.sex,
            birth_date,
            weight_kg,
            notes,
            anamnesis: Vec::new(),
            exams: Vec::new(),
            vaccinations: Vec::new(),
            consultations: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        pets.push(pet.clone());

        Ok::<_, AppError>(pet)
    })?;

    info!("Registered pet {} for tutor {}", pet.id, pet.tutor_id);
    Ok((StatusCode::CREATED, Json(pet)))
}

#[derive(Deserialize, Default)]
pub struct PetFilter {
    tutor_id: Option<u64>,
    species: Option<String>,
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(filter): Query<PetFilter>,
) -> Result<Json<Vec<Pet>>, AppError> {
    let tutor_id = match caller.role {
        Role::Tutor => Some(caller.user_id),
        _ => filter.tutor_id,
    };
    let species = filter.species.map(|s| validate::normalize(&s).to_lowercase());

    let store = state.store().await;
    let pets = store
        .collection::<Pet>()
        .load()?
        .into_iter()
        .filter(|pet| tutor_id.is_none_or(|id| pet.tutor_id == id))
        .filter(|pet| species.as_deref().is_none_or(|s| pet.species == s))
        .collect();

    Ok(Json(pets))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<Pet>, AppError> {
    let store = state.store().await;

    Ok(Json(load_pet(&store, &caller, id)?))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
    Payload(mut patch): Payload<PetPatch>,
) -> Result<Json<Pet>, AppError> {
    if let Some(name) = patch.name.as_deref() {
        patch.name = Some(validate::required("name", name)?);
    }
    if let Some(value) = patch.species.as_deref() {
        patch.species = Some(species(value)?);
    }
    if let Some(breed) = patch.breed.take() {
        patch.breed = Some(validate::optional("breed", breed)?);
    }
    if let Some(notes) = patch.notes.take() {
        patch.notes = Some(validate::optional("notes", notes)?);
    }
    if let Some(date) = patch.birth_date.take() {
        patch.birth_date = Some(birth_date(date)?);
    }
    if let Some(weight_kg) = patch.weight_kg.take() {
        patch.weight_kg = Some(validate::weight(weight_kg)?);
    }

    let store = state.store().await;
    if let Some(tutor_id) = patch.tutor_id {
        caller.staff()?;
        ensure_tutor_exists(&store, tutor_id)?;
    }

    let pet = store.collection::<Pet>().modify(|pets| {
        let pet = find(pets, id, "Pet")?;
        ensure_can_edit(&caller, pet)?;
        patch.apply(pet, Utc::now());

        Ok::<_, AppError>(pet.clone())
    })?;

    Ok(Json(pet))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    caller.staff()?;
    let store = state.store().await;

    store.collection::<Pet>().modify(|pets| {
        let before = pets.len();
        pets.retain(|pet| pet.id != id);
        if pets.len() == before {
            return Err(AppError::NotFound("Pet", id));
        }
        Ok(())
    })?;

    info!("Deleted pet {id}");
    Ok(StatusCode::NO_CONTENT)
}
