//! Medical sub-records appended to a pet: anamnesis, exams, vaccinations and
//! consultations. Each is numbered within its pet and never edited afterwards.
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use records::{
    Store,
    models::{Anamnesis, Author, Consultation, Exam, Pet, Role, Vaccination, next_number},
    validate,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::Caller,
    error::AppError,
    state::AppState,
    utils::{Payload, find, load_pet, today},
};

/// Pushes one sub-record onto the pet in a single rewrite of the pets collection.
fn append<T>(
    store: &Store,
    pet_id: u64,
    build: impl FnOnce(&mut Pet, DateTime<Utc>) -> T,
) -> Result<T, AppError> {
    store.collection::<Pet>().modify(|pets| {
        let pet = find(pets, pet_id, "Pet")?;
        let now = Utc::now();
        let record = build(pet, now);
        pet.updated_at = now;

        Ok(record)
    })
}

fn author(caller: &Caller) -> Author {
    Author {
        role: caller.role,
        id: caller.user_id,
    }
}

#[derive(Deserialize)]
pub struct NewAnamnesis {
    chief_complaint: String,
    history: Option<String>,
    diet: Option<String>,
    environment: Option<String>,
    previous_diseases: Option<String>,
    current_medications: Option<String>,
    allergies: Option<String>,
}

pub async fn list_anamnesis_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Anamnesis>>, AppError> {
    let store = state.store().await;

    Ok(Json(load_pet(&store, &caller, id)?.anamnesis))
}

pub async fn add_anamnesis_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
    Payload(new): Payload<NewAnamnesis>,
) -> Result<(StatusCode, Json<Anamnesis>), AppError> {
    caller.require(&[Role::Veterinarian])?;

    let chief_complaint = validate::required("chief_complaint", &new.chief_complaint)?;
    let history = validate::optional("history", new.history)?;
    let diet = validate::optional("diet", new.diet)?;
    let environment = validate::optional("environment", new.environment)?;
    let previous_diseases = validate::optional("previous_diseases", new.previous_diseases)?;
    let current_medications = validate::optional("current_medications", new.current_medications)?;
    let allergies = validate::optional("allergies", new.allergies)?;

    let store = state.store().await;
    let record = append(&store, id, |pet, now| {
        let record = Anamnesis {
            id: next_number(&pet.anamnesis),
            veterinarian_id: caller.user_id,
            recorded_at: now,
            chief_complaint,
            history,
            diet,
            environment,
            previous_diseases,
            current_medications,
            allergies,
        };
        pet.anamnesis.push(record.clone());
        record
    })?;

    info!("Veterinarian {} added anamnesis {} to pet {id}", caller.user_id, record.id);
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Deserialize)]
pub struct NewExam {
    kind: String,
    performed_on: NaiveDate,
    result: Option<String>,
    notes: Option<String>,
}

pub async fn list_exams_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Exam>>, AppError> {
    let store = state.store().await;

    Ok(Json(load_pet(&store, &caller, id)?.exams))
}

pub async fn add_exam_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
    Payload(new): Payload<NewExam>,
) -> Result<(StatusCode, Json<Exam>), AppError> {
    caller.require(&[Role::Veterinarian, Role::Staff])?;

    let kind = validate::required("kind", &new.kind)?;
    let performed_on = validate::not_future("performed_on", new.performed_on, today())?;
    let result = validate::optional("result", new.result)?;
    let notes = validate::optional("notes", new.notes)?;

    let store = state.store().await;
    let record = append(&store, id, |pet, now| {
        let record = Exam {
            id: next_number(&pet.exams),
            recorded_by: author(&caller),
            kind,
            performed_on,
            result,
            notes,
            recorded_at: now,
        };
        pet.exams.push(record.clone());
        record
    })?;

    info!("{:?} {} added exam {} to pet {id}", caller.role, caller.user_id, record.id);
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Deserialize)]
pub struct NewVaccination {
    vaccine: String,
    dose: Option<String>,
    batch: Option<String>,
    applied_on: NaiveDate,
    next_dose_on: Option<NaiveDate>,
}

pub async fn list_vaccinations_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Vaccination>>, AppError> {
    let store = state.store().await;

    Ok(Json(load_pet(&store, &caller, id)?.vaccinations))
}

pub async fn add_vaccination_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
    Payload(new): Payload<NewVaccination>,
) -> Result<(StatusCode, Json<Vaccination>), AppError> {
    caller.require(&[Role::Veterinarian, Role::Staff])?;

    let vaccine = validate::required("vaccine", &new.vaccine)?;
    let dose = validate::optional("dose", new.dose)?;
    let batch = validate::optional("batch", new.batch)?;
    let applied_on = validate::not_future("applied_on", new.applied_on, today())?;
    let next_dose_on = new
        .next_dose_on
        .map(|date| validate::after("next_dose_on", date, applied_on))
        .transpose()?;

    let store = state.store().await;
    let record = append(&store, id, |pet, now| {
        let record = Vaccination {
            id: next_number(&pet.vaccinations),
            recorded_by: author(&caller),
            vaccine,
            dose,
            batch,
            applied_on,
            next_dose_on,
            recorded_at: now,
        };
        pet.vaccinations.push(record.clone());
        record
    })?;

    info!("{:?} {} added vaccination {} to pet {id}", caller.role, caller.user_id, record.id);
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Deserialize)]
pub struct NewConsultation {
    occurred_at: Option<DateTime<Utc>>,
    reason: String,
    diagnosis: Option<String>,
    treatment: Option<String>,
    prescription: Option<String>,
    weight_kg: Option<f64>,
    notes: Option<String>,
}

pub async fn list_consultations_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Consultation>>, AppError> {
    let store = state.store().await;

    Ok(Json(load_pet(&store, &caller, id)?.consultations))
}

/// A weight taken during the consultation also becomes the pet's current weight.
pub async fn add_consultation_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<u64>,
    Payload(new): Payload<NewConsultation>,
) -> Result<(StatusCode, Json<Consultation>), AppError> {
    caller.require(&[Role::Veterinarian])?;

    let reason = validate::required("reason", &new.reason)?;
    let diagnosis = validate::optional("diagnosis", new.diagnosis)?;
    let treatment = validate::optional("treatment", new.treatment)?;
    let prescription = validate::optional("prescription", new.prescription)?;
    let notes = validate::optional("notes", new.notes)?;
    let weight_kg = validate::weight(new.weight_kg)?;
    let occurred_at = new
        .occurred_at
        .map(|at| validate::not_future_at("occurred_at", at, Utc::now()))
        .transpose()?;

    let store = state.store().await;
    let record = append(&store, id, |pet, now| {
        let record = Consultation {
            id: next_number(&pet.consultations),
            veterinarian_id: caller.user_id,
            occurred_at: occurred_at.unwrap_or(now),
            reason,
            diagnosis,
            treatment,
            prescription,
            weight_kg,
            notes,
            recorded_at: now,
        };
        if weight_kg.is_some() {
            pet.weight_kg = weight_kg;
        }
        pet.consultations.push(record.clone());
        record
    })?;

    info!("Veterinarian {} added consultation {} to pet {id}", caller.user_id, record.id);
    Ok((StatusCode::CREATED, Json(record)))
}
