use axum::extract::FromRequest;
use chrono::{NaiveDate, Utc};
use records::{
    Store,
    models::{Pet, Record, Role},
    validate,
};

use crate::{auth::Caller, error::AppError};

/// JSON body whose rejections surface as [`AppError::MalformedPayload`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Payload<T>(pub T);

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn find<'a, T: Record>(
    records: &'a mut [T],
    id: u64,
    entity: &'static str,
) -> Result<&'a mut T, AppError> {
    records
        .iter_mut()
        .find(|record| record.id() == id)
        .ok_or(AppError::NotFound(entity, id))
}

pub fn ensure_email_free<T: Record>(
    records: &[T],
    email: &str,
    except: Option<u64>,
    email_of: impl Fn(&T) -> &str,
) -> Result<(), AppError> {
    let taken = records
        .iter()
        .any(|record| Some(record.id()) != except && email_of(record) == email);

    if taken {
        return Err(AppError::Conflict(format!("email {email} is already registered")));
    }

    Ok(())
}

/// Tutors see their own pets; veterinarians and staff see every pet.
pub fn ensure_can_view(caller: &Caller, pet: &Pet) -> Result<(), AppError> {
    match caller.role {
        Role::Tutor if pet.tutor_id != caller.user_id => Err(AppError::Forbidden("not your pet")),
        _ => Ok(()),
    }
}

pub fn ensure_can_edit(caller: &Caller, pet: &Pet) -> Result<(), AppError> {
    match caller.role {
        Role::Tutor if pet.tutor_id == caller.user_id => Ok(()),
        Role::Staff => Ok(()),
        _ => Err(AppError::Forbidden("only the tutor or staff may edit a pet")),
    }
}

pub fn load_pet(store: &Store, caller: &Caller, id: u64) -> Result<Pet, AppError> {
    let pet = store
        .collection::<Pet>()
        .find(id)?
        .ok_or(AppError::NotFound("Pet", id))?;
    ensure_can_view(caller, &pet)?;

    Ok(pet)
}

/// Shared normalization for the contact fields every user record carries.
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Contact {
    pub fn parse(name: &str, email: &str, phone: &str) -> Result<Self, AppError> {
        Ok(Self {
            name: validate::required("name", name)?,
            email: validate::email(email)?,
            phone: validate::phone(phone)?,
        })
    }
}

/// Validates the optional contact fields of a patch in place.
pub fn normalize_contact(
    name: &mut Option<String>,
    email: &mut Option<String>,
    phone: &mut Option<String>,
) -> Result<(), AppError> {
    if let Some(value) = name.as_deref() {
        *name = Some(validate::required("name", value)?);
    }
    if let Some(value) = email.as_deref() {
        *email = Some(validate::email(value)?);
    }
    if let Some(value) = phone.as_deref() {
        *phone = Some(validate::phone(value)?);
    }

    Ok(())
}
