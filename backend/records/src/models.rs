use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::credentials::Credentials;

/// Anything stored as one element of a collection file.
pub trait Record: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    /// File stem of the collection, `<COLLECTION>.json` under the data directory.
    const COLLECTION: &'static str;

    fn id(&self) -> u64;
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tutor,
    Veterinarian,
    Staff,
}

/// Ordered from least to most privileged.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Receptionist,
    Manager,
    Administrator,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Tutor {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub document: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(flatten)]
    pub credentials: Credentials,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Veterinarian {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license: String,
    #[serde(default)]
    pub specialty: Option<String>,
    pub active: bool,
    #[serde(flatten)]
    pub credentials: Credentials,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StaffMember {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: StaffRole,
    pub active: bool,
    #[serde(flatten)]
    pub credentials: Credentials,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Pet {
    pub id: u64,
    pub tutor_id: u64,
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub anamnesis: Vec<Anamnesis>,
    #[serde(default)]
    pub exams: Vec<Exam>,
    #[serde(default)]
    pub vaccinations: Vec<Vaccination>,
    #[serde(default)]
    pub consultations: Vec<Consultation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who appended a medical sub-record.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Author {
    pub role: Role,
    pub id: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Anamnesis {
    pub id: u64,
    pub veterinarian_id: u64,
    pub recorded_at: DateTime<Utc>,
    pub chief_complaint: String,
    pub history: Option<String>,
    pub diet: Option<String>,
    pub environment: Option<String>,
    pub previous_diseases: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Exam {
    pub id: u64,
    pub recorded_by: Author,
    pub kind: String,
    pub performed_on: NaiveDate,
    pub result: Option<String>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Vaccination {
    pub id: u64,
    pub recorded_by: Author,
    pub vaccine: String,
    pub dose: Option<String>,
    pub batch: Option<String>,
    pub applied_on: NaiveDate,
    pub next_dose_on: Option<NaiveDate>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Consultation {
    pub id: u64,
    pub veterinarian_id: u64,
    pub occurred_at: DateTime<Utc>,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Session {
    pub id: u64,
    pub token: String,
    pub user_id: u64,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

macro_rules! record {
    ($ty:ty, $collection:literal) => {
        impl Record for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> u64 {
                self.id
            }
        }
    };
}

record!(Tutor, "tutors");
record!(Veterinarian, "veterinarians");
record!(StaffMember, "staff");
record!(Pet, "pets");
record!(Session, "sessions");

/// Sub-records are numbered within their pet.
pub trait Numbered {
    fn number(&self) -> u64;
}

macro_rules! numbered {
    ($($ty:ty),*) => {
        $(impl Numbered for $ty {
            fn number(&self) -> u64 {
                self.id
            }
        })*
    };
}

numbered!(Anamnesis, Exam, Vaccination, Consultation);

pub fn next_number<T: Numbered>(items: &[T]) -> u64 {
    items.iter().map(Numbered::number).max().unwrap_or(0) + 1
}

/// Merge payloads: only the supplied fields overwrite the stored record.
/// Optional fields are doubly wrapped so an explicit `null` clears them.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct TutorPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
}

impl TutorPatch {
    pub fn apply(self, tutor: &mut Tutor) {
        merge(&mut tutor.name, self.name);
        merge(&mut tutor.email, self.email);
        merge(&mut tutor.phone, self.phone);
        merge(&mut tutor.document, self.document);
        merge(&mut tutor.address, self.address);
    }
}

#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct VeterinarianPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub license: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub specialty: Option<Option<String>>,
}

impl VeterinarianPatch {
    pub fn apply(self, vet: &mut Veterinarian) {
        merge(&mut vet.name, self.name);
        merge(&mut vet.email, self.email);
        merge(&mut vet.phone, self.phone);
        merge(&mut vet.license, self.license);
        merge(&mut vet.specialty, self.specialty);
    }
}

#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct StaffPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl StaffPatch {
    pub fn apply(self, member: &mut StaffMember) {
        merge(&mut member.name, self.name);
        merge(&mut member.email, self.email);
        merge(&mut member.phone, self.phone);
    }
}

#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct PetPatch {
    pub tutor_id: Option<u64>,
    pub name: Option<String>,
    pub species: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub breed: Option<Option<String>>,
    pub sex: Option<Sex>,
    #[serde(default, deserialize_with = "nullable")]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub weight_kg: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl PetPatch {
    pub fn apply(self, pet: &mut Pet, now: DateTime<Utc>) {
        merge(&mut pet.tutor_id, self.tutor_id);
        merge(&mut pet.name, self.name);
        merge(&mut pet.species, self.species);
        merge(&mut pet.sex, self.sex);
        merge(&mut pet.breed, self.breed);
        merge(&mut pet.birth_date, self.birth_date);
        merge(&mut pet.weight_kg, self.weight_kg);
        merge(&mut pet.notes, self.notes);
        pet.updated_at = now;
    }
}

fn merge<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// A present key always yields `Some`, so `null` becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn pet() -> Pet {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Pet {
            id: 1,
            tutor_id: 7,
            name: "rex".into(),
            species: "dog".into(),
            breed: Some("beagle".into()),
            sex: Sex::Male,
            birth_date: None,
            weight_kg: Some(12.0),
            notes: None,
            anamnesis: Vec::new(),
            exams: Vec::new(),
            vaccinations: Vec::new(),
            consultations: Vec::new(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_patch_merges_only_supplied_fields() {
        let mut pet = pet();
        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        PetPatch {
            name: Some("max".into()),
            weight_kg: Some(Some(13.5)),
            ..Default::default()
        }
        .apply(&mut pet, later);

        assert_eq!(pet.name, "max");
        assert_eq!(pet.weight_kg, Some(13.5));
        assert_eq!(pet.breed.as_deref(), Some("beagle"));
        assert_eq!(pet.tutor_id, 7);
        assert_eq!(pet.updated_at, later);
    }

    #[test]
    fn test_next_number() {
        let mut pet = pet();
        assert_eq!(next_number(&pet.exams), 1);

        let at = pet.created_at;
        for id in [1, 4] {
            pet.exams.push(Exam {
                id,
                recorded_by: Author { role: Role::Staff, id: 1 },
                kind: "blood".into(),
                performed_on: at.date_naive(),
                result: None,
                notes: None,
                recorded_at: at,
            });
        }
        assert_eq!(next_number(&pet.exams), 5);
    }

    #[test]
    fn test_staff_roles_are_ordered() {
        assert!(StaffRole::Receptionist < StaffRole::Manager);
        assert!(StaffRole::Manager < StaffRole::Administrator);
    }

    #[test]
    fn test_patch_null_clears_optional_fields() {
        let mut pet = pet();
        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        let patch: PetPatch = serde_json::from_str(r#"{"breed": null, "notes": "calm"}"#).unwrap();
        assert_eq!(patch.breed, Some(None));
        assert_eq!(patch.weight_kg, None);
        patch.apply(&mut pet, later);

        assert_eq!(pet.breed, None);
        assert_eq!(pet.notes.as_deref(), Some("calm"));
        assert_eq!(pet.weight_kg, Some(12.0));
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let parsed: Result<PetPatch, _> = serde_json::from_str(r#"{"owner": 3}"#);
        assert!(parsed.is_err());
    }
}
