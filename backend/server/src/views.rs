//! Response shapes for user records. Credentials never leave the server.
use chrono::{DateTime, Utc};
use records::models::{StaffMember, StaffRole, Tutor, Veterinarian};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct TutorView {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub document: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Tutor> for TutorView {
    fn from(tutor: Tutor) -> Self {
        Self {
            id: tutor.id,
            username: tutor.credentials.username,
            name: tutor.name,
            email: tutor.email,
            phone: tutor.phone,
            document: tutor.document,
            address: tutor.address,
            created_at: tutor.created_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct VeterinarianView {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license: String,
    pub specialty: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Veterinarian> for VeterinarianView {
    fn from(vet: Veterinarian) -> Self {
        Self {
            id: vet.id,
            username: vet.credentials.username,
            name: vet.name,
            email: vet.email,
            phone: vet.phone,
            license: vet.license,
            specialty: vet.specialty,
            active: vet.active,
            created_at: vet.created_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct StaffView {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: StaffRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<StaffMember> for StaffView {
    fn from(member: StaffMember) -> Self {
        Self {
            id: member.id,
            username: member.credentials.username,
            name: member.name,
            email: member.email,
            phone: member.phone,
            role: member.role,
            active: member.active,
            created_at: member.created_at,
        }
    }
}

/// `GET /auth/me` answers with whichever profile the caller has.
#[derive(Serialize, Debug)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Profile {
    Tutor(TutorView),
    Veterinarian(VeterinarianView),
    Staff(StaffView),
}
