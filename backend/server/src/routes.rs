use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use crate::state::AppState;

pub mod medical;
pub mod pets;
pub mod session;
pub mod staff;
pub mod tutors;
pub mod veterinarians;

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/login", post(session::login_handler))
        .route("/auth/logout", post(session::logout_handler))
        .route("/auth/me", get(session::me_handler))
        .route("/auth/password", put(session::password_handler))
        .route(
            "/tutors",
            post(tutors::create_handler).get(tutors::list_handler),
        )
        .route(
            "/tutors/{id}",
            get(tutors::get_handler)
                .patch(tutors::update_handler)
                .delete(tutors::delete_handler),
        )
        .route(
            "/veterinarians",
            post(veterinarians::create_handler).get(veterinarians::list_handler),
        )
        .route(
            "/veterinarians/{id}",
            get(veterinarians::get_handler).patch(veterinarians::update_handler),
        )
        .route(
            "/veterinarians/{id}/active",
            put(veterinarians::active_handler),
        )
        .route("/staff", post(staff::create_handler).get(staff::list_handler))
        .route(
            "/staff/{id}",
            get(staff::get_handler).patch(staff::update_handler),
        )
        .route("/staff/{id}/role", put(staff::role_handler))
        .route("/staff/{id}/active", put(staff::active_handler))
        .route("/pets", post(pets::create_handler).get(pets::list_handler))
        .route(
            "/pets/{id}",
            get(pets::get_handler)
                .patch(pets::update_handler)
                .delete(pets::delete_handler),
        )
        .route(
            "/pets/{id}/anamnesis",
            get(medical::list_anamnesis_handler).post(medical::add_anamnesis_handler),
        )
        .route(
            "/pets/{id}/exams",
            get(medical::list_exams_handler).post(medical::add_exam_handler),
        )
        .route(
            "/pets/{id}/vaccinations",
            get(medical::list_vaccinations_handler).post(medical::add_vaccination_handler),
        )
        .route(
            "/pets/{id}/consultations",
            get(medical::list_consultations_handler).post(medical::add_consultation_handler),
        )
}
