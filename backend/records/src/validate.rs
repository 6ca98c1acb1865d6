use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use thiserror::Error;

pub const MAX_TEXT_LEN: usize = 120;
pub const MAX_NOTE_LEN: usize = 4000;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_WEIGHT_KG: f64 = 1000.0;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static USERNAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9_.-]{3,32}$").unwrap());
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static PHONE_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s()+-]").unwrap());

#[derive(Error, Debug, PartialEq)]
#[error("Invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

pub fn normalize(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

pub fn required(field: &'static str, value: &str) -> Result<String> {
    let value = normalize(value);

    if value.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::new(
            field,
            format!("must be at most {MAX_TEXT_LEN} characters"),
        ));
    }

    Ok(value)
}

/// Free text such as notes and diagnoses. Blank collapses to `None`.
pub fn optional(field: &'static str, value: Option<String>) -> Result<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if value.chars().count() > MAX_NOTE_LEN {
        return Err(ValidationError::new(
            field,
            format!("must be at most {MAX_NOTE_LEN} characters"),
        ));
    }

    Ok(Some(value.to_string()))
}

pub fn username(value: &str) -> Result<String> {
    let value = value.trim().to_lowercase();

    if !USERNAME.is_match(&value) {
        return Err(ValidationError::new(
            "username",
            "must be 3 to 32 characters of letters, digits, '.', '_' or '-'",
        ));
    }

    Ok(value)
}

pub fn email(value: &str) -> Result<String> {
    let value = value.trim().to_lowercase();

    if !EMAIL.is_match(&value) || value.len() > MAX_TEXT_LEN {
        return Err(ValidationError::new("email", "is not a valid address"));
    }

    Ok(value)
}

/// Strips formatting and keeps the digits.
pub fn phone(value: &str) -> Result<String> {
    let digits = PHONE_NOISE.replace_all(value, "").into_owned();

    if !(8..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("phone", "must contain 8 to 15 digits"));
    }

    Ok(digits)
}

pub fn password(value: &str) -> Result<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if !value.chars().any(char::is_alphabetic) || !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            "password",
            "must contain a letter and a digit",
        ));
    }

    Ok(())
}

pub fn weight(value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(kg) if !(kg > 0.0 && kg < MAX_WEIGHT_KG) => Err(ValidationError::new(
            "weight_kg",
            format!("must be between 0 and {MAX_WEIGHT_KG}"),
        )),
        _ => Ok(value),
    }
}

pub fn not_future(field: &'static str, date: NaiveDate, today: NaiveDate) -> Result<NaiveDate> {
    if date > today {
        return Err(ValidationError::new(field, "must not be in the future"));
    }

    Ok(date)
}

pub fn not_future_at(
    field: &'static str,
    at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    if at > now {
        return Err(ValidationError::new(field, "must not be in the future"));
    }

    Ok(at)
}

pub fn after(field: &'static str, later: NaiveDate, earlier: NaiveDate) -> Result<NaiveDate> {
    if later <= earlier {
        return Err(ValidationError::new(field, format!("must be after {earlier}")));
    }

    Ok(later)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Rex  "), "Rex");
        assert_eq!(normalize("golden \t  retriever"), "golden retriever");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_required() {
        assert_eq!(required("name", " Ana  Souza ").unwrap(), "Ana Souza");
        assert_eq!(
            required("name", "  ").unwrap_err(),
            ValidationError::new("name", "must not be empty")
        );
        assert!(required("name", &"a".repeat(MAX_TEXT_LEN + 1)).is_err());
    }

    #[test]
    fn test_optional() {
        assert_eq!(optional("notes", None).unwrap(), None);
        assert_eq!(optional("notes", Some("  ".into())).unwrap(), None);
        assert_eq!(
            optional("notes", Some(" calm \n".into())).unwrap(),
            Some("calm".to_string())
        );
    }

    #[test]
    fn test_username() {
        assert_eq!(username(" Dr.Ana ").unwrap(), "dr.ana");
        assert!(username("ab").is_err());
        assert!(username("has space").is_err());
        assert!(username("émile").is_err());
    }

    #[test]
    fn test_email() {
        assert_eq!(email("Ana@Clinic.COM").unwrap(), "ana@clinic.com");
        assert!(email("ana@clinic").is_err());
        assert!(email("ana clinic@x.com").is_err());
        assert!(email("").is_err());
    }

    #[test]
    fn test_phone() {
        assert_eq!(phone("+55 (11) 98765-4321").unwrap(), "5511987654321");
        assert!(phone("1234").is_err());
        assert!(phone("12345678a").is_err());
    }

    #[test]
    fn test_password() {
        assert!(password("abc12345").is_ok());
        assert!(password("short1").is_err());
        assert!(password("onlyletters").is_err());
        assert!(password("1234567890").is_err());
    }

    #[test]
    fn test_weight() {
        assert_eq!(weight(None).unwrap(), None);
        assert_eq!(weight(Some(4.2)).unwrap(), Some(4.2));
        assert!(weight(Some(0.0)).is_err());
        assert!(weight(Some(-3.0)).is_err());
        assert!(weight(Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap();

        assert!(not_future("applied_on", today, today).is_ok());
        assert!(not_future("applied_on", tomorrow, today).is_err());
        assert!(after("next_dose_on", tomorrow, today).is_ok());
        assert!(after("next_dose_on", today, today).is_err());
    }

    #[test]
    fn test_not_future_at_compares_time_of_day() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap();
        let later_today = Utc.with_ymd_and_hms(2024, 5, 10, 9, 31, 0).unwrap();

        assert_eq!(not_future_at("occurred_at", now, now), Ok(now));
        assert!(not_future_at("occurred_at", later_today, now).is_err());
    }
}
