use serde::{Deserialize, Serialize};
use chrono::{self, Utc};
use uuid::Uuid;

use crate::{errors::AppError, models::{Comment, Notification, Party, Profile}};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub display_name: Option<String>,
    pub pwd: String,
    pub pwd_confirm: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() {
            return Err(AppError::bad_request("username is required"));
        }
        if self.pwd.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.pwd != self.pwd_confirm {
            return Err(AppError::bad_request("passwords do not match"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginUserRequest {
    pub username: String,
    pub pwd: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthUserResponse {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Claims {
    pub user_id: Uuid,
    pub username: String,
    pub exp: usize,
}

impl Claims {
    pub fn new(user_id: &Uuid, username: &str, exp: usize) -> Self {
        Self {
            user_id: *user_id,
            username: username.to_string(),
            exp,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewPartyDto {
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub datetime: chrono::DateTime<Utc>,
    pub genre: Option<String>,
    pub dresscode: Option<String>,
    pub entry_fee: Option<f64>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

impl NewPartyDto {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::bad_request("title is required"));
        }
        if self.location.trim().is_empty() {
            return Err(AppError::bad_request("location is required"));
        }
        validate_fee(self.entry_fee)?;
        validate_coordinates(self.latitude, self.longitude)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UpdatePartyDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub datetime: Option<chrono::DateTime<Utc>>,
    pub genre: Option<String>,
    pub dresscode: Option<String>,
    pub entry_fee: Option<f64>,
    pub is_public: Option<bool>,
}

impl UpdatePartyDto {
    pub fn validate(&self) -> Result<(), AppError> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(AppError::bad_request("title must not be blank"));
        }
        if matches!(&self.location, Some(l) if l.trim().is_empty()) {
            return Err(AppError::bad_request("location must not be blank"));
        }
        validate_fee(self.entry_fee)?;
        validate_coordinates(self.latitude, self.longitude)
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.datetime.is_none()
            && self.genre.is_none()
            && self.dresscode.is_none()
            && self.entry_fee.is_none()
            && self.is_public.is_none()
    }
}

/// Trimmed text, or `None` when nothing is left.
pub fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn validate_fee(fee: Option<f64>) -> Result<(), AppError> {
    match fee {
        Some(f) if !f.is_finite() || f < 0.0 => {
            Err(AppError::bad_request("entry fee must be a non-negative amount"))
        }
        _ => Ok(()),
    }
}

fn validate_coordinates(lat: Option<f64>, lon: Option<f64>) -> Result<(), AppError> {
    match (lat, lon) {
        (None, None) => Ok(()),
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AppError::bad_request("latitude out of range"));
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(AppError::bad_request("longitude out of range"));
            }
            Ok(())
        }
        _ => Err(AppError::bad_request("latitude and longitude must be given together")),
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JoinPartyDto {
    pub access_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewCommentDto {
    pub comment: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UpdateProfileDto {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PartyDetails {
    pub party: Party,
    pub host: Option<Profile>,
    pub likes_count: i64,
    pub attendees_count: i64,
    pub attendees: Vec<Profile>,
    pub comments: Vec<Comment>,
    pub liked: bool,
    pub attending: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub unread_count: usize,
    pub notifications: Vec<Notification>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn new_party() -> NewPartyDto {
        NewPartyDto {
            title: "Rooftop".into(),
            description: None,
            location: "Zürich".into(),
            latitude: Some(47.3769),
            longitude: Some(8.5417),
            datetime: Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap(),
            genre: Some("Techno".into()),
            dresscode: None,
            entry_fee: Some(10.0),
            is_public: true,
        }
    }

    #[test]
    fn complete_party_is_valid() {
        assert!(new_party().validate().is_ok());
    }

    #[rstest]
    #[case("", "Zürich", "title is required")]
    #[case("   ", "Zürich", "title is required")]
    #[case("Rooftop", "", "location is required")]
    fn blank_required_fields_block_submission(
        #[case] title: &str,
        #[case] location: &str,
        #[case] message: &str,
    ) {
        let dto = NewPartyDto {
            title: title.into(),
            location: location.into(),
            ..new_party()
        };
        assert_eq!(dto.validate(), Err(AppError::bad_request(message)));
    }

    #[rstest]
    #[case(Some(95.0), Some(8.0))]
    #[case(Some(47.0), Some(-181.0))]
    #[case(Some(47.0), None)]
    fn bad_coordinates_are_rejected(#[case] lat: Option<f64>, #[case] lon: Option<f64>) {
        let dto = NewPartyDto { latitude: lat, longitude: lon, ..new_party() };
        assert!(matches!(dto.validate(), Err(AppError::BadClientData(_))));
    }

    #[test]
    fn negative_fee_is_rejected() {
        let dto = NewPartyDto { entry_fee: Some(-1.0), ..new_party() };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn is_public_defaults_to_true() {
        let dto: NewPartyDto = serde_json::from_value(serde_json::json!({
            "title": "Rooftop",
            "location": "Zürich",
            "datetime": "2024-06-01T20:00:00Z"
        }))
        .unwrap();
        assert!(dto.is_public);
        assert_eq!(dto.description, None);
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdatePartyDto::default().is_empty());
        let dto = UpdatePartyDto { genre: Some("House".into()), ..Default::default() };
        assert!(!dto.is_empty());
        assert!(dto.validate().is_ok());
    }

    #[rstest]
    #[case("  House ", Some("House"))]
    #[case("   ", None)]
    #[case("", None)]
    fn non_blank_trims_or_clears(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(non_blank(raw).as_deref(), expected);
    }

    #[test]
    fn blank_title_update_is_rejected() {
        let dto = UpdatePartyDto { title: Some(" ".into()), ..Default::default() };
        assert!(dto.validate().is_err());
    }

    #[rstest]
    #[case("", "secret1", "secret1", "username is required")]
    #[case("anna", "short", "short", "password must be at least 6 characters")]
    #[case("anna", "secret1", "secret2", "passwords do not match")]
    fn register_validation(
        #[case] username: &str,
        #[case] pwd: &str,
        #[case] confirm: &str,
        #[case] message: &str,
    ) {
        let req = RegisterRequest {
            username: username.into(),
            display_name: None,
            pwd: pwd.into(),
            pwd_confirm: confirm.into(),
        };
        assert_eq!(req.validate(), Err(AppError::bad_request(message)));
    }
}
