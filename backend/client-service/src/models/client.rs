use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Gender enum stored as its exact variant name in BSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// Client document - core identity entity
///
/// `otp`/`otp_expires` are always written together; both null means no
/// verification is pending. `refresh_token` holds the single active
/// session's refresh token, null when logged out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub gender: Gender,
    pub password: String,
    pub phone: String,
    pub avatar: Option<String>,
    pub verified: bool,
    pub refresh_token: Option<String>,
    pub verification_token: Option<String>,
    pub token_version: i32,
    pub otp: Option<String>,
    pub otp_expires: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Login request
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Email-keyed OTP verification request
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyEmailRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 6))]
    pub otp: String,
}

/// Id-keyed OTP verification request
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 6, max = 6))]
    pub otp: String,
}

/// Token refresh request (token may also arrive via cookie)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

/// Listing query parameters
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListClientsQuery {
    pub page: Option<u64>,
    pub limit: Option<i64>,
    pub verified: Option<bool>,
    pub gender: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Sanitized client projection
///
/// Never carries password, refresh token, OTP fields, or the verification
/// token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub gender: Gender,
    pub phone: String,
    pub avatar: Option<String>,
    pub verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Client> for ClientResponse {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id.to_hex(),
            name: client.name.clone(),
            email: client.email.clone(),
            age: client.age,
            gender: client.gender,
            phone: client.phone.clone(),
            avatar: client.avatar.clone(),
            verified: client.verified,
            created_at: client
                .created_at
                .try_to_rfc3339_string()
                .unwrap_or_default(),
            updated_at: client
                .updated_at
                .try_to_rfc3339_string()
                .unwrap_or_default(),
        }
    }
}

/// Auth response with tokens (register, login, id-keyed OTP verification)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub client: ClientResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh response carrying the rotated pair
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Paginated listing payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientListResponse {
    pub clients: Vec<ClientResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: i64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// Page metadata derived from a total count and page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMeta {
    /// `page` is 1-based; `limit` must be positive (callers clamp)
    pub fn compute(total: u64, page: u64, limit: i64) -> Self {
        let limit = limit.max(1) as u64;
        let total_pages = total.div_ceil(limit);
        Self {
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1 && total_pages > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_round_trips_through_strings() {
        assert_eq!(Gender::from_str("Male"), Some(Gender::Male));
        assert_eq!(Gender::from_str("female"), Some(Gender::Female));
        assert_eq!(Gender::from_str("OTHER"), Some(Gender::Other));
        assert_eq!(Gender::from_str("unknown"), None);
        assert_eq!(Gender::Male.as_str(), "Male");
    }

    #[test]
    fn gender_bson_value_matches_as_str() {
        // Listing filters compare as_str against the stored value
        let value = serde_json::to_value(Gender::Female).expect("serialization should succeed");
        assert_eq!(value, serde_json::Value::String("Female".to_string()));
        assert_eq!(value.as_str(), Some(Gender::Female.as_str()));
    }

    #[test]
    fn page_meta_middle_page() {
        // GIVEN: 25 records windowed at 10 per page
        // WHEN: page 2 is requested
        let meta = PageMeta::compute(25, 2, 10);

        // THEN: three pages total with neighbors on both sides
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(meta.has_prev_page);
    }

    #[test]
    fn page_meta_first_and_last_pages() {
        let first = PageMeta::compute(25, 1, 10);
        assert!(first.has_next_page);
        assert!(!first.has_prev_page);

        let last = PageMeta::compute(25, 3, 10);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);
    }

    #[test]
    fn page_meta_empty_collection() {
        let meta = PageMeta::compute(0, 1, 10);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_prev_page);
    }

    #[test]
    fn page_meta_exact_multiple() {
        let meta = PageMeta::compute(20, 2, 10);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next_page);
        assert!(meta.has_prev_page);
    }
}
