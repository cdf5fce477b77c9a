/// JWT issuance and validation
///
/// Three token classes, each signed HS256 with its own secret and TTL:
/// - access tokens: sub + email + role + tokenVersion, short-lived
/// - refresh tokens: sub only, long-lived, persisted on the client record
/// - verification tokens: sub + email, used by the email-link flow
use crate::config::JwtSettings;
use crate::error::{ApiError, Result};
use crate::models::client::Client;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Fixed role tag embedded in access tokens
const CLIENT_ROLE: &str = "client";

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (client ObjectId as hex string)
    pub sub: String,
    pub email: String,
    pub role: String,
    pub token_version: i32,
    pub iat: i64,
    pub exp: i64,
}

/// Refresh token claims - subject only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Email-verification link token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationClaims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Access + refresh token pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and validates all three token classes
#[derive(Clone)]
pub struct TokenService {
    access_secret: String,
    access_ttl_secs: i64,
    refresh_secret: String,
    refresh_ttl_secs: i64,
    verification_secret: String,
    verification_ttl_secs: i64,
}

impl TokenService {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            access_secret: settings.access_secret.clone(),
            access_ttl_secs: settings.access_ttl_secs,
            refresh_secret: settings.refresh_secret.clone(),
            refresh_ttl_secs: settings.refresh_ttl_secs,
            verification_secret: settings.verification_secret.clone(),
            verification_ttl_secs: settings.verification_ttl_secs,
        }
    }

    /// Issue a short-lived access token for API authentication
    pub fn issue_access_token(&self, client: &Client) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: client.id.to_hex(),
            email: client.email.clone(),
            role: CLIENT_ROLE.to_string(),
            token_version: client.token_version,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_ttl_secs)).timestamp(),
        };

        sign(&claims, &self.access_secret)
    }

    /// Issue a long-lived refresh token
    ///
    /// The caller persists it on the client record, overwriting any prior
    /// value (single active session).
    pub fn issue_refresh_token(&self, client: &Client) -> Result<String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: client.id.to_hex(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.refresh_ttl_secs)).timestamp(),
        };

        sign(&claims, &self.refresh_secret)
    }

    /// Validate an access token and return its claims
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let data = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.access_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }

    /// Validate a refresh token and return the subject id
    pub fn verify_refresh_token(&self, token: &str) -> Result<ObjectId> {
        let data = decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.refresh_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;

        parse_subject(&data.claims.sub)
    }

    /// Issue an email-verification link token
    pub fn issue_verification_token(&self, client: &Client) -> Result<String> {
        let now = Utc::now();
        let claims = VerificationClaims {
            sub: client.id.to_hex(),
            email: client.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.verification_ttl_secs)).timestamp(),
        };

        sign(&claims, &self.verification_secret)
    }

    /// Validate an email-verification link token and return the subject id
    pub fn verify_verification_token(&self, token: &str) -> Result<ObjectId> {
        let data = decode::<VerificationClaims>(
            token,
            &DecodingKey::from_secret(self.verification_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;

        parse_subject(&data.claims.sub)
    }
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
}

fn parse_subject(sub: &str) -> Result<ObjectId> {
    ObjectId::parse_str(sub)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{test_client, test_token_service};

    #[test]
    fn access_token_carries_identity_claims() {
        let service = test_token_service();
        let client = test_client();

        let token = service
            .issue_access_token(&client)
            .expect("issuance should succeed");
        assert_eq!(token.matches('.').count(), 2); // JWT has 3 parts

        let claims = service
            .verify_access_token(&token)
            .expect("validation should succeed");
        assert_eq!(claims.sub, client.id.to_hex());
        assert_eq!(claims.email, client.email);
        assert_eq!(claims.role, "client");
        assert_eq!(claims.token_version, client.token_version);
    }

    #[test]
    fn refresh_token_round_trips_subject() {
        let service = test_token_service();
        let client = test_client();

        let token = service
            .issue_refresh_token(&client)
            .expect("issuance should succeed");
        let subject = service
            .verify_refresh_token(&token)
            .expect("validation should succeed");
        assert_eq!(subject, client.id);
    }

    #[test]
    fn token_classes_do_not_cross_validate() {
        let service = test_token_service();
        let client = test_client();

        // Secrets differ per class, so an access token is not a valid
        // refresh token and vice versa
        let access = service.issue_access_token(&client).unwrap();
        assert!(service.verify_refresh_token(&access).is_err());

        let refresh = service.issue_refresh_token(&client).unwrap();
        assert!(service.verify_access_token(&refresh).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = test_token_service();
        let client = test_client();

        let token = service.issue_refresh_token(&client).unwrap();
        let tampered = format!("{}x", token);
        assert!(service.verify_refresh_token(&tampered).is_err());
    }

    #[test]
    fn expired_refresh_token_is_rejected() {
        let settings = crate::config::JwtSettings {
            access_secret: "access-secret".into(),
            access_ttl_secs: -120,
            refresh_secret: "refresh-secret".into(),
            refresh_ttl_secs: -120,
            verification_secret: "verification-secret".into(),
            verification_ttl_secs: -120,
        };
        let service = TokenService::new(&settings);
        let client = test_client();

        let token = service.issue_refresh_token(&client).unwrap();
        let result = service.verify_refresh_token(&token);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn verification_token_round_trips_subject() {
        let service = test_token_service();
        let client = test_client();

        let token = service.issue_verification_token(&client).unwrap();
        let subject = service
            .verify_verification_token(&token)
            .expect("validation should succeed");
        assert_eq!(subject, client.id);
    }
}
