/// Test fixtures and helpers for client-service tests
use crate::config::JwtSettings;
use crate::models::client::{Client, Gender};
use crate::security::TokenService;
use mongodb::bson::{oid::ObjectId, DateTime};

/// Standard test client data
pub const TEST_EMAIL: &str = "client@example.com";
pub const TEST_PHONE: &str = "+14155551234";
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// JWT settings with distinct per-class secrets
pub fn test_jwt_settings() -> JwtSettings {
    JwtSettings {
        access_secret: "test-access-secret".to_string(),
        access_ttl_secs: 900,
        refresh_secret: "test-refresh-secret".to_string(),
        refresh_ttl_secs: 2_592_000,
        verification_secret: "test-verification-secret".to_string(),
        verification_ttl_secs: 86_400,
    }
}

pub fn test_token_service() -> TokenService {
    TokenService::new(&test_jwt_settings())
}

/// A fully-populated client record with a pending OTP
pub fn test_client() -> Client {
    let now = DateTime::now();
    Client {
        id: ObjectId::new(),
        name: "Test Client".to_string(),
        email: TEST_EMAIL.to_string(),
        age: 30,
        gender: Gender::Other,
        password: "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$placeholderhash".to_string(),
        phone: TEST_PHONE.to_string(),
        avatar: Some("https://cdn.clientbase.dev/avatars/test".to_string()),
        verified: false,
        refresh_token: Some("stored-refresh-token".to_string()),
        verification_token: Some("stored-verification-token".to_string()),
        token_version: 3,
        otp: Some("123456".to_string()),
        otp_expires: Some(DateTime::from_millis(now.timestamp_millis() + 300_000)),
        created_at: now,
        updated_at: now,
    }
}
