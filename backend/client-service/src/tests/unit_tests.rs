/// Pure unit tests for client-service core logic (no database required)
///
/// These tests cover output sanitization, the document representation, and
/// the OTP lifecycle across modules.
use crate::models::client::ClientResponse;
use crate::services::otp;
use crate::tests::fixtures::*;
use mongodb::bson;

// ============================================================================
// Sanitization Tests
// ============================================================================

#[test]
fn test_sanitized_output_never_leaks_secrets() {
    // GIVEN: A client record carrying every secret field
    let client = test_client();

    // WHEN: We project it to the response shape
    let response = ClientResponse::from(&client);
    let json = serde_json::to_value(&response).expect("serialization should succeed");
    let object = json.as_object().expect("response should be a JSON object");

    // THEN: No secret field appears in the output
    for hidden in [
        "password",
        "refreshToken",
        "verificationToken",
        "otp",
        "otpExpires",
        "tokenVersion",
    ] {
        assert!(
            !object.contains_key(hidden),
            "sanitized output must not contain '{}'",
            hidden
        );
    }

    // AND: The public fields survive
    assert_eq!(object["id"], client.id.to_hex());
    assert_eq!(object["email"], TEST_EMAIL);
    assert_eq!(object["phone"], TEST_PHONE);
    assert_eq!(object["verified"], false);
}

#[test]
fn test_sanitized_output_serializes_camel_case_timestamps() {
    let client = test_client();
    let json =
        serde_json::to_value(ClientResponse::from(&client)).expect("serialization should succeed");

    assert!(json.get("createdAt").is_some());
    assert!(json.get("updatedAt").is_some());
    assert!(json.get("created_at").is_none());
}

// ============================================================================
// Document Representation Tests
// ============================================================================

#[test]
fn test_client_document_round_trip() {
    // GIVEN: A fully-populated client
    let client = test_client();

    // WHEN: We serialize to BSON and back
    let document = bson::to_document(&client).expect("BSON serialization should succeed");
    let decoded: crate::models::Client =
        bson::from_document(document.clone()).expect("BSON deserialization should succeed");

    // THEN: The record survives unchanged
    assert_eq!(decoded, client);

    // AND: Field names are the store's camelCase ones
    assert!(document.contains_key("_id"));
    assert!(document.contains_key("refreshToken"));
    assert!(document.contains_key("verificationToken"));
    assert!(document.contains_key("tokenVersion"));
    assert!(document.contains_key("otpExpires"));
    assert!(document.contains_key("createdAt"));
    assert!(document.contains_key("updatedAt"));
}

#[test]
fn test_cleared_otp_serializes_as_null() {
    // otp and otpExpires are cleared together, both to null
    let mut client = test_client();
    client.otp = None;
    client.otp_expires = None;

    let document = bson::to_document(&client).expect("BSON serialization should succeed");
    assert_eq!(document.get("otp"), Some(&bson::Bson::Null));
    assert_eq!(document.get("otpExpires"), Some(&bson::Bson::Null));
}

// ============================================================================
// Credential Tests
// ============================================================================

#[test]
fn test_password_hash_round_trip() {
    // GIVEN: The fixture password
    // WHEN: We hash it
    let hash = crate::security::hash_password(TEST_PASSWORD).expect("hashing should succeed");

    // THEN: The original plaintext verifies and any other string fails
    assert!(crate::security::verify_password(TEST_PASSWORD, &hash)
        .expect("verification should succeed"));
    assert!(!crate::security::verify_password("some other string", &hash)
        .expect("verification should succeed"));
}

// ============================================================================
// OTP Lifecycle Tests
// ============================================================================

#[test]
fn test_otp_lifecycle_verifies_exactly_once() {
    // GIVEN: A client with a freshly generated code
    let (code, expires) = otp::generate();
    let mut client = test_client();
    client.otp = Some(code.clone());
    client.otp_expires = Some(expires);

    // WHEN: The correct code is presented before expiry
    let first = otp::verify(client.otp.as_deref(), client.otp_expires, &code);

    // THEN: Verification succeeds
    assert!(first.is_ok());

    // AND: Once the pair is cleared, the same code no longer verifies
    client.otp = None;
    client.otp_expires = None;
    let second = otp::verify(client.otp.as_deref(), client.otp_expires, &code);
    assert!(second.is_err());
}

#[test]
fn test_otp_rejects_wrong_code_without_clearing() {
    let client = test_client();

    let result = otp::verify(client.otp.as_deref(), client.otp_expires, "000000");
    assert!(result.is_err());

    // The stored pair is untouched by a failed attempt
    assert!(client.otp.is_some());
    assert!(client.otp_expires.is_some());
}
