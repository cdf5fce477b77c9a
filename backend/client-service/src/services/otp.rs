/// One-time code generation and verification
///
/// Codes live on the client document together with their expiry; both
/// fields are always set or cleared as a pair.
use crate::error::{ApiError, Result};
use mongodb::bson::DateTime;
use rand::Rng;

/// OTP expiration time in seconds (5 minutes)
pub const OTP_EXPIRY_SECS: i64 = 300;

/// Generate a 6-digit code and its expiry timestamp
///
/// The code is drawn uniformly from [100000, 999999].
pub fn generate() -> (String, DateTime) {
    let code = rand::thread_rng().gen_range(100_000..=999_999);
    let expires = DateTime::from_millis(DateTime::now().timestamp_millis() + OTP_EXPIRY_SECS * 1000);
    (code.to_string(), expires)
}

/// Check a supplied code against the stored code and expiry
///
/// Comparison is an exact string match.
pub fn verify(stored: Option<&str>, expires: Option<DateTime>, supplied: &str) -> Result<()> {
    match (stored, expires) {
        (Some(code), Some(expiry)) if code == supplied && expiry > DateTime::now() => Ok(()),
        _ => Err(ApiError::Unauthorized(
            "Invalid or expired OTP".to_string(),
        )),
    }
}
