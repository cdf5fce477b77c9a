/// Shared response types for Clientbase services
///
/// Every HTTP operation, success or failure, answers with the same JSON
/// envelope so clients can branch on `success` without inspecting status
/// codes first.
use serde::{Deserialize, Serialize};

/// Uniform JSON response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: Option<T>,
    pub message: String,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    /// Success envelope carrying a payload
    pub fn new(status_code: u16, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code,
            data: Some(data),
            message: message.into(),
            success: status_code < 400,
        }
    }

    /// Failure envelope; `data` is always null
    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            data: None,
            message: message.into(),
            success: false,
        }
    }
}
