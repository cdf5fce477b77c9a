/// SMS delivery of verification codes via AWS SNS
use crate::error::{ApiError, Result};
use aws_sdk_sns::Client as SnsClient;
use tracing::{error, info, warn};

/// SMS transport wrapper (SNS or dev-mode logging)
#[derive(Clone)]
pub struct SmsService {
    client: Option<SnsClient>,
}

impl SmsService {
    pub fn new(client: Option<SnsClient>) -> Self {
        Self { client }
    }

    /// Check if an SNS client is configured
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Send a verification code
    pub async fn send_otp(&self, phone: &str, code: &str) -> Result<()> {
        let message = format!(
            "Your Clientbase verification code is: {}. This code expires in 5 minutes.",
            code
        );

        match &self.client {
            Some(sns) => {
                let result = sns
                    .publish()
                    .phone_number(phone)
                    .message(&message)
                    .message_attributes(
                        "AWS.SNS.SMS.SMSType",
                        aws_sdk_sns::types::MessageAttributeValue::builder()
                            .data_type("String")
                            .string_value("Transactional")
                            .build()
                            .map_err(|e| {
                                ApiError::Internal(format!(
                                    "Failed to build SMS attribute: {}",
                                    e
                                ))
                            })?,
                    )
                    .send()
                    .await;

                match result {
                    Ok(output) => {
                        info!(
                            phone = %mask_phone(phone),
                            message_id = ?output.message_id(),
                            "SMS sent successfully"
                        );
                        Ok(())
                    }
                    Err(e) => {
                        error!(
                            phone = %mask_phone(phone),
                            error = %e,
                            "Failed to send SMS"
                        );
                        Err(ApiError::Internal(format!("Failed to send SMS: {}", e)))
                    }
                }
            }
            None => {
                // Development mode: Log OTP instead of sending SMS
                warn!(
                    phone = %mask_phone(phone),
                    otp = %code,
                    "SMS service not configured - OTP logged for development"
                );
                Ok(())
            }
        }
    }
}

/// Mask phone number for logging
pub fn mask_phone(phone: &str) -> String {
    if phone.len() <= 4 {
        return "****".to_string();
    }
    let visible = &phone[phone.len() - 4..];
    format!("****{}", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dev_mode_send_succeeds() {
        let service = SmsService::new(None);
        assert!(!service.is_enabled());
        assert!(service.send_otp("+14155551234", "123456").await.is_ok());
    }

    #[test]
    fn mask_phone_keeps_last_four() {
        assert_eq!(mask_phone("+14155551234"), "****1234");
        assert_eq!(mask_phone("123"), "****");
    }
}
