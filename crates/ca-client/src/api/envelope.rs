// ABOUTME: The {error, message, payload} wrapper around every CA server response.
// ABOUTME: Decoded once at the HTTP boundary into a typed Result.

use serde::Deserialize;
use thiserror::Error;

/// A failure the CA server reported with `error: true`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServerError {
    pub message: String,
}

/// Raw response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub error: bool,
    pub message: Option<String>,
    pub payload: Option<T>,
}

impl<T> Envelope<T> {
    /// Splits the envelope into the payload or the server's error.
    ///
    /// `Ok(None)` means the server reported success without a payload.
    pub fn into_result(self) -> Result<Option<T>, ServerError> {
        if self.error {
            return Err(ServerError {
                message: self
                    .message
                    .unwrap_or_else(|| "CA server reported an error without a message".to_string()),
            });
        }
        Ok(self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Result<Option<String>, ServerError> {
        serde_json::from_str::<Envelope<String>>(json)
            .expect("should decode")
            .into_result()
    }

    #[test]
    fn test_success_yields_payload() {
        assert_eq!(
            decode(r#"{"error": false, "payload": "AAAB3"}"#),
            Ok(Some("AAAB3".to_string()))
        );
    }

    #[test]
    fn test_error_yields_message() {
        let err = decode(r#"{"error": true, "message": "bad creds"}"#).unwrap_err();
        assert_eq!(err.message, "bad creds");
        assert_eq!(err.to_string(), "bad creds");
    }

    #[test]
    fn test_error_without_message_still_fails() {
        let err = decode(r#"{"error": true}"#).unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_error_flag_wins_over_payload() {
        assert!(decode(r#"{"error": true, "message": "no", "payload": "x"}"#).is_err());
    }

    #[test]
    fn test_missing_payload_is_none() {
        assert_eq!(decode(r#"{"error": false}"#), Ok(None));
    }
}
