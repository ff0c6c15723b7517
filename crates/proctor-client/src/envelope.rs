//! The response envelope shared by every backend endpoint.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// `{ success, data, message }` as returned by the exam backend.
///
/// Paginated listings also carry `total`, the number of items across all
/// pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: String::new(),
            total: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            total: None,
        }
    }

    /// One page of a listing with `total` items overall.
    pub fn page(data: T, total: u64) -> Self {
        Self {
            total: Some(total),
            ..Self::ok(data)
        }
    }

    /// Unwrap the payload of a successful envelope.
    pub fn into_data(self) -> Result<T, ClientError> {
        if !self.success {
            return Err(ClientError::Rejected(self.message));
        }
        self.data
            .ok_or_else(|| ClientError::Malformed("success response without data".into()))
    }

    /// Check a successful envelope whose payload is not needed.
    pub fn into_ack(self) -> Result<(), ClientError> {
        if self.success {
            Ok(())
        } else {
            Err(ClientError::Rejected(self.message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_yields_data() {
        let env: ApiResponse<u32> =
            serde_json::from_str(r#"{"success": true, "data": 7, "message": "ok"}"#).unwrap();
        assert_eq!(env.into_data().unwrap(), 7);
    }

    #[test]
    fn failure_envelope_is_rejection() {
        let env: ApiResponse<u32> =
            serde_json::from_str(r#"{"success": false, "message": "Exam not found"}"#).unwrap();
        let err = env.into_data().unwrap_err();
        assert!(matches!(err, ClientError::Rejected(ref m) if m == "Exam not found"));
    }

    #[test]
    fn success_without_data_is_malformed() {
        let env: ApiResponse<u32> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(env.into_data(), Err(ClientError::Malformed(_))));
        let env: ApiResponse<u32> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(env.into_ack().is_ok());
    }

    #[test]
    fn constructed_envelopes_serialize_like_the_backend() {
        let ok = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"][1], 2);
        assert!(ok.get("total").is_none());

        let page = serde_json::to_value(ApiResponse::page(vec![1], 9)).unwrap();
        assert_eq!(page["total"], 9);

        let rejected: ApiResponse<()> = ApiResponse::rejected("Auth failed");
        assert!(matches!(rejected.into_ack(), Err(ClientError::Rejected(m)) if m == "Auth failed"));
    }
}
