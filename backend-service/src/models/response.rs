use serde::{Deserialize, Serialize};

/// JSON body shared by the `/backend` and `/notification` endpoints.
///
/// Serialized as `{"Status":<code>,"Message":"<text>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseEnvelope {
    pub status: u16,
    pub message: String,
}

impl ResponseEnvelope {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}
