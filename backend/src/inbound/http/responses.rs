//! Response bodies shared by the write endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::{CatalogueError, Error, FieldError};

/// Acknowledgement returned by every successful write.
///
/// Example JSON: `{"message":"User created successfully","id":3}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAck {
    pub message: String,
    /// Identifier of the created row; omitted for updates and deletes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
}

impl WriteAck {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
        }
    }

    pub fn created(message: impl Into<String>, id: impl Into<i32>) -> Self {
        Self {
            message: message.into(),
            id: Some(id.into()),
        }
    }
}

/// Payload validation failures share the use-case error mapping.
pub(crate) fn invalid_field(err: FieldError) -> Error {
    Error::from(CatalogueError::from(err))
}
