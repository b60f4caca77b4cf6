pub mod error;
pub mod events;
pub mod gwauth;
pub mod outbox;
pub mod topics;

pub use error::{ErrorCode, ErrorResponse, ServiceError};
pub use events::*;
pub use outbox::OutboxRecord;

use serde::{Deserialize, Serialize};

/// Response of the `ServiceInfo` read every service exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfoResponse {
    pub name: String,
    pub version: String,
}

impl ServiceInfoResponse {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}
