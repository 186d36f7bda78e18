use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness payload returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service for the OSS HTTP surface
///
/// Reports liveness only. Storage readiness is established at startup, where a missing or
/// unwritable root aborts the process before any request is served.
#[derive(Clone, Debug, Default)]
pub struct HealthService;

impl HealthService {
    /// Check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "OSS is alive".into(),
        }
    }
}
