//! API response and error body types.

use serde::Serialize;

use crate::audit::AuditIssue;

/// Liveness probe body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Service identity body.
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

/// Error body for 4xx responses. Audit rejections carry the full issue
/// list so the caller can see what failed.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<AuditIssue>>,
}
