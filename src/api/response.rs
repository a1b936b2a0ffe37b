use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{FilterMode, ReferenceId, Trace, TraceId};
use crate::projection::Projection;

/// Response for a transcript view.
#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub transcript_id: TraceId,

    /// Effective filter after coercion
    pub filter: FilterMode,
    pub filter_label: &'static str,

    pub viewer: ReferenceId,

    /// No action was really executed
    pub dry_run: bool,

    /// Object details were discarded; the transcript is shown unfiltered
    pub details_discarded: bool,

    /// The viewer-scoped transcript
    pub transcript: Trace,

    /// Display name for every referenced identity, placeholders included
    pub names: BTreeMap<ReferenceId, String>,
}

impl From<Projection> for TranscriptResponse {
    fn from(projection: Projection) -> Self {
        let names = projection.names();

        TranscriptResponse {
            transcript_id: projection.trace.id.clone(),
            filter: projection.filter,
            filter_label: projection.filter.label(),
            viewer: projection.viewer,
            dry_run: projection.trace.dry_run,
            details_discarded: projection.trace.details_discarded(),
            transcript: projection.trace,
            names,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            code: code.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "BAD_REQUEST")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "NOT_FOUND")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "INTERNAL_ERROR")
    }
}
