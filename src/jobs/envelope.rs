//! INDD job envelope
//!
//! The descriptor handed to the out-of-process INDD rewriting worker.
//! Created at upload time, serialized as JSON, consumed exactly once by the
//! worker and never mutated here. The worker may pick it up arbitrarily
//! late, so everything it needs travels inside.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rewrite::UtmParams;

/// Work descriptor for the external INDD worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEnvelope {
    pub job_id: Uuid,
    pub user_id: String,
    /// Storage key of the uploaded input document
    pub input_key: String,
    /// Storage key the worker writes the rewritten document to
    pub output_key: String,
    /// Storage key of the worker's per-job report
    pub report_key: String,
    /// Regex sources compiled from the job's format patterns
    pub patterns: Vec<String>,
    /// Base URL matched tokens are appended to
    pub base_url: String,
    pub utm: UtmParams,
    /// Client-chosen name for the output artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_output_name: Option<String>,
    pub submitted_at: DateTime<Utc>,
}
