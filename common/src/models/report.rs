use crate::Material;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_REPORT_COMMENT_LENGTH: usize = 500;

/// A single report against a material, as returned by the per-material
/// report listing (includes the reporter's contact details).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub reporter_name: String,
    pub reporter_email: String,
}

/// A report entry nested inside the aggregate reported-materials view.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: Uuid,
    pub comment: String,
    pub reporter_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportedMaterial {
    #[serde(flatten)]
    pub material: Material,
    pub room_name: String,
    pub room_topic: String,
    pub uploader_name: Option<String>,
    pub report_count: i64,
    pub last_reported_at: DateTime<Utc>,
    pub reports: Vec<ReportEntry>,
}
