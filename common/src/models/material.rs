use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

impl Material {
    pub fn new(
        room_id: Uuid,
        user_id: Uuid,
        file_name: String,
        file_path: String,
        file_size: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            user_id,
            file_name,
            file_path,
            file_size,
            created_at: Utc::now(),
        }
    }
}

impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A material as listed inside a room.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialRecord {
    #[serde(flatten)]
    pub material: Material,
    pub uploaded_by_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_saved: Option<bool>,
}

/// A material in a user's personal saved list, with its room context.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedMaterial {
    #[serde(flatten)]
    pub material: Material,
    pub saved_at: DateTime<Utc>,
    pub room_name: String,
    pub room_topic: String,
}
