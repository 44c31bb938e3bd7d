use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub topic: String,
    pub description: Option<String>,
    pub max_capacity: i64,
    pub cover_image: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub const MIN_CAPACITY: i64 = 2;
    pub const MAX_CAPACITY: i64 = 50;
    pub const DEFAULT_CAPACITY: i64 = 10;

    pub fn new(
        name: String,
        topic: String,
        description: Option<String>,
        max_capacity: i64,
        cover_image: Option<String>,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            topic,
            description,
            max_capacity,
            cover_image,
            created_by,
            created_at: Utc::now(),
        }
    }
}

impl PartialEq for Room {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A room as it appears in listings, annotated with live membership data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomSummary {
    #[serde(flatten)]
    pub room: Room,
    pub creator_name: Option<String>,
    pub current_members: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_member: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomMemberInfo {
    pub id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomDetail {
    #[serde(flatten)]
    pub room: Room,
    pub creator_name: Option<String>,
    pub current_members: i64,
    pub members: Vec<RoomMemberInfo>,
    pub is_member: bool,
}
