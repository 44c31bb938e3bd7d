use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub major: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(full_name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name,
            email,
            password_hash,
            avatar_url: None,
            major: None,
            bio: None,
            created_at: Utc::now(),
        }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileStats {
    pub rooms_joined: i64,
    pub materials_shared: i64,
}

/// A room entry in the profile's recent activity list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinedRoom {
    pub id: Uuid,
    pub name: String,
    pub topic: String,
    pub member_count: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub stats: ProfileStats,
    pub joined_rooms: Vec<JoinedRoom>,
}
