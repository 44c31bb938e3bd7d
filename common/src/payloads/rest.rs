use crate::User;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Register {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    pub major: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePassword {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEmail {
    pub new_email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportMaterial {
    pub comment: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomSort {
    Newest,
    Oldest,
}

impl Default for RoomSort {
    fn default() -> Self {
        RoomSort::Newest
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RoomsQuery {
    pub search: Option<String>,
    pub sort: Option<RoomSort>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MyRoomsFilter {
    Created,
    Joined,
}

impl Default for MyRoomsFilter {
    fn default() -> Self {
        MyRoomsFilter::Joined
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MyRoomsQuery {
    pub filter: Option<MyRoomsFilter>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SavedQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveToggled {
    pub msg: String,
    pub is_saved: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub msg: String,
}

impl StatusMessage {
    pub fn new(msg: &str) -> Self {
        Self {
            msg: msg.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvatarUploaded {
    pub avatar_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmailUpdated {
    pub msg: String,
    pub email: String,
}
