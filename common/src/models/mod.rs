mod material;
mod report;
mod room;
mod user;

pub use material::{Material, MaterialRecord, SavedMaterial};
pub use report::{Report, ReportEntry, ReportedMaterial, MAX_REPORT_COMMENT_LENGTH};
pub use room::{Room, RoomDetail, RoomMemberInfo, RoomSummary};
pub use user::{JoinedRoom, Profile, ProfileStats, User};
