mod material;
mod user;

pub use material::*;
pub use room::*;
pub use user::*;
