mod multipart;
mod seeds;

pub use db::*;
pub use multipart::*;
pub use seeds::*;
