pub mod errors;
mod models;
pub mod payloads;

pub use models::*;
