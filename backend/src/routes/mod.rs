pub mod material;
pub mod room;
