mod jwt;
mod routes;

pub use jwt::{create_jwt, parse_token, Claims};
pub use routes::routes;

pub const BCRYPT_COST: u32 = 10;
