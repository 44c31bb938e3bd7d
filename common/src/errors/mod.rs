mod rest;

pub use rest::ApiError;
