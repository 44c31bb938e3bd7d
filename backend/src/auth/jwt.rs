use crate::services;
use chrono::{Duration, Utc};
use common::User;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use std::env;
use uuid::Uuid;

lazy_static! {
    static ref KEY: Vec<u8> = env::var("JWT_SECRET")
        .map(String::into_bytes)
        .unwrap_or_else(|_| b"secret".to_vec());
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub subject: String,
    pub exp: usize,
}

pub fn create_jwt(user: &User) -> anyhow::Result<String> {
    let claims = Claims {
        subject: user.id.to_string(),
        exp: (Utc::now() + Duration::days(1)).timestamp() as usize,
    };

    let mut header = Header::new(Algorithm::HS512);
    header.kid = Some("signing_key".to_owned());

    Ok(encode(&header, &claims, &EncodingKey::from_secret(&KEY))?)
}

pub async fn parse_token(db: &mut SqliteConnection, token: &str) -> anyhow::Result<Option<User>> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(&KEY),
        &Validation::new(Algorithm::HS512),
    )?;

    let id = Uuid::parse_str(&token_data.claims.subject)?;

    services::user::get(db, id).await
}
