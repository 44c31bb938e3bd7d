use backend::auth::{create_jwt, BCRYPT_COST};
use backend::services;
use common::User;
use sqlx::SqliteConnection;

pub async fn create_user(
    conn: &mut SqliteConnection,
    full_name: &str,
    email: &str,
    password: &str,
) -> User {
    let password_hash = bcrypt::hash(password, BCRYPT_COST).expect("failed to hash password");
    let user = User::new(full_name.to_string(), email.to_string(), password_hash);

    services::user::create(conn, user)
        .await
        .expect("failed to create user")
}

pub async fn create_authenticated_user(
    conn: &mut SqliteConnection,
    full_name: &str,
    email: &str,
    password: &str,
) -> (User, String) {
    let user = create_user(conn, full_name, email, password).await;
    let token = create_jwt(&user).expect("failed to create token");
    (user, token)
}
