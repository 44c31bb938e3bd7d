use backend::services;
use common::{Material, Room, User};
use sqlx::SqliteConnection;

pub async fn create_material(
    conn: &mut SqliteConnection,
    room: &Room,
    uploader: &User,
    file_name: &str,
) -> Material {
    let material = Material::new(
        room.id,
        uploader.id,
        file_name.to_string(),
        format!("uploads/materials/{}", file_name),
        1024,
    );

    services::material::create(conn, material)
        .await
        .expect("failed to create material")
}
