use common::errors::ApiError;
use common::payloads::UpdateProfile;
use common::{JoinedRoom, Profile, ProfileStats, User};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;
use warp::http::StatusCode;

pub(crate) fn map_user(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        avatar_url: row.try_get("avatar_url")?,
        major: row.try_get("major")?,
        bio: row.try_get("bio")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn create(db: &mut SqliteConnection, user: User) -> anyhow::Result<User> {
    let result = sqlx::query(
        "
            insert into users (id, full_name, email, password_hash, created_at)
            values (?1, ?2, ?3, ?4, ?5);
        ",
    )
    .bind(user.id)
    .bind(&user.full_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .execute(&mut *db)
    .await;

    match result {
        Ok(_) => Ok(user),
        Err(sqlx::Error::Database(db_error))
            if db_error
                .message()
                .contains("UNIQUE constraint failed: users.email") =>
        {
            Err(
                anyhow::Error::from(sqlx::Error::Database(db_error)).context(
                    ApiError::new_with_message_and_status(
                        "User already exists",
                        StatusCode::BAD_REQUEST,
                    ),
                ),
            )
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get(db: &mut SqliteConnection, id: Uuid) -> anyhow::Result<Option<User>> {
    let row = sqlx::query("select * from users where id = ?1;")
        .bind(id)
        .fetch_optional(&mut *db)
        .await?;

    row.as_ref().map(map_user).transpose().map_err(Into::into)
}

pub async fn get_by_email(db: &mut SqliteConnection, email: &str) -> anyhow::Result<Option<User>> {
    let row = sqlx::query("select * from users where email = ?1;")
        .bind(email)
        .fetch_optional(&mut *db)
        .await?;

    row.as_ref().map(map_user).transpose().map_err(Into::into)
}

/// Fields left out of the payload keep their previous values.
pub async fn update_profile(
    db: &mut SqliteConnection,
    id: Uuid,
    data: &UpdateProfile,
) -> anyhow::Result<Option<User>> {
    sqlx::query(
        "
            update users
            set full_name = coalesce(?1, full_name),
                major     = coalesce(?2, major),
                bio       = coalesce(?3, bio)
            where id = ?4;
        ",
    )
    .bind(&data.full_name)
    .bind(&data.major)
    .bind(&data.bio)
    .bind(id)
    .execute(&mut *db)
    .await?;

    get(db, id).await
}

pub async fn update_password(
    db: &mut SqliteConnection,
    id: Uuid,
    password_hash: &str,
) -> anyhow::Result<()> {
    sqlx::query("update users set password_hash = ?1 where id = ?2;")
        .bind(password_hash)
        .bind(id)
        .execute(&mut *db)
        .await?;
    Ok(())
}

pub async fn email_taken(
    db: &mut SqliteConnection,
    email: &str,
    exclude: Uuid,
) -> anyhow::Result<bool> {
    let row = sqlx::query(
        "select exists(select 1 from users where email = ?1 and id != ?2) as taken;",
    )
    .bind(email)
    .bind(exclude)
    .fetch_one(&mut *db)
    .await?;

    Ok(row.try_get("taken")?)
}

pub async fn update_email(db: &mut SqliteConnection, id: Uuid, email: &str) -> anyhow::Result<()> {
    sqlx::query("update users set email = ?1 where id = ?2;")
        .bind(email)
        .bind(id)
        .execute(&mut *db)
        .await?;
    Ok(())
}

pub async fn update_avatar(
    db: &mut SqliteConnection,
    id: Uuid,
    avatar_url: &str,
) -> anyhow::Result<()> {
    sqlx::query("update users set avatar_url = ?1 where id = ?2;")
        .bind(avatar_url)
        .bind(id)
        .execute(&mut *db)
        .await?;
    Ok(())
}

/// Deletes the account; memberships, materials, saves and reports go with it
/// through the foreign key cascades.
pub async fn delete(db: &mut SqliteConnection, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("delete from users where id = ?1;")
        .bind(id)
        .execute(&mut *db)
        .await?;
    Ok(())
}

pub async fn profile(db: &mut SqliteConnection, user: &User) -> anyhow::Result<Profile> {
    let rooms_joined: i64 =
        sqlx::query("select count(*) as count from room_members where user_id = ?1;")
            .bind(user.id)
            .fetch_one(&mut *db)
            .await?
            .try_get("count")?;

    let materials_shared: i64 =
        sqlx::query("select count(*) as count from room_materials where user_id = ?1;")
            .bind(user.id)
            .fetch_one(&mut *db)
            .await?
            .try_get("count")?;

    let joined_rooms = sqlx::query(
        "
            select r.id,
                   r.name,
                   r.topic,
                   (select count(*) from room_members rm where rm.room_id = r.id) as member_count
            from study_rooms r
                     join room_members m on r.id = m.room_id
            where m.user_id = ?1
            order by m.joined_at desc
            limit 5;
        ",
    )
    .bind(user.id)
    .fetch_all(&mut *db)
    .await?
    .iter()
    .map(|row| {
        Ok::<_, sqlx::Error>(JoinedRoom {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            topic: row.try_get("topic")?,
            member_count: row.try_get("member_count")?,
        })
    })
    .collect::<Result<Vec<_>, _>>()?;

    Ok(Profile {
        user: user.clone(),
        stats: ProfileStats {
            rooms_joined,
            materials_shared,
        },
        joined_rooms,
    })
}
