use chrono::Utc;
use common::payloads::{MyRoomsFilter, RoomSort};
use common::{Room, RoomDetail, RoomMemberInfo, RoomSummary};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

/// What a join attempt did, decided inside a single conditional insert so
/// two concurrent joins can never push a room past its capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyMember,
    Full,
}

// Shared head of every room listing query. `?1` is the (nullable) caller id
// for the membership annotation; further conditions are appended from
// constant fragments only, with user input always going through binds.
const SUMMARY_SELECT: &str = "
select s.id,
       s.name,
       s.topic,
       s.description,
       s.max_capacity,
       s.cover_image,
       s.created_by,
       s.created_at,
       u.full_name as creator_name,
       (select count(*) from room_members rm where rm.room_id = s.id) as current_members,
       exists(select 1
              from room_members rm2
              where rm2.room_id = s.id
                and rm2.user_id = ?1) as caller_is_member
from study_rooms s
         left join users u on s.created_by = u.id";

pub(crate) fn map_room(row: &SqliteRow) -> Result<Room, sqlx::Error> {
    Ok(Room {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        topic: row.try_get("topic")?,
        description: row.try_get("description")?,
        max_capacity: row.try_get("max_capacity")?,
        cover_image: row.try_get("cover_image")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_summary(row: &SqliteRow, annotate: bool) -> Result<RoomSummary, sqlx::Error> {
    Ok(RoomSummary {
        room: map_room(row)?,
        creator_name: row.try_get("creator_name")?,
        current_members: row.try_get("current_members")?,
        is_member: if annotate {
            Some(row.try_get("caller_is_member")?)
        } else {
            None
        },
    })
}

pub async fn create(db: &mut SqliteConnection, room: Room) -> anyhow::Result<Room> {
    sqlx::query(
        "
            insert into study_rooms (id, name, topic, description, max_capacity, cover_image,
                                     created_by, created_at)
            values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);
        ",
    )
    .bind(room.id)
    .bind(&room.name)
    .bind(&room.topic)
    .bind(&room.description)
    .bind(room.max_capacity)
    .bind(&room.cover_image)
    .bind(room.created_by)
    .bind(room.created_at)
    .execute(&mut *db)
    .await?;

    Ok(room)
}

pub async fn get(db: &mut SqliteConnection, id: Uuid) -> anyhow::Result<Option<Room>> {
    let row = sqlx::query("select * from study_rooms where id = ?1;")
        .bind(id)
        .fetch_optional(&mut *db)
        .await?;

    row.as_ref().map(map_room).transpose().map_err(Into::into)
}

pub async fn list(
    db: &mut SqliteConnection,
    search: Option<&str>,
    sort: RoomSort,
    caller: Option<Uuid>,
) -> anyhow::Result<Vec<RoomSummary>> {
    let mut sql = String::from(SUMMARY_SELECT);
    sql.push_str(
        "
where (?2 is null
    or lower(s.name) like '%' || lower(?2) || '%' escape '\\'
    or lower(s.topic) like '%' || lower(?2) || '%' escape '\\')",
    );
    sql.push_str(match sort {
        RoomSort::Newest => " order by s.created_at desc;",
        RoomSort::Oldest => " order by s.created_at asc;",
    });

    let rows = sqlx::query(&sql)
        .bind(caller)
        .bind(search.map(super::escape_like))
        .fetch_all(&mut *db)
        .await?;

    rows.iter()
        .map(|row| map_summary(row, caller.is_some()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub async fn list_mine(
    db: &mut SqliteConnection,
    user_id: Uuid,
    filter: MyRoomsFilter,
) -> anyhow::Result<Vec<RoomSummary>> {
    let mut sql = String::from(SUMMARY_SELECT);
    sql.push_str(match filter {
        MyRoomsFilter::Created => " where s.created_by = ?1",
        MyRoomsFilter::Joined => {
            " where exists(select 1
                           from room_members rm3
                           where rm3.room_id = s.id
                             and rm3.user_id = ?1)"
        }
    });
    sql.push_str(" order by s.created_at desc;");

    let rows = sqlx::query(&sql)
        .bind(user_id)
        .fetch_all(&mut *db)
        .await?;

    rows.iter()
        .map(|row| map_summary(row, true))
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub async fn get_detail(
    db: &mut SqliteConnection,
    id: Uuid,
    caller: Option<Uuid>,
) -> anyhow::Result<Option<RoomDetail>> {
    let mut sql = String::from(SUMMARY_SELECT);
    sql.push_str(" where s.id = ?2;");

    let row = sqlx::query(&sql)
        .bind(caller)
        .bind(id)
        .fetch_optional(&mut *db)
        .await?;

    let row = match row {
        Some(row) => row,
        None => return Ok(None),
    };

    let members = sqlx::query(
        "
            select u.id, u.full_name, u.avatar_url
            from room_members rm
                     join users u on rm.user_id = u.id
            where rm.room_id = ?1
            order by rm.joined_at asc;
        ",
    )
    .bind(id)
    .fetch_all(&mut *db)
    .await?
    .iter()
    .map(|row| {
        Ok::<_, sqlx::Error>(RoomMemberInfo {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            avatar_url: row.try_get("avatar_url")?,
        })
    })
    .collect::<Result<Vec<_>, _>>()?;

    let is_member = caller.is_some() && row.try_get::<bool, _>("caller_is_member")?;

    Ok(Some(RoomDetail {
        room: map_room(&row)?,
        creator_name: row.try_get("creator_name")?,
        current_members: row.try_get("current_members")?,
        members,
        is_member,
    }))
}

pub async fn is_member(
    db: &mut SqliteConnection,
    room_id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<bool> {
    let row = sqlx::query(
        "
            select exists(select 1
                          from room_members
                          where room_id = ?1
                            and user_id = ?2) as is_member;
        ",
    )
    .bind(room_id)
    .bind(user_id)
    .fetch_one(&mut *db)
    .await?;

    Ok(row.try_get("is_member")?)
}

pub async fn member_count(db: &mut SqliteConnection, room_id: Uuid) -> anyhow::Result<i64> {
    let row = sqlx::query("select count(*) as count from room_members where room_id = ?1;")
        .bind(room_id)
        .fetch_one(&mut *db)
        .await?;

    Ok(row.try_get("count")?)
}

pub async fn join(
    db: &mut SqliteConnection,
    room: &Room,
    user_id: Uuid,
) -> anyhow::Result<JoinOutcome> {
    if is_member(&mut *db, room.id, user_id).await? {
        return Ok(JoinOutcome::AlreadyMember);
    }

    // Capacity check and insert in one statement; a lost race on the
    // membership key comes back as the primary key violation.
    let result = sqlx::query(
        "
            insert into room_members (room_id, user_id, joined_at)
            select ?1, ?2, ?3
            where (select count(*) from room_members where room_id = ?1)
                < (select max_capacity from study_rooms where id = ?1);
        ",
    )
    .bind(room.id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut *db)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => Ok(JoinOutcome::Full),
        Ok(_) => Ok(JoinOutcome::Joined),
        Err(sqlx::Error::Database(e)) if e.message().contains("UNIQUE constraint failed") => {
            Ok(JoinOutcome::AlreadyMember)
        }
        Err(e) => Err(e.into()),
    }
}

/// Idempotent: leaving a room one never joined is a no-op.
pub async fn leave(db: &mut SqliteConnection, room_id: Uuid, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("delete from room_members where room_id = ?1 and user_id = ?2;")
        .bind(room_id)
        .bind(user_id)
        .execute(&mut *db)
        .await?;
    Ok(())
}

pub async fn update(db: &mut SqliteConnection, room: Room) -> anyhow::Result<Room> {
    sqlx::query(
        "
            update study_rooms
            set name         = ?1,
                topic        = ?2,
                description  = ?3,
                max_capacity = ?4,
                cover_image  = ?5
            where id = ?6;
        ",
    )
    .bind(&room.name)
    .bind(&room.topic)
    .bind(&room.description)
    .bind(room.max_capacity)
    .bind(&room.cover_image)
    .bind(room.id)
    .execute(&mut *db)
    .await?;

    Ok(room)
}

pub async fn delete(db: &mut SqliteConnection, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("delete from study_rooms where id = ?1;")
        .bind(id)
        .execute(&mut *db)
        .await?;
    Ok(())
}
