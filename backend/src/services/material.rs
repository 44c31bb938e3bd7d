use chrono::Utc;
use common::{Material, MaterialRecord, Report, ReportEntry, ReportedMaterial, SavedMaterial};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::collections::HashMap;
use uuid::Uuid;

fn map_material(row: &SqliteRow) -> Result<Material, sqlx::Error> {
    Ok(Material {
        id: row.try_get("id")?,
        room_id: row.try_get("room_id")?,
        user_id: row.try_get("user_id")?,
        file_name: row.try_get("file_name")?,
        file_path: row.try_get("file_path")?,
        file_size: row.try_get("file_size")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn create(db: &mut SqliteConnection, material: Material) -> anyhow::Result<Material> {
    sqlx::query(
        "
            insert into room_materials (id, room_id, user_id, file_name, file_path, file_size,
                                        created_at)
            values (?1, ?2, ?3, ?4, ?5, ?6, ?7);
        ",
    )
    .bind(material.id)
    .bind(material.room_id)
    .bind(material.user_id)
    .bind(&material.file_name)
    .bind(&material.file_path)
    .bind(material.file_size)
    .bind(material.created_at)
    .execute(&mut *db)
    .await?;

    Ok(material)
}

pub async fn get(db: &mut SqliteConnection, id: Uuid) -> anyhow::Result<Option<Material>> {
    let row = sqlx::query("select * from room_materials where id = ?1;")
        .bind(id)
        .fetch_optional(&mut *db)
        .await?;

    row.as_ref()
        .map(map_material)
        .transpose()
        .map_err(Into::into)
}

pub async fn list_for_room(
    db: &mut SqliteConnection,
    room_id: Uuid,
    caller: Option<Uuid>,
) -> anyhow::Result<Vec<MaterialRecord>> {
    let rows = sqlx::query(
        "
            select m.id,
                   m.room_id,
                   m.user_id,
                   m.file_name,
                   m.file_path,
                   m.file_size,
                   m.created_at,
                   u.full_name as uploaded_by_name,
                   exists(select 1
                          from saved_materials sm
                          where sm.material_id = m.id
                            and sm.user_id = ?2) as caller_saved
            from room_materials m
                     join users u on m.user_id = u.id
            where m.room_id = ?1
            order by m.created_at desc;
        ",
    )
    .bind(room_id)
    .bind(caller)
    .fetch_all(&mut *db)
    .await?;

    rows.iter()
        .map(|row| {
            Ok::<_, sqlx::Error>(MaterialRecord {
                material: map_material(row)?,
                uploaded_by_name: row.try_get("uploaded_by_name")?,
                is_saved: if caller.is_some() {
                    Some(row.try_get("caller_saved")?)
                } else {
                    None
                },
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Flips the caller's save for a material and returns the new state. The
/// insert is guarded by the (user, material) primary key, so a racing
/// duplicate simply falls through to the delete branch.
pub async fn toggle_save(
    db: &mut SqliteConnection,
    material_id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<bool> {
    let inserted = sqlx::query(
        "
            insert into saved_materials (user_id, material_id, saved_at)
            values (?1, ?2, ?3)
            on conflict (user_id, material_id) do nothing;
        ",
    )
    .bind(user_id)
    .bind(material_id)
    .bind(Utc::now())
    .execute(&mut *db)
    .await?;

    if inserted.rows_affected() == 1 {
        return Ok(true);
    }

    sqlx::query("delete from saved_materials where user_id = ?1 and material_id = ?2;")
        .bind(user_id)
        .bind(material_id)
        .execute(&mut *db)
        .await?;

    Ok(false)
}

pub async fn list_saved(
    db: &mut SqliteConnection,
    user_id: Uuid,
    search: Option<&str>,
) -> anyhow::Result<Vec<SavedMaterial>> {
    let rows = sqlx::query(
        "
            select m.id,
                   m.room_id,
                   m.user_id,
                   m.file_name,
                   m.file_path,
                   m.file_size,
                   m.created_at,
                   sm.saved_at as saved_at,
                   r.name      as room_name,
                   r.topic     as room_topic
            from saved_materials sm
                     join room_materials m on sm.material_id = m.id
                     join study_rooms r on m.room_id = r.id
            where sm.user_id = ?1
              and (?2 is null or lower(m.file_name) like '%' || lower(?2) || '%' escape '\\')
            order by sm.saved_at desc;
        ",
    )
    .bind(user_id)
    .bind(search.map(super::escape_like))
    .fetch_all(&mut *db)
    .await?;

    rows.iter()
        .map(|row| {
            Ok::<_, sqlx::Error>(SavedMaterial {
                material: map_material(row)?,
                saved_at: row.try_get("saved_at")?,
                room_name: row.try_get("room_name")?,
                room_topic: row.try_get("room_topic")?,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub async fn clear_saved(db: &mut SqliteConnection, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("delete from saved_materials where user_id = ?1;")
        .bind(user_id)
        .execute(&mut *db)
        .await?;
    Ok(())
}

/// Repeat reports from the same user are allowed on purpose.
pub async fn create_report(
    db: &mut SqliteConnection,
    material_id: Uuid,
    user_id: Uuid,
    comment: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        "
            insert into material_reports (id, material_id, user_id, comment, created_at)
            values (?1, ?2, ?3, ?4, ?5);
        ",
    )
    .bind(Uuid::new_v4())
    .bind(material_id)
    .bind(user_id)
    .bind(comment)
    .bind(Utc::now())
    .execute(&mut *db)
    .await?;
    Ok(())
}

pub async fn reports_for_material(
    db: &mut SqliteConnection,
    material_id: Uuid,
) -> anyhow::Result<Vec<Report>> {
    let rows = sqlx::query(
        "
            select r.id,
                   r.comment,
                   r.created_at,
                   u.full_name as reporter_name,
                   u.email     as reporter_email
            from material_reports r
                     join users u on r.user_id = u.id
            where r.material_id = ?1
            order by r.created_at desc;
        ",
    )
    .bind(material_id)
    .fetch_all(&mut *db)
    .await?;

    rows.iter()
        .map(|row| {
            Ok::<_, sqlx::Error>(Report {
                id: row.try_get("id")?,
                comment: row.try_get("comment")?,
                created_at: row.try_get("created_at")?,
                reporter_name: row.try_get("reporter_name")?,
                reporter_email: row.try_get("reporter_email")?,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Every material with at least one report, most recently reported first,
/// with its reports nested newest-first. SQLite has no `json_agg`, so the
/// nesting is one grouped query plus one ordered query stitched in memory.
pub async fn reported_materials(db: &mut SqliteConnection) -> anyhow::Result<Vec<ReportedMaterial>> {
    let material_rows = sqlx::query(
        "
            select m.id,
                   m.room_id,
                   m.user_id,
                   m.file_name,
                   m.file_path,
                   m.file_size,
                   m.created_at,
                   r.name          as room_name,
                   r.topic         as room_topic,
                   u.full_name     as uploader_name,
                   count(mr.id)    as report_count,
                   max(mr.created_at) as last_reported_at
            from room_materials m
                     join material_reports mr on m.id = mr.material_id
                     join study_rooms r on m.room_id = r.id
                     left join users u on m.user_id = u.id
            group by m.id
            order by last_reported_at desc;
        ",
    )
    .fetch_all(&mut *db)
    .await?;

    let report_rows = sqlx::query(
        "
            select mr.id,
                   mr.material_id,
                   mr.comment,
                   mr.created_at,
                   reporter.full_name as reporter_name
            from material_reports mr
                     left join users reporter on mr.user_id = reporter.id
            order by mr.created_at desc;
        ",
    )
    .fetch_all(&mut *db)
    .await?;

    let mut by_material: HashMap<Uuid, Vec<ReportEntry>> = HashMap::new();
    for row in &report_rows {
        let material_id: Uuid = row.try_get("material_id")?;
        by_material
            .entry(material_id)
            .or_default()
            .push(ReportEntry {
                id: row.try_get("id")?,
                comment: row.try_get("comment")?,
                reporter_name: row.try_get("reporter_name")?,
                created_at: row.try_get("created_at")?,
            });
    }

    material_rows
        .iter()
        .map(|row| {
            let material = map_material(row)?;
            let reports = by_material.remove(&material.id).unwrap_or_default();

            Ok::<_, sqlx::Error>(ReportedMaterial {
                material,
                room_name: row.try_get("room_name")?,
                room_topic: row.try_get("room_topic")?,
                uploader_name: row.try_get("uploader_name")?,
                report_count: row.try_get("report_count")?,
                last_reported_at: row.try_get("last_reported_at")?,
                reports,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}
