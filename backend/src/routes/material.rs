use crate::services;
use crate::utils::{
    ensure_authorized, error_reply, json_body, json_with_status, maybe_authorized, with_db,
    with_transaction, FormFields, UploadKind,
};
use crate::{bail_if_err, bail_if_err_or_404, utils, value_or_404};
use common::payloads::{ReportMaterial, SaveToggled, SavedQuery, StatusMessage};
use common::{Material, MaterialRecord, User, MAX_REPORT_COMMENT_LENGTH};
use sqlx::SqlitePool;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::{Filter, Reply};

async fn upload_material(
    room_id: Uuid,
    pool: SqlitePool,
    user: User,
    form: FormFields,
) -> Result<impl warp::Reply, warp::Rejection> {
    with_transaction(pool, move |conn| {
        Box::pin(async move {
            let room = value_or_404!(
                services::room::get(&mut *conn, room_id).await?,
                "Room not found"
            );

            let allowed = room.created_by == user.id
                || services::room::is_member(&mut *conn, room.id, user.id).await?;
            if !allowed {
                return Ok(error_reply(
                    StatusCode::FORBIDDEN,
                    "Not authorized to upload to this room",
                ));
            }

            let file = match form.file("material") {
                Some(file) => file,
                None => return Ok(error_reply(StatusCode::BAD_REQUEST, "No file uploaded")),
            };
            if !file.is_allowed() {
                return Ok(error_reply(
                    StatusCode::BAD_REQUEST,
                    "Images and PDFs only",
                ));
            }

            let pending = file.reserve(UploadKind::Material);
            let material = Material::new(
                room.id,
                user.id,
                file.original_name.clone(),
                pending.path().to_string(),
                file.size(),
            );
            let material = services::material::create(&mut *conn, material).await?;
            pending.write().await?;

            log::debug!("material {} uploaded to room {}", material.id, room.id);

            Ok(json_with_status(
                StatusCode::CREATED,
                &MaterialRecord {
                    material,
                    uploaded_by_name: user.full_name,
                    is_saved: None,
                },
            ))
        })
    })
    .await
}

async fn get_materials(
    room_id: Uuid,
    pool: SqlitePool,
    caller: Option<User>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    bail_if_err_or_404!(
        services::room::get(&mut conn, room_id).await,
        "Room not found"
    );

    let materials = bail_if_err!(
        services::material::list_for_room(&mut conn, room_id, caller.map(|user| user.id)).await
    );

    Ok(warp::reply::json(&materials).into_response())
}

async fn toggle_save(
    material_id: Uuid,
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    with_transaction(pool, move |conn| {
        Box::pin(async move {
            value_or_404!(
                services::material::get(&mut *conn, material_id).await?,
                "Material not found"
            );

            let is_saved =
                services::material::toggle_save(&mut *conn, material_id, user.id).await?;

            let msg = if is_saved {
                "Material saved"
            } else {
                "Material unsaved"
            };

            Ok(warp::reply::json(&SaveToggled {
                msg: msg.to_string(),
                is_saved,
            })
            .into_response())
        })
    })
    .await
}

async fn get_saved(
    query: SavedQuery,
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    let materials = bail_if_err!(
        services::material::list_saved(&mut conn, user.id, query.search.as_deref()).await
    );

    Ok(warp::reply::json(&materials).into_response())
}

async fn clear_saved(
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    bail_if_err!(services::material::clear_saved(&mut conn, user.id).await);

    Ok(warp::reply::json(&StatusMessage::new("All materials cleared")).into_response())
}

async fn report_material(
    material_id: Uuid,
    data: ReportMaterial,
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    with_transaction(pool, move |conn| {
        Box::pin(async move {
            let comment = data.comment.trim();
            if comment.is_empty() {
                return Ok(error_reply(StatusCode::BAD_REQUEST, "Comment is required"));
            }
            if comment.chars().count() > MAX_REPORT_COMMENT_LENGTH {
                return Ok(error_reply(
                    StatusCode::BAD_REQUEST,
                    "Comment must be 500 characters or less",
                ));
            }

            value_or_404!(
                services::material::get(&mut *conn, material_id).await?,
                "Material not found"
            );

            services::material::create_report(&mut *conn, material_id, user.id, comment).await?;

            log::debug!("material {} reported by {}", material_id, user.id);

            Ok(
                warp::reply::json(&StatusMessage::new("Material reported successfully"))
                    .into_response(),
            )
        })
    })
    .await
}

async fn get_material_reports(
    material_id: Uuid,
    pool: SqlitePool,
    _user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    bail_if_err_or_404!(
        services::material::get(&mut conn, material_id).await,
        "Material not found"
    );

    let reports = bail_if_err!(services::material::reports_for_material(&mut conn, material_id).await);

    Ok(warp::reply::json(&reports).into_response())
}

async fn get_reported_materials(
    pool: SqlitePool,
    _user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    let materials = bail_if_err!(services::material::reported_materials(&mut conn).await);

    Ok(warp::reply::json(&materials).into_response())
}

pub fn routes(
    db: SqlitePool,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let upload_route = warp::path!("rooms" / Uuid / "materials")
        .and(warp::post())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db.clone()))
        .and(utils::multipart())
        .and_then(upload_material);

    let list_route = warp::path!("rooms" / Uuid / "materials")
        .and(warp::get())
        .and(with_db(db.clone()))
        .and(maybe_authorized(db.clone()))
        .and_then(get_materials);

    let saved_route = warp::path!("rooms" / "materials" / "saved")
        .and(warp::get())
        .and(warp::query::<SavedQuery>())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db.clone()))
        .and_then(get_saved);

    let clear_saved_route = warp::path!("rooms" / "materials" / "saved")
        .and(warp::delete())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db.clone()))
        .and_then(clear_saved);

    let reported_route = warp::path!("rooms" / "materials" / "reported" / "all")
        .and(warp::get())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db.clone()))
        .and_then(get_reported_materials);

    let save_route = warp::path!("rooms" / "materials" / Uuid / "save")
        .and(warp::post())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db.clone()))
        .and_then(toggle_save);

    let report_route = warp::path!("rooms" / "materials" / Uuid / "report")
        .and(warp::post())
        .and(json_body::<ReportMaterial>())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db.clone()))
        .and_then(report_material);

    let reports_route = warp::path!("rooms" / "materials" / Uuid / "reports")
        .and(warp::get())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db))
        .and_then(get_material_reports);

    saved_route
        .or(clear_saved_route)
        .or(reported_route)
        .or(save_route)
        .or(report_route)
        .or(reports_route)
        .or(upload_route)
        .or(list_route)
}
