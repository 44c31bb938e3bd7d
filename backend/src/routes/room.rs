use crate::services;
use crate::services::room::JoinOutcome;
use crate::utils::{
    ensure_authorized, error_reply, json_with_status, maybe_authorized, with_db, with_transaction,
    FormFields, UploadKind,
};
use crate::{bail_if_err, bail_if_err_or_404, utils, value_or_404};
use common::payloads::{MyRoomsQuery, RoomsQuery, StatusMessage};
use common::{Room, User};
use sqlx::SqlitePool;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::{Filter, Reply};

async fn create_room(
    pool: SqlitePool,
    user: User,
    form: FormFields,
) -> Result<impl warp::Reply, warp::Rejection> {
    with_transaction(pool, move |conn| {
        Box::pin(async move {
            let name = match form.text("name") {
                Some(name) if !name.trim().is_empty() => name.trim().to_string(),
                _ => {
                    return Ok(error_reply(
                        StatusCode::BAD_REQUEST,
                        "Room name is required",
                    ))
                }
            };
            let topic = match form.text("topic") {
                Some(topic) if !topic.trim().is_empty() => topic.trim().to_string(),
                _ => return Ok(error_reply(StatusCode::BAD_REQUEST, "Topic is required")),
            };
            let description = form.text("description").map(str::to_string);

            // A value that doesn't parse falls back to the default, like an
            // absent one; only an explicit out-of-range number is an error.
            let max_capacity = match form
                .text("max_capacity")
                .and_then(|it| it.parse::<i64>().ok())
            {
                Some(capacity)
                    if !(Room::MIN_CAPACITY..=Room::MAX_CAPACITY).contains(&capacity) =>
                {
                    return Ok(error_reply(
                        StatusCode::BAD_REQUEST,
                        "Max capacity must be between 2 and 50",
                    ))
                }
                Some(capacity) => capacity,
                None => Room::DEFAULT_CAPACITY,
            };

            let cover = match form.file("cover_image") {
                Some(file) if !file.is_image() => {
                    return Ok(error_reply(
                        StatusCode::BAD_REQUEST,
                        "Cover image must be an image file",
                    ))
                }
                Some(file) => Some(file.reserve(UploadKind::Cover)),
                None => None,
            };

            let room = Room::new(
                name,
                topic,
                description,
                max_capacity,
                cover.as_ref().map(|it| it.path().to_string()),
                user.id,
            );
            let room = services::room::create(&mut *conn, room).await?;

            // the creator takes the first seat
            services::room::join(&mut *conn, &room, user.id).await?;

            // disk only after the row is in
            if let Some(cover) = cover {
                cover.write().await?;
            }

            log::debug!("room {} created by {}", room.id, user.id);

            Ok(json_with_status(StatusCode::CREATED, &room))
        })
    })
    .await
}

async fn get_rooms(
    query: RoomsQuery,
    pool: SqlitePool,
    caller: Option<User>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    let rooms = bail_if_err!(
        services::room::list(
            &mut conn,
            query.search.as_deref(),
            query.sort.unwrap_or_default(),
            caller.map(|user| user.id),
        )
        .await
    );

    Ok(warp::reply::json(&rooms).into_response())
}

async fn my_rooms(
    query: MyRoomsQuery,
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    let rooms = bail_if_err!(
        services::room::list_mine(&mut conn, user.id, query.filter.unwrap_or_default()).await
    );

    Ok(warp::reply::json(&rooms).into_response())
}

async fn get_room(
    room_id: Uuid,
    pool: SqlitePool,
    caller: Option<User>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    let room = bail_if_err_or_404!(
        services::room::get_detail(&mut conn, room_id, caller.map(|user| user.id)).await,
        "Room not found"
    );

    Ok(warp::reply::json(&room).into_response())
}

async fn join_room(
    room_id: Uuid,
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    with_transaction(pool, move |conn| {
        Box::pin(async move {
            let room = value_or_404!(
                services::room::get(&mut *conn, room_id).await?,
                "Room not found"
            );

            Ok(match services::room::join(&mut *conn, &room, user.id).await? {
                JoinOutcome::Joined => warp::reply::json(&StatusMessage::new(
                    "Joined room successfully",
                ))
                .into_response(),
                JoinOutcome::AlreadyMember => error_reply(
                    StatusCode::BAD_REQUEST,
                    "Already a member of this room",
                ),
                JoinOutcome::Full => error_reply(StatusCode::BAD_REQUEST, "Room is full"),
            })
        })
    })
    .await
}

async fn leave_room(
    room_id: Uuid,
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    with_transaction(pool, move |conn| {
        Box::pin(async move {
            value_or_404!(
                services::room::get(&mut *conn, room_id).await?,
                "Room not found"
            );

            services::room::leave(&mut *conn, room_id, user.id).await?;

            Ok(warp::reply::json(&StatusMessage::new("Left room successfully")).into_response())
        })
    })
    .await
}

async fn update_room(
    room_id: Uuid,
    pool: SqlitePool,
    user: User,
    form: FormFields,
) -> Result<impl warp::Reply, warp::Rejection> {
    with_transaction(pool, move |conn| {
        Box::pin(async move {
            let mut room = value_or_404!(
                services::room::get(&mut *conn, room_id).await?,
                "Room not found"
            );

            if room.created_by != user.id {
                return Ok(error_reply(StatusCode::UNAUTHORIZED, "User not authorized"));
            }

            if let Some(name) = form.text("name") {
                if !name.trim().is_empty() {
                    room.name = name.trim().to_string();
                }
            }
            if let Some(topic) = form.text("topic") {
                if !topic.trim().is_empty() {
                    room.topic = topic.trim().to_string();
                }
            }
            if let Some(description) = form.text("description") {
                if !description.is_empty() {
                    room.description = Some(description.to_string());
                }
            }
            if let Some(capacity) = form.text("max_capacity") {
                match capacity.parse::<i64>() {
                    Ok(capacity)
                        if (Room::MIN_CAPACITY..=Room::MAX_CAPACITY).contains(&capacity) =>
                    {
                        room.max_capacity = capacity
                    }
                    _ => {
                        return Ok(error_reply(
                            StatusCode::BAD_REQUEST,
                            "Max capacity must be between 2 and 50",
                        ))
                    }
                }
            }
            let mut cover = None;
            if let Some(file) = form.file("cover_image") {
                if !file.is_image() {
                    return Ok(error_reply(
                        StatusCode::BAD_REQUEST,
                        "Cover image must be an image file",
                    ));
                }
                let pending = file.reserve(UploadKind::Cover);
                room.cover_image = Some(pending.path().to_string());
                cover = Some(pending);
            }

            let room = services::room::update(&mut *conn, room).await?;

            if let Some(cover) = cover {
                cover.write().await?;
            }

            Ok(warp::reply::json(&room).into_response())
        })
    })
    .await
}

async fn delete_room(
    room_id: Uuid,
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    with_transaction(pool, move |conn| {
        Box::pin(async move {
            let room = value_or_404!(
                services::room::get(&mut *conn, room_id).await?,
                "Room not found"
            );

            if room.created_by != user.id {
                return Ok(error_reply(StatusCode::UNAUTHORIZED, "User not authorized"));
            }

            services::room::delete(&mut *conn, room.id).await?;

            log::debug!("room {} deleted by {}", room.id, user.id);

            Ok(warp::reply::json(&StatusMessage::new("Room removed")).into_response())
        })
    })
    .await
}

pub fn routes(
    db: SqlitePool,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let create_room_route = warp::path!("rooms")
        .and(warp::post())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db.clone()))
        .and(utils::multipart())
        .and_then(create_room);

    let get_rooms_route = warp::path!("rooms")
        .and(warp::get())
        .and(warp::query::<RoomsQuery>())
        .and(with_db(db.clone()))
        .and(maybe_authorized(db.clone()))
        .and_then(get_rooms);

    let my_rooms_route = warp::path!("rooms" / "my-rooms")
        .and(warp::get())
        .and(warp::query::<MyRoomsQuery>())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db.clone()))
        .and_then(my_rooms);

    let get_room_route = warp::path!("rooms" / Uuid)
        .and(warp::get())
        .and(with_db(db.clone()))
        .and(maybe_authorized(db.clone()))
        .and_then(get_room);

    let update_room_route = warp::path!("rooms" / Uuid)
        .and(warp::put())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db.clone()))
        .and(utils::multipart())
        .and_then(update_room);

    let delete_room_route = warp::path!("rooms" / Uuid)
        .and(warp::delete())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db.clone()))
        .and_then(delete_room);

    let join_room_route = warp::path!("rooms" / Uuid / "join")
        .and(warp::post())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db.clone()))
        .and_then(join_room);

    let leave_room_route = warp::path!("rooms" / Uuid / "leave")
        .and(warp::post())
        .and(with_db(db.clone()))
        .and(ensure_authorized(db))
        .and_then(leave_room);

    my_rooms_route
        .or(get_rooms_route)
        .or(create_room_route)
        .or(get_room_route)
        .or(update_room_route)
        .or(delete_room_route)
        .or(join_room_route)
        .or(leave_room_route)
}
