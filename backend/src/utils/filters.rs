use crate::auth::parse_token;
use common::errors::ApiError;
use common::User;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::path::PathBuf;
use warp::http::StatusCode;
use warp::path::FullPath;
use warp::Filter;

pub fn json_body<T: for<'de> Deserialize<'de> + Send>(
) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    // When accepting a body, we want a JSON body (and to reject huge payloads)
    warp::body::content_length_limit(1024 * 16).and(warp::body::json())
}

pub fn with_db(
    pool: SqlitePool,
) -> impl Filter<Extract = (SqlitePool,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

pub fn ensure_authorized(
    pool: SqlitePool,
) -> impl Filter<Extract = (User,), Error = warp::Rejection> + Clone {
    warp::header::<String>("authorization")
        .and(with_db(pool))
        .and_then(|token: String, db: SqlitePool| async move {
            let mut conn = db.acquire().await.map_err(|_e| {
                ApiError::new_with_message_and_status(
                    "failed to acquire pool",
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
                .into_rejection()
            })?;

            let user = parse_token(&mut conn, &token).await.map_err(|_e| {
                ApiError::new_with_message_and_status("Invalid token", StatusCode::UNAUTHORIZED)
                    .into_rejection()
            })?;

            match user {
                Some(user) => Ok(user),
                None => Err(
                    ApiError::new_with_message_and_status("Invalid token", StatusCode::UNAUTHORIZED)
                        .into_rejection(),
                ),
            }
        })
}

/// Like [`ensure_authorized`] but for routes that only *annotate* their
/// response when a caller is logged in. A missing or stale token yields
/// `None` instead of a 401.
pub fn maybe_authorized(
    pool: SqlitePool,
) -> impl Filter<Extract = (Option<User>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_db(pool))
        .and_then(|token: Option<String>, db: SqlitePool| async move {
            let token = match token {
                Some(token) => token,
                None => return Ok::<_, warp::Rejection>(None),
            };

            let mut conn = db.acquire().await.map_err(|_e| {
                ApiError::new_with_message_and_status(
                    "failed to acquire pool",
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
                .into_rejection()
            })?;

            Ok(parse_token(&mut conn, &token).await.unwrap_or(None))
        })
}

pub fn single_page_application(
    dist_dir: impl Into<PathBuf>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let dist_dir = dist_dir.into();

    let index_fallback = warp::path::full()
        .and(warp::fs::file(dist_dir.join("index.html")))
        .and_then(|p: FullPath, index| async move {
            if p.as_str().starts_with("/api") {
                Err(warp::reject())
            } else {
                Ok(index)
            }
        });
    warp::fs::dir(dist_dir).or(index_fallback)
}
