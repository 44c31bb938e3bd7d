pub mod auth;
pub mod macros;
pub mod routes;
pub mod services;
pub mod utils;

pub use macros::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::env;
use std::str::FromStr;
use warp::Filter;

pub fn setup_logger() -> anyhow::Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .chain(fern::log_file("output.log")?)
        .apply()?;
    Ok(())
}

pub async fn setup_database() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&env::var("DATABASE_URL")?)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// The whole REST surface under `/api`, rejection handling included.
/// `main` stacks static file serving, compression and CORS on top.
pub fn api(
    pool: SqlitePool,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let routes = auth::routes(pool.clone())
        .or(routes::room::routes(pool.clone()))
        .or(routes::material::routes(pool));

    warp::path("api")
        .and(routes)
        .recover(utils::handle_rejection)
}
