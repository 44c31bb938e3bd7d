use backend::utils::single_page_application;
use backend::{setup_database, setup_logger};
use std::env;
use std::path::PathBuf;
use warp::Filter;

#[tokio::main]
async fn main() {
    setup_logger().expect("unable to setup logger");

    let pool = setup_database().await.expect("unable to setup database");

    let dist_dir = env::var("DIST_DIR").unwrap_or_else(|_| "dist".to_string());

    let routes = backend::api(pool)
        .or(single_page_application(PathBuf::from(&dist_dir)))
        .with(warp::compression::gzip())
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allow_headers(vec!["authorization", "content-type"]),
        );

    let port = env::var("PORT")
        .map(|it| it.parse().expect("invalid port"))
        .unwrap_or(5000);

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C signal handler");
        });

    tokio::task::spawn(async move {
        log::info!("running server on http://{}/", addr);
        server.await;
    })
    .await
    .expect("failed to start server");
}
