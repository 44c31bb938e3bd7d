use std::time::Duration;

use backend::services;
use common::payloads::{ReportMaterial, SaveToggled};
use common::{MaterialRecord, Report, ReportedMaterial, SavedMaterial};
use uuid::Uuid;
use warp::http::StatusCode;

use crate::{
    create_authenticated_user, create_material, create_room, create_user, db, join_room,
    multipart_body, multipart_content_type, use_temp_uploads_dir, PNG_BYTES,
};

#[tokio::test]
async fn uploads_are_limited_to_members() {
    db(|pool| {
        Box::pin(async move {
            use_temp_uploads_dir();

            let (room, member_token, outsider_token) = {
                let mut conn = pool.acquire().await.expect("can't acquire connection");
                let owner = create_user(&mut conn, "Owner", "owner@uni.edu", "hunter42").await;
                let (member, member_token) =
                    create_authenticated_user(&mut conn, "Member", "member@uni.edu", "hunter42")
                        .await;
                let (_, outsider_token) = create_authenticated_user(
                    &mut conn,
                    "Outsider",
                    "outsider@uni.edu",
                    "hunter42",
                )
                .await;
                let room = create_room(&mut conn, "Linear Algebra", "math", 10, &owner).await;
                join_room(&mut conn, &room, &member).await;
                (room, member_token, outsider_token)
            };
            let api = backend::api(pool);

            let body = multipart_body(
                &[],
                Some(("material", "diagram.png", "image/png", PNG_BYTES)),
            );
            let res = warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/{}/materials", room.id))
                .header("authorization", format!("Bearer {}", outsider_token))
                .header("content-type", multipart_content_type())
                .body(body.clone())
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::FORBIDDEN);

            let res = warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/{}/materials", room.id))
                .header("authorization", format!("Bearer {}", member_token))
                .header("content-type", multipart_content_type())
                .body(body)
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::CREATED);
            let record: MaterialRecord =
                serde_json::from_slice(res.body()).expect("can't parse material");
            assert_eq!(record.material.file_name, "diagram.png");
            assert_eq!(record.material.file_size, PNG_BYTES.len() as i64);
            assert_eq!(record.uploaded_by_name, "Member");
            assert!(std::path::Path::new(&record.material.file_path).exists());
        })
    })
    .await;
}

#[tokio::test]
async fn upload_rejects_missing_and_disallowed_files() {
    db(|pool| {
        Box::pin(async move {
            use_temp_uploads_dir();

            let (room, token) = {
                let mut conn = pool.acquire().await.expect("can't acquire connection");
                let (owner, token) =
                    create_authenticated_user(&mut conn, "Owner", "owner@uni.edu", "hunter42")
                        .await;
                let room = create_room(&mut conn, "Linear Algebra", "math", 10, &owner).await;
                (room, token)
            };
            let api = backend::api(pool);

            let body = multipart_body(&[("material", "not a file")], None);
            let res = warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/{}/materials", room.id))
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", multipart_content_type())
                .body(body)
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);

            let body = multipart_body(
                &[],
                Some(("material", "virus.exe", "application/octet-stream", &b"MZ"[..])),
            );
            let res = warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/{}/materials", room.id))
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", multipart_content_type())
                .body(body)
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);

            let body = multipart_body(
                &[],
                Some(("material", "diagram.png", "image/png", PNG_BYTES)),
            );
            let res = warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/{}/materials", Uuid::new_v4()))
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", multipart_content_type())
                .body(body)
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND);
        })
    })
    .await;
}

#[tokio::test]
async fn reserved_uploads_touch_disk_only_on_write() {
    use backend::utils::{UploadKind, UploadedFile};

    use_temp_uploads_dir();

    let file = UploadedFile {
        original_name: "diagram.png".to_string(),
        extension: "png".to_string(),
        mime: mime::IMAGE_PNG,
        bytes: PNG_BYTES.to_vec(),
    };

    let pending = file.reserve(UploadKind::Material);
    let path = pending.path().to_string();
    assert!(!std::path::Path::new(&path).exists());

    pending.write().await.expect("can't write upload");
    assert!(std::path::Path::new(&path).exists());
}

#[tokio::test]
async fn room_materials_are_listed_newest_first() {
    db(|pool| {
        Box::pin(async move {
            let (room, token, newest) = {
                let mut conn = pool.acquire().await.expect("can't acquire connection");
                let (owner, token) =
                    create_authenticated_user(&mut conn, "Owner", "owner@uni.edu", "hunter42")
                        .await;
                let room = create_room(&mut conn, "Linear Algebra", "math", 10, &owner).await;
                create_material(&mut conn, &room, &owner, "week-1.pdf").await;
                tokio::time::sleep(Duration::from_millis(5)).await;
                let newest = create_material(&mut conn, &room, &owner, "week-2.pdf").await;
                (room, token, newest)
            };
            let api = backend::api(pool);

            let res = warp::test::request()
                .method("GET")
                .path(&format!("/api/rooms/{}/materials", room.id))
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::OK);
            let materials: Vec<MaterialRecord> =
                serde_json::from_slice(res.body()).expect("can't parse materials");
            assert_eq!(materials.len(), 2);
            assert_eq!(materials[0].material.id, newest.id);
            assert_eq!(materials[0].uploaded_by_name, "Owner");
            assert_eq!(materials[0].is_saved, Some(false));

            let res = warp::test::request()
                .method("GET")
                .path(&format!("/api/rooms/{}/materials", Uuid::new_v4()))
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND);
        })
    })
    .await;
}

#[tokio::test]
async fn save_toggles_on_and_off() {
    db(|pool| {
        Box::pin(async move {
            let (material, token) = {
                let mut conn = pool.acquire().await.expect("can't acquire connection");
                let owner = create_user(&mut conn, "Owner", "owner@uni.edu", "hunter42").await;
                let (_, token) =
                    create_authenticated_user(&mut conn, "Alice", "alice@uni.edu", "hunter42")
                        .await;
                let room = create_room(&mut conn, "Linear Algebra", "math", 10, &owner).await;
                let material = create_material(&mut conn, &room, &owner, "notes.pdf").await;
                (material, token)
            };
            let api = backend::api(pool);

            let res = warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/materials/{}/save", material.id))
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::OK);
            let toggled: SaveToggled = serde_json::from_slice(res.body()).expect("can't parse");
            assert!(toggled.is_saved);

            let res = warp::test::request()
                .method("GET")
                .path("/api/rooms/materials/saved")
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            let saved: Vec<SavedMaterial> =
                serde_json::from_slice(res.body()).expect("can't parse saved");
            assert_eq!(saved.len(), 1);
            assert_eq!(saved[0].material.id, material.id);
            assert_eq!(saved[0].room_name, "Linear Algebra");

            let res = warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/materials/{}/save", material.id))
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            let toggled: SaveToggled = serde_json::from_slice(res.body()).expect("can't parse");
            assert!(!toggled.is_saved);

            let res = warp::test::request()
                .method("GET")
                .path("/api/rooms/materials/saved")
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            let saved: Vec<SavedMaterial> =
                serde_json::from_slice(res.body()).expect("can't parse saved");
            assert!(saved.is_empty());

            let res = warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/materials/{}/save", Uuid::new_v4()))
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND);
        })
    })
    .await;
}

#[tokio::test]
async fn saved_materials_search_and_clear() {
    db(|pool| {
        Box::pin(async move {
            let token = {
                let mut conn = pool.acquire().await.expect("can't acquire connection");
                let owner = create_user(&mut conn, "Owner", "owner@uni.edu", "hunter42").await;
                let (alice, token) =
                    create_authenticated_user(&mut conn, "Alice", "alice@uni.edu", "hunter42")
                        .await;
                let room = create_room(&mut conn, "Linear Algebra", "math", 10, &owner).await;
                let physics = create_material(&mut conn, &room, &owner, "physics-notes.pdf").await;
                let biology = create_material(&mut conn, &room, &owner, "biology.png").await;
                services::material::toggle_save(&mut conn, physics.id, alice.id)
                    .await
                    .expect("can't save material");
                services::material::toggle_save(&mut conn, biology.id, alice.id)
                    .await
                    .expect("can't save material");
                token
            };
            let api = backend::api(pool);

            let res = warp::test::request()
                .method("GET")
                .path("/api/rooms/materials/saved?search=PHYS")
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            let saved: Vec<SavedMaterial> =
                serde_json::from_slice(res.body()).expect("can't parse saved");
            assert_eq!(saved.len(), 1);
            assert_eq!(saved[0].material.file_name, "physics-notes.pdf");

            let res = warp::test::request()
                .method("DELETE")
                .path("/api/rooms/materials/saved")
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::OK);

            let res = warp::test::request()
                .method("GET")
                .path("/api/rooms/materials/saved")
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            let saved: Vec<SavedMaterial> =
                serde_json::from_slice(res.body()).expect("can't parse saved");
            assert!(saved.is_empty());

            // clearing an empty list is fine
            let res = warp::test::request()
                .method("DELETE")
                .path("/api/rooms/materials/saved")
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::OK);
        })
    })
    .await;
}

#[tokio::test]
async fn saved_search_treats_wildcards_literally() {
    db(|pool| {
        Box::pin(async move {
            let token = {
                let mut conn = pool.acquire().await.expect("can't acquire connection");
                let owner = create_user(&mut conn, "Owner", "owner@uni.edu", "hunter42").await;
                let (alice, token) =
                    create_authenticated_user(&mut conn, "Alice", "alice@uni.edu", "hunter42")
                        .await;
                let room = create_room(&mut conn, "Linear Algebra", "math", 10, &owner).await;
                let exact = create_material(&mut conn, &room, &owner, "week_1.pdf").await;
                let decoy = create_material(&mut conn, &room, &owner, "weekX1.pdf").await;
                services::material::toggle_save(&mut conn, exact.id, alice.id)
                    .await
                    .expect("can't save material");
                services::material::toggle_save(&mut conn, decoy.id, alice.id)
                    .await
                    .expect("can't save material");
                token
            };

            let res = warp::test::request()
                .method("GET")
                .path("/api/rooms/materials/saved?search=week_")
                .header("authorization", format!("Bearer {}", token))
                .reply(&backend::api(pool))
                .await;
            assert_eq!(res.status(), StatusCode::OK);
            let saved: Vec<SavedMaterial> =
                serde_json::from_slice(res.body()).expect("can't parse saved");
            assert_eq!(saved.len(), 1);
            assert_eq!(saved[0].material.file_name, "week_1.pdf");
        })
    })
    .await;
}

#[tokio::test]
async fn report_comments_are_validated() {
    db(|pool| {
        Box::pin(async move {
            let (material, token) = {
                let mut conn = pool.acquire().await.expect("can't acquire connection");
                let (owner, token) =
                    create_authenticated_user(&mut conn, "Owner", "owner@uni.edu", "hunter42")
                        .await;
                let room = create_room(&mut conn, "Linear Algebra", "math", 10, &owner).await;
                let material = create_material(&mut conn, &room, &owner, "notes.pdf").await;
                (material, token)
            };
            let api = backend::api(pool);

            for comment in ["   ", &"a".repeat(501)] {
                let res = warp::test::request()
                    .method("POST")
                    .path(&format!("/api/rooms/materials/{}/report", material.id))
                    .header("authorization", format!("Bearer {}", token))
                    .json(&ReportMaterial {
                        comment: comment.to_string(),
                    })
                    .reply(&api)
                    .await;
                assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            }

            let res = warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/materials/{}/report", material.id))
                .header("authorization", format!("Bearer {}", token))
                .json(&ReportMaterial {
                    comment: "a".repeat(500),
                })
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::OK);

            let res = warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/materials/{}/report", Uuid::new_v4()))
                .header("authorization", format!("Bearer {}", token))
                .json(&ReportMaterial {
                    comment: "spam".to_string(),
                })
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND);
        })
    })
    .await;
}

#[tokio::test]
async fn reported_materials_aggregate_their_reports() {
    db(|pool| {
        Box::pin(async move {
            let (material, token) = {
                let mut conn = pool.acquire().await.expect("can't acquire connection");
                let owner = create_user(&mut conn, "Owner", "owner@uni.edu", "hunter42").await;
                let (alice, token) =
                    create_authenticated_user(&mut conn, "Alice", "alice@uni.edu", "hunter42")
                        .await;
                let bob = create_user(&mut conn, "Bob", "bob@uni.edu", "hunter42").await;
                let room = create_room(&mut conn, "Linear Algebra", "math", 10, &owner).await;
                let material = create_material(&mut conn, &room, &owner, "notes.pdf").await;

                for (user, comment) in [
                    (&alice, "first report"),
                    (&bob, "second report"),
                    (&alice, "third report"),
                ] {
                    services::material::create_report(&mut conn, material.id, user.id, comment)
                        .await
                        .expect("can't create report");
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }

                (material, token)
            };
            let api = backend::api(pool);

            let res = warp::test::request()
                .method("GET")
                .path("/api/rooms/materials/reported/all")
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::OK);
            let reported: Vec<ReportedMaterial> =
                serde_json::from_slice(res.body()).expect("can't parse reported");
            assert_eq!(reported.len(), 1);
            assert_eq!(reported[0].material.id, material.id);
            assert_eq!(reported[0].report_count, 3);
            assert_eq!(reported[0].reports.len(), 3);
            assert_eq!(reported[0].reports[0].comment, "third report");
            assert!(reported[0]
                .reports
                .windows(2)
                .all(|pair| pair[0].created_at >= pair[1].created_at));

            let res = warp::test::request()
                .method("GET")
                .path(&format!("/api/rooms/materials/{}/reports", material.id))
                .header("authorization", format!("Bearer {}", token))
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::OK);
            let reports: Vec<Report> =
                serde_json::from_slice(res.body()).expect("can't parse reports");
            assert_eq!(reports.len(), 3);
            assert_eq!(reports[0].comment, "third report");
            assert_eq!(reports[0].reporter_name, "Alice");
        })
    })
    .await;
}
