use crate::auth::{create_jwt, BCRYPT_COST};
use crate::utils::{
    ensure_authorized, error_reply, json_body, json_with_status, with_db, with_transaction,
    FormFields, UploadKind,
};
use crate::{bail_if_err, services, utils, value_or_404};
use common::payloads::{
    AuthResponse, AvatarUploaded, EmailUpdated, Login, Register, StatusMessage, UpdateEmail,
    UpdatePassword, UpdateProfile,
};
use common::User;
use sqlx::SqlitePool;
use warp::http::StatusCode;
use warp::{reply, Filter, Reply};

fn hash_password(password: &str) -> anyhow::Result<String> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    Ok(bcrypt::verify(password, hash)?)
}

async fn register(pool: SqlitePool, data: Register) -> Result<impl warp::Reply, warp::Rejection> {
    with_transaction(pool, move |conn| {
        Box::pin(async move {
            if data.full_name.trim().is_empty() {
                return Ok(error_reply(StatusCode::BAD_REQUEST, "Full name is required"));
            }
            if !data.email.contains('@') {
                return Ok(error_reply(
                    StatusCode::BAD_REQUEST,
                    "Please include a valid email",
                ));
            }
            if data.password.chars().count() < 6 {
                return Ok(error_reply(
                    StatusCode::BAD_REQUEST,
                    "Password must be 6 or more characters",
                ));
            }

            let password_hash = hash_password(&data.password)?;
            let user = User::new(data.full_name.trim().to_string(), data.email, password_hash);

            // a taken email surfaces here as a 400 through the unique constraint
            let user = services::user::create(&mut *conn, user).await?;

            let token = create_jwt(&user)?;

            log::debug!("registered user {}", user.id);

            Ok(json_with_status(
                StatusCode::CREATED,
                &AuthResponse { token, user },
            ))
        })
    })
    .await
}

async fn login(pool: SqlitePool, data: Login) -> Result<impl warp::Reply, warp::Rejection> {
    let mut db = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    let user = match bail_if_err!(services::user::get_by_email(&mut db, &data.email).await) {
        Some(user) => user,
        None => return Ok(error_reply(StatusCode::BAD_REQUEST, "Invalid Credentials")),
    };

    if !bail_if_err!(verify_password(&data.password, &user.password_hash)) {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "Invalid Credentials"));
    }

    let token = bail_if_err!(create_jwt(&user));

    Ok(reply::json(&AuthResponse { token, user }).into_response())
}

async fn me(pool: SqlitePool, user: User) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    let profile = bail_if_err!(services::user::profile(&mut conn, &user).await);

    Ok(warp::reply::json(&profile).into_response())
}

async fn update_profile(
    data: UpdateProfile,
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    let user = bail_if_err!(services::user::update_profile(&mut conn, user.id, &data).await);
    let user = value_or_404!(user, "User not found");

    Ok(warp::reply::json(&user).into_response())
}

async fn update_password(
    data: UpdatePassword,
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    if !bail_if_err!(verify_password(&data.current_password, &user.password_hash)) {
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            "Incorrect current password",
        ));
    }
    if data.new_password.chars().count() < 6 {
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            "Password must be 6 or more characters",
        ));
    }

    let password_hash = bail_if_err!(hash_password(&data.new_password));
    bail_if_err!(services::user::update_password(&mut conn, user.id, &password_hash).await);

    Ok(warp::reply::json(&StatusMessage::new("Password updated successfully")).into_response())
}

async fn update_email(
    data: UpdateEmail,
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    with_transaction(pool, move |conn| {
        Box::pin(async move {
            if services::user::email_taken(&mut *conn, &data.new_email, user.id).await? {
                return Ok(error_reply(StatusCode::BAD_REQUEST, "Email already in use"));
            }

            services::user::update_email(&mut *conn, user.id, &data.new_email).await?;

            Ok(warp::reply::json(&EmailUpdated {
                msg: "Email updated successfully".to_string(),
                email: data.new_email,
            })
            .into_response())
        })
    })
    .await
}

async fn upload_avatar(
    pool: SqlitePool,
    user: User,
    form: FormFields,
) -> Result<impl warp::Reply, warp::Rejection> {
    with_transaction(pool, move |conn| {
        Box::pin(async move {
            let file = match form.file("avatar") {
                Some(file) => file,
                None => return Ok(error_reply(StatusCode::BAD_REQUEST, "No file uploaded")),
            };
            if !file.is_image() {
                return Ok(error_reply(
                    StatusCode::BAD_REQUEST,
                    "Avatar must be an image file",
                ));
            }

            let pending = file.reserve(UploadKind::Avatar);
            let avatar_url = pending.path().to_string();
            services::user::update_avatar(&mut *conn, user.id, &avatar_url).await?;
            pending.write().await?;

            Ok(warp::reply::json(&AvatarUploaded { avatar_url }).into_response())
        })
    })
    .await
}

async fn delete_account(
    pool: SqlitePool,
    user: User,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut conn = bail_if_err!(pool.acquire().await.map_err(anyhow::Error::from));

    // cascades memberships, materials, saves and reports
    bail_if_err!(services::user::delete(&mut conn, user.id).await);

    log::debug!("account {} deleted", user.id);

    Ok(warp::reply::json(&StatusMessage::new("Account deleted successfully")).into_response())
}

pub fn routes(
    pool: SqlitePool,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register_route = warp::path!("auth" / "register")
        .and(warp::post())
        .and(with_db(pool.clone()))
        .and(json_body::<Register>())
        .and_then(register);

    let login_route = warp::path!("auth" / "login")
        .and(warp::post())
        .and(with_db(pool.clone()))
        .and(json_body::<Login>())
        .and_then(login);

    let me_route = warp::path!("auth" / "me")
        .and(warp::get())
        .and(with_db(pool.clone()))
        .and(ensure_authorized(pool.clone()))
        .and_then(me);

    let update_profile_route = warp::path!("auth" / "profile")
        .and(warp::put())
        .and(json_body::<UpdateProfile>())
        .and(with_db(pool.clone()))
        .and(ensure_authorized(pool.clone()))
        .and_then(update_profile);

    let update_password_route = warp::path!("auth" / "password")
        .and(warp::put())
        .and(json_body::<UpdatePassword>())
        .and(with_db(pool.clone()))
        .and(ensure_authorized(pool.clone()))
        .and_then(update_password);

    let update_email_route = warp::path!("auth" / "email")
        .and(warp::put())
        .and(json_body::<UpdateEmail>())
        .and(with_db(pool.clone()))
        .and(ensure_authorized(pool.clone()))
        .and_then(update_email);

    let upload_avatar_route = warp::path!("auth" / "avatar")
        .and(warp::post())
        .and(with_db(pool.clone()))
        .and(ensure_authorized(pool.clone()))
        .and(utils::multipart())
        .and_then(upload_avatar);

    let delete_account_route = warp::path!("auth" / "account")
        .and(warp::delete())
        .and(with_db(pool.clone()))
        .and(ensure_authorized(pool))
        .and_then(delete_account);

    register_route
        .or(login_route)
        .or(me_route)
        .or(update_profile_route)
        .or(update_password_route)
        .or(update_email_route)
        .or(upload_avatar_route)
        .or(delete_account_route)
}
