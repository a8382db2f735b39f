use crate::auth;
use crate::error::ApiError;
use crate::middleware::jwt_verify::{claims_from_request, JwtVerifier};
use crate::policy::{self, Access};
use crate::{consts, AppState};
use actix_web::{web, web::Json, web::Path, HttpRequest, HttpResponse};
use application::command::user::{RegisterUserCmd, UpdateUserCmd};
use chrono::{DateTime, Utc};
use domain::user::User;
use domain::value::UserId;
use serde::{Deserialize, Serialize};

/// User as returned to clients; the password hash never leaves the server.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.value(),
            login: user.login,
            first_name: user.first_name,
            last_name: user.last_name,
            is_admin: user.is_admin,
            created_at: user.created_at.and_utc(),
            updated_at: user.updated_at.and_utc(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub login: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: i32,
}

async fn list_users(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    policy::authorize(state.require_token(), policy::caller(&req).as_ref(), Access::Read)?;
    let users = state.user_query.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn get_user(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: Path<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    policy::authorize(state.require_token(), policy::caller(&req).as_ref(), Access::Read)?;
    let user = state.user_query.get_user(UserId::from(path.into_inner())).await?;
    Ok(Json(user.into()))
}

async fn register(
    req: HttpRequest,
    state: web::Data<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    // 注册不经过 JwtVerifier，只有申请 admin 时才看 token
    if body.is_admin && state.require_token() {
        let caller = claims_from_request(&req, &state).await?;
        policy::authorize(true, caller.as_ref(), Access::GrantAdmin)?;
    }
    let user = state
        .user_service
        .register(RegisterUserCmd {
            login: body.login,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            is_admin: body.is_admin,
        })
        .await?;
    Ok(Json(user.into()))
}

async fn update_user(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: Path<i32>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = UserId::from(path.into_inner());
    let caller = policy::caller(&req);
    policy::authorize(state.require_token(), caller.as_ref(), Access::Manage(id))?;
    if body.is_admin.is_some() {
        policy::authorize(state.require_token(), caller.as_ref(), Access::GrantAdmin)?;
    }
    let user = state
        .user_service
        .update_user(
            id,
            UpdateUserCmd {
                login: body.login,
                password: body.password,
                first_name: body.first_name,
                last_name: body.last_name,
                is_admin: body.is_admin,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

async fn delete_user(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = UserId::from(path.into_inner());
    policy::authorize(
        state.require_token(),
        policy::caller(&req).as_ref(),
        Access::Manage(id),
    )?;
    state.user_service.delete_user(id).await?;
    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: "user deleted".to_string(),
        id: id.value(),
    }))
}

/// `/register` and `/login` sit outside `JwtVerifier`, so a stale header never
/// blocks getting a new token. They are registered before the scope so they
/// win the match; other methods on them get 405 from the resource.
pub fn configure_service(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(format!("{}/register", consts::URL_PATH_USERS))
            .route(web::post().to(register)),
    )
    .service(
        web::resource(format!("{}/login", consts::URL_PATH_USERS))
            .route(web::post().to(auth::login)),
    )
    .service(
        web::scope(consts::URL_PATH_USERS)
            .wrap(JwtVerifier {})
            .service(web::resource(["", "/"]).route(web::get().to(list_users)))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_user))
                    .route(web::put().to(update_user))
                    .route(web::delete().to(delete_user)),
            ),
    );
}
