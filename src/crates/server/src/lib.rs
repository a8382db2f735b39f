pub mod auth;
pub mod consts;
pub mod error;
pub mod health;
pub mod middleware;
pub mod policy;
pub mod users;

use crate::auth::RateLimiter;
use actix_web::web;
use application::auth::{AuthService, PasswordHasher, TokenService};
use application::command::user::UserAppService;
use application::query::user::UserQueryService;
use domain::user::UserRepository;
use infra::auth::{BcryptPasswordHasher, JwtTokenService};
use infra::config::{AppConfigImpl, DatabaseConfig};
use infra::repository::sql::user::UserRepositoryImpl;
use log::{info, warn};
use parking_lot::Mutex;
use rand::Rng;
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;

pub struct AppState {
    pub app_cfg: AppConfigImpl,
    pub db: DatabaseConnection,
    pub user_service: UserAppService,
    pub user_query: UserQueryService,
    pub auth_service: AuthService,
    pub login_limiter: Mutex<RateLimiter>,
}

impl AppState {
    pub async fn init_db(cfg: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
        infra::db::connect(cfg).await
    }

    pub fn new(db: DatabaseConnection, app_cfg: AppConfigImpl) -> Self {
        let user_repo: Arc<dyn UserRepository> = Arc::new(UserRepositoryImpl::new(db.clone()));
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptPasswordHasher::from_config(&app_cfg));
        let token_svc: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_config(&app_cfg));

        let login_limiter = Mutex::new(RateLimiter::new(
            app_cfg.auth.login_max_attempts,
            app_cfg.auth.login_window_secs,
        ));

        Self {
            user_service: UserAppService::new(user_repo.clone(), hasher.clone()),
            user_query: UserQueryService::new(user_repo.clone()),
            auth_service: AuthService::new(user_repo, hasher, token_svc),
            login_limiter,
            app_cfg,
            db,
        }
    }

    pub fn require_token(&self) -> bool {
        self.app_cfg.require_token()
    }
}

/// Creates the configured admin account when the users table is empty.
pub async fn init_admin_user(state: &AppState) {
    let Some(login) = state.app_cfg.auth.admin_login.clone() else {
        return;
    };

    let (password, generated) = match state.app_cfg.auth.admin_password.clone() {
        Some(p) => (p, false),
        None => {
            let p: String = rand::thread_rng()
                .sample_iter(&rand::distributions::Alphanumeric)
                .take(consts::GENERATED_PASSWORD_LEN)
                .map(char::from)
                .collect();
            (p, true)
        }
    };

    match state.user_service.bootstrap_admin(&login, &password).await {
        Ok(Some(admin)) => {
            info!("===========================================");
            info!("  Admin user created (id={})", admin.id);
            info!("  Login: {}", admin.login);
            if generated {
                info!("  Password: {}", password);
                info!("  Please change the password after login!");
            }
            info!("===========================================");
        }
        Ok(None) => info!("Users already exist, skipping admin creation"),
        Err(e) => warn!("Failed to create admin user: {}", e),
    }
}

/// Routes plus extractor error handlers; shared by `main` and the tests.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(error::json_config())
        .app_data(error::path_config())
        .configure(health::configure_service)
        .configure(users::configure_service);
}
