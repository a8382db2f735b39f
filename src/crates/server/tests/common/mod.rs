use actix_web::web;
use config::Config;
use infra::config::AppConfigImpl;
use server::AppState;

/// Fresh in-memory database per call, with a cheap bcrypt cost.
pub async fn state_with(overrides: &[(&str, &str)]) -> web::Data<AppState> {
    let mut builder = Config::builder()
        .set_override("database.url", "sqlite::memory:")
        .unwrap()
        .set_override("auth.salt_cost", 4)
        .unwrap()
        .set_override("auth.jwt_secret_key", "test-secret")
        .unwrap();
    for (key, value) in overrides {
        builder = builder.set_override(*key, *value).unwrap();
    }
    let app_cfg = AppConfigImpl::load_from(builder.build().unwrap()).unwrap();

    let db = AppState::init_db(app_cfg.database()).await.unwrap();
    web::Data::new(AppState::new(db, app_cfg))
}

pub async fn state() -> web::Data<AppState> {
    state_with(&[]).await
}

pub fn user_json(login: &str, is_admin: bool) -> serde_json::Value {
    serde_json::json!({
        "login": login,
        "password": "s3cret",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "isAdmin": is_admin,
    })
}
