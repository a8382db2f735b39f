use crate::{consts, AppState};
use actix_web::{web, HttpResponse};
use log::warn;
use sea_orm::{ConnectionTrait, Statement};
use serde_json::json;

async fn health(state: web::Data<AppState>) -> HttpResponse {
    let backend = state.db.get_database_backend();
    match state
        .db
        .execute(Statement::from_string(backend, "SELECT 1".to_owned()))
        .await
    {
        Ok(_) => HttpResponse::Ok().json(json!({ "status": "ok" })),
        Err(e) => {
            warn!("health probe failed: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({ "status": "unavailable" }))
        }
    }
}

pub fn configure_service(cfg: &mut web::ServiceConfig) {
    cfg.route(consts::URL_PATH_HEALTH, web::get().to(health));
}
