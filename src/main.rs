use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use infra::config::{AppConfigImpl, LogConfig};
use log::info;
use log4rs::{
    append::{console::ConsoleAppender, file::FileAppender},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::io;

use server::middleware::other;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {m}{n}";

// 配置日志同时输出到控制台和文件
fn init_logging(log_cfg: &LogConfig) -> io::Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| log_cfg.level.clone());

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&log_cfg.file)?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .appender(Appender::builder().build(
            "stdout",
            Box::new(
                ConsoleAppender::builder()
                    .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
                    .build(),
            ),
        ))
        .build(
            Root::builder()
                .appender("file")
                .appender("stdout")
                .build(log_level.parse().unwrap_or(log::LevelFilter::Info)),
        )
        .map_err(io::Error::other)?;

    log4rs::init_config(config).map_err(io::Error::other)?;
    Ok(())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cfg = AppConfigImpl::load().map_err(io::Error::other)?;
    init_logging(&cfg.log)?;

    let server_cfg = cfg.server();
    let db = server::AppState::init_db(cfg.database())
        .await
        .map_err(io::Error::other)?;

    let app_state = server::AppState::new(db, cfg);
    server::init_admin_user(&app_state).await;
    let app_state = web::Data::new(app_state);

    info!("Listening on {}:{}", server_cfg.host, server_cfg.port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .configure(server::configure_app)
            .wrap(other::cors())
    })
    .bind((server_cfg.host.as_str(), server_cfg.port))?
    .run()
    .await
}
