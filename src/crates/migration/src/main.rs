use env_logger::Env;
use sea_orm_migration::prelude::*;

#[async_std::main]
async fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    if std::env::var("DATABASE_URL").is_err() {
        log::warn!("DATABASE_URL is not set, pass -u <url> to select the users database");
    }
    cli::run_cli(migration::Migrator).await;
}
