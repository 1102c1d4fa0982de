mod config;
mod db;
mod error;
mod forms;
mod services;

use crate::config::Settings;
use crate::db::Database;
use actix_web::{App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let settings = Settings::load().map_err(io::Error::other)?;
    let key = settings.envelope_key().map_err(io::Error::other)?;
    let database = Database::open(&settings.database_path).map_err(io::Error::other)?;
    info!("Connected to SQLite database at {}", settings.database_path);

    let bind = (settings.host.clone(), settings.port);
    info!(
        "Server running at http://{}:{} ({:?} mode)",
        bind.0, bind.1, settings.mode
    );

    HttpServer::new(move || {
        App::new().configure(|cfg| services::configure(cfg, &settings, &database, key.as_ref()))
    })
    .bind(bind)?
    .run()
    .await
}
