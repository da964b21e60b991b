pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;

use std::{io, sync::Arc};

use actix_web::{web, App, HttpServer};
use log::info;
use sqlx::{postgres::Postgres, Pool};

use config::{Config, NotificationBackend};
use db::init_db_pool;
use service::{
    auth::AuthMiddleware,
    log::{init_logger, LoggerMiddleware},
    notification::{MemoryNotificationStore, NotificationStore, PgNotificationStore},
    user::TokenSettings,
};

pub type PGPool = Pool<Postgres>;

fn notification_store(backend: NotificationBackend, pool: &PGPool) -> Arc<dyn NotificationStore> {
    match backend {
        NotificationBackend::Postgres => Arc::new(PgNotificationStore::new(pool.clone())),
        NotificationBackend::Memory => Arc::new(MemoryNotificationStore::new()),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    init_logger();
    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let pool: PGPool = init_db_pool(&config.database_url, config.max_connections)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let notifications: web::Data<dyn NotificationStore> =
        web::Data::from(notification_store(config.notifications, &pool));
    let tokens = web::Data::new(TokenSettings {
        secret: config.jwt_secret.clone(),
        ttl_secs: config.token_ttl_secs,
    });

    info!(
        "starting server on {}:{} ({:?} notifications)",
        config.host, config.port, config.notifications
    );
    let secret = config.jwt_secret.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(tokens.clone())
            .app_data(notifications.clone())
            .wrap(AuthMiddleware {
                db_pool: pool.clone(),
                secret: secret.clone(),
            })
            .wrap(LoggerMiddleware)
            .configure(handlers::config)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
