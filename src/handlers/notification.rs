use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::{
    dto::{MessageResponse, NotificationList},
    errors::AppError,
    service::{self, notification::NotificationStore},
};

#[get("/notifications")]
pub async fn list(req: HttpRequest, store: web::Data<dyn NotificationStore>) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let (notifications, unread_count) = futures::try_join!(
        store.list(user_auth_data.user_id),
        store.unread_count(user_auth_data.user_id),
    )?;
    Ok(HttpResponse::Ok().json(NotificationList {
        unread_count,
        notifications,
    }))
}

#[post("/notifications/read")]
pub async fn mark_all_read(req: HttpRequest, store: web::Data<dyn NotificationStore>) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let updated = store.mark_all_read(user_auth_data.user_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("{updated} notifications marked as read"))))
}

#[post("/notifications/{id}/read")]
pub async fn mark_read(
    req: HttpRequest,
    id: web::Path<Uuid>,
    store: web::Data<dyn NotificationStore>,
) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let notification = store.mark_read(user_auth_data.user_id, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(notification))
}

#[delete("/notifications/{id}")]
pub async fn delete(
    req: HttpRequest,
    id: web::Path<Uuid>,
    store: web::Data<dyn NotificationStore>,
) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    store.delete(user_auth_data.user_id, id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(mark_all_read)
        .service(mark_read)
        .service(delete);
}
