use actix_web::{get, put, web, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::{dto::UpdateProfileDto, errors::AppError, service, PGPool};

#[get("/users/me")]
pub async fn me(req: HttpRequest, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let profile = service::user::me(&user_auth_data, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[put("/users/me")]
pub async fn update_me(
    req: HttpRequest,
    dto: web::Json<UpdateProfileDto>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let profile = service::user::update_profile(&user_auth_data, dto.into_inner(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

// /users/me/parties
#[get("/users/me/parties")]
pub async fn get_user_parties(req: HttpRequest, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let parties = service::party::user_parties(&user_auth_data, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(parties))
}

#[get("/users/me/parties/upcoming")]
pub async fn get_upcoming_user_parties(req: HttpRequest, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let parties =
        service::party::upcoming_user_parties(&user_auth_data, Utc::now(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(parties))
}

#[get("/users/me/attending")]
pub async fn get_attending(req: HttpRequest, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let parties = service::party::attending_parties(&user_auth_data, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(parties))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(me)
        .service(update_me)
        .service(get_upcoming_user_parties)
        .service(get_user_parties)
        .service(get_attending);
}
