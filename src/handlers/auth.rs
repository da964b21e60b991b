use actix_web::{post, web, HttpRequest, HttpResponse};
use log::info;

use crate::{
    dto::{LoginUserRequest, MessageResponse, RegisterRequest},
    errors::AppError,
    service::{self, user::TokenSettings},
    PGPool,
};

#[post("/auth/register")]
pub async fn register(
    dto: web::Json<RegisterRequest>,
    tokens: web::Data<TokenSettings>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let response = service::user::register(dto.into_inner(), &tokens, conn).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/auth/login")]
pub async fn login(
    dto: web::Json<LoginUserRequest>,
    tokens: web::Data<TokenSettings>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let response = service::user::login(dto.into_inner(), &tokens, conn).await?;
    info!("RESPONSE /AUTH/LOGIN: {}", response.message);
    Ok(HttpResponse::Ok().json(response))
}

#[post("/auth/logout")]
pub async fn logout(req: HttpRequest, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    service::user::logout(&user_auth_data, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Logout successful")))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(logout);
}
