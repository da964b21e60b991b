use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use log::{debug, warn};

use crate::{db, errors::AppError, PGPool};

#[derive(Debug, Clone, PartialEq)]
pub struct UserAuthData {
    pub user_id: uuid::Uuid,
    pub username: String,
}

/// Auth data of a request that must be authenticated.
pub fn required(req: &HttpRequest) -> Result<UserAuthData, AppError> {
    optional(req).ok_or(AppError::Unauthorized)
}

pub fn optional(req: &HttpRequest) -> Option<UserAuthData> {
    req.extensions().get::<UserAuthData>().cloned()
}

/// Attaches [`UserAuthData`] to requests carrying a valid bearer token.
///
/// Requests without a token, or with a token that is expired, badly signed or
/// no longer stored for its user, pass through anonymously; handlers that
/// need a user reject them.
pub struct AuthMiddleware {
    pub db_pool: PGPool,
    pub secret: String,
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            db_pool: self.db_pool.clone(),
            secret: self.secret.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    db_pool: PGPool,
    secret: String,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let pool = self.db_pool.clone();
        let claims = jwt::parse_request(req.request(), jwt::BEARER)
            .and_then(|token| jwt::decode_claims(&self.secret, &token).map(|c| (token, c)));

        Box::pin(async move {
            if let Ok((token, claims)) = claims {
                match db::user::token_matches(claims.user_id, &token, &pool).await {
                    Ok(true) => {
                        req.extensions_mut().insert(UserAuthData {
                            user_id: claims.user_id,
                            username: claims.username,
                        });
                    }
                    Ok(false) => debug!("token of {} is no longer active", claims.username),
                    Err(err) => {
                        warn!("token lookup failed: {:?}", err);
                        return Err(AppError::InternalError.into());
                    }
                }
            }
            service.call(req).await
        })
    }
}

pub mod jwt {
    use actix_web::HttpRequest;
    use chrono::Utc;
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

    use crate::{dto::Claims, errors::AppError};

    pub const BEARER: &str = "Bearer ";

    pub fn create(secret: &str, user_id: &uuid::Uuid, username: &str, ttl_secs: i64) -> Result<String, AppError> {
        let exp = usize::try_from(Utc::now().timestamp() + ttl_secs).map_err(|_| AppError::InternalError)?;
        let claims = Claims::new(user_id, username, exp);
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|_| AppError::InternalError)
    }

    /// Fails with `Unauthorized` on a bad signature or an expired token.
    pub fn decode_claims(secret: &str, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    pub fn parse_request(req: &HttpRequest, prefix: &str) -> Result<String, AppError> {
        req.headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(prefix))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized)
    }
}
