use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::{
    dto::{JoinPartyDto, MessageResponse, NewCommentDto, NewPartyDto, SearchQuery, UpdatePartyDto},
    errors::AppError,
    service::{
        self,
        engagement::Engagement,
        filter::PartyFilter,
        notification::NotificationStore,
        party::JoinOutcome,
    },
    PGPool,
};

#[get("/parties")]
pub async fn get_all(filter: web::Query<PartyFilter>, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let now = filter.caller_now(Utc::now())?;
    let parties = service::party::get_all_public(&filter, &now, conn).await?;
    Ok(HttpResponse::Ok().json(parties))
}

#[get("/parties/search")]
pub async fn search(query: web::Query<SearchQuery>, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let parties = service::party::search(query.query.as_deref(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(parties))
}

#[get("/parties/{id}")]
pub async fn get_by_id(req: HttpRequest, id: web::Path<Uuid>, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let viewer = service::auth::optional(&req);
    let details = service::party::get_details(id.into_inner(), viewer.as_ref(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(details))
}

#[post("/parties")]
pub async fn create(
    req: HttpRequest,
    new_party_dto: web::Json<NewPartyDto>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let party = service::party::create(&user_auth_data, new_party_dto.into_inner(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Created()
        .insert_header(("Location", format!("/api/parties/{}", party.id)))
        .json(party))
}

#[put("/parties/{id}")]
pub async fn update(
    req: HttpRequest,
    id: web::Path<Uuid>,
    update_party_dto: web::Json<UpdatePartyDto>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let party = service::party::update(
        id.into_inner(),
        update_party_dto.into_inner(),
        &user_auth_data,
        pool_state.get_ref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(party))
}

#[delete("/parties/{id}")]
pub async fn delete(req: HttpRequest, id: web::Path<Uuid>, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    service::party::delete(id.into_inner(), &user_auth_data, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Party deleted successfully")))
}

#[post("/parties/join")]
pub async fn join(
    req: HttpRequest,
    dto: web::Json<JoinPartyDto>,
    pool_state: web::Data<PGPool>,
    notifications: web::Data<dyn NotificationStore>,
) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let (outcome, party) = service::party::join_by_access_id(
        &dto.access_id,
        &user_auth_data,
        pool_state.get_ref(),
        notifications.get_ref(),
    )
    .await?;
    let message = match outcome {
        JoinOutcome::Joined => "The private party was added to your attendances",
        JoinOutcome::AlreadyAttending => "You are already attending this party",
    };
    info!("{} joined private party {}: {:?}", user_auth_data.username, party.id, outcome);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": message, "party": party })))
}

#[post("/parties/{id}/attendees")]
pub async fn attend(
    req: HttpRequest,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
    notifications: web::Data<dyn NotificationStore>,
) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let joined = service::party::attend(
        id.into_inner(),
        &user_auth_data,
        pool_state.get_ref(),
        notifications.get_ref(),
    )
    .await?;
    let message = if joined {
        "Successfully joined the party"
    } else {
        "You are already attending this party"
    };
    Ok(HttpResponse::Ok().json(MessageResponse::new(message)))
}

#[delete("/parties/{id}/attendees")]
pub async fn cancel_attendance(req: HttpRequest, id: web::Path<Uuid>, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    service::party::cancel_attendance(id.into_inner(), &user_auth_data, pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Successfully canceled attendance")))
}

async fn toggle(
    kind: Engagement,
    req: HttpRequest,
    id: Uuid,
    pool: &PGPool,
    notifications: &dyn NotificationStore,
) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let state = service::engagement::toggle(kind, id, &user_auth_data, pool, notifications).await?;
    Ok(HttpResponse::Ok().json(state))
}

#[put("/parties/{id}/like")]
pub async fn toggle_like(
    req: HttpRequest,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
    notifications: web::Data<dyn NotificationStore>,
) -> Result<HttpResponse, AppError> {
    toggle(Engagement::Like, req, id.into_inner(), pool_state.get_ref(), notifications.get_ref()).await
}

#[put("/parties/{id}/attendance")]
pub async fn toggle_attendance(
    req: HttpRequest,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
    notifications: web::Data<dyn NotificationStore>,
) -> Result<HttpResponse, AppError> {
    toggle(Engagement::Attendance, req, id.into_inner(), pool_state.get_ref(), notifications.get_ref()).await
}

#[get("/parties/{id}/comments")]
pub async fn get_comments(req: HttpRequest, id: web::Path<Uuid>, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let viewer = service::auth::optional(&req);
    let comments = service::party::list_comments(id.into_inner(), viewer.as_ref(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(comments))
}

#[post("/parties/{id}/comments")]
pub async fn add_comment(
    req: HttpRequest,
    id: web::Path<Uuid>,
    dto: web::Json<NewCommentDto>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let user_auth_data = service::auth::required(&req)?;
    let comment =
        service::party::add_comment(id.into_inner(), &dto.comment, &user_auth_data, pool_state.get_ref()).await?;
    Ok(HttpResponse::Created().json(comment))
}

#[get("/genres")]
pub async fn get_genres(pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let genres = service::party::genres(pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(genres))
}

#[get("/locations")]
pub async fn get_locations(pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let locations = service::party::locations(pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(locations))
}

#[get("/map/markers")]
pub async fn get_markers(req: HttpRequest, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let viewer = service::auth::optional(&req);
    let markers = service::party::map_markers(viewer.as_ref(), pool_state.get_ref()).await?;
    Ok(HttpResponse::Ok().json(markers))
}

/// `search` and `join` go before the `{id}` routes.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(search)
        .service(join)
        .service(get_all)
        .service(create)
        .service(get_by_id)
        .service(update)
        .service(delete)
        .service(attend)
        .service(cancel_attendance)
        .service(toggle_like)
        .service(toggle_attendance)
        .service(get_comments)
        .service(add_comment)
        .service(get_genres)
        .service(get_locations)
        .service(get_markers);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{lazy_pool, user};
    use actix_web::{dev::Service, http::StatusCode, test, App, HttpMessage};

    #[actix_rt::test]
    async fn empty_search_is_a_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .service(web::scope("/api").configure(init_routes)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/parties/search?query=%20").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "search query cannot be empty");
    }

    #[actix_rt::test]
    async fn unknown_date_selector_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .service(web::scope("/api").configure(init_routes)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/parties?date=yesterday").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn out_of_range_time_zone_offset_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .service(web::scope("/api").configure(init_routes)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/parties?date=today&tz_offset_minutes=1500")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "tz_offset_minutes out of range");
    }

    #[actix_rt::test]
    async fn creating_requires_a_user() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .service(web::scope("/api").configure(init_routes)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/parties")
            .set_json(serde_json::json!({
                "title": "Rooftop",
                "location": "Zürich",
                "datetime": "2024-06-01T20:00:00Z"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn blank_title_is_rejected_before_storing() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(user("anna"));
                    srv.call(req)
                })
                .service(web::scope("/api").configure(init_routes)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/parties")
            .set_json(serde_json::json!({
                "title": "  ",
                "location": "Zürich",
                "datetime": "2024-06-01T20:00:00Z"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "title is required");
    }

    #[actix_rt::test]
    async fn blank_comment_is_rejected_before_storing() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(user("anna"));
                    srv.call(req)
                })
                .service(web::scope("/api").configure(init_routes)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/parties/{}/comments", Uuid::new_v4()))
            .set_json(serde_json::json!({ "comment": "   " }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
