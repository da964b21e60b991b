use actix_web::{
    error,
    http::StatusCode,
    HttpResponse,
};
use derive_more::Display;
use log::error;

#[derive(Debug, Display, PartialEq, Eq, serde::Serialize)]
pub enum AppError {
    #[display(fmt = "internal error")]
    InternalError,

    #[display(fmt = "{}", _0)]
    BadClientData(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "unauthorized")]
    Unauthorized,

    #[display(fmt = "not authorized to modify this party")]
    Forbidden,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadClientData(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// `Conflict(msg)` for a unique-constraint violation, the usual mapping otherwise.
    pub fn conflict_on_unique(err: sqlx::Error, msg: impl Into<String>) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(msg.into()),
            other => other.into(),
        }
    }
}

impl std::error::Error for AppError {}

impl error::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "message": self.to_string() }))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadClientData(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::not_found("not found"),
            other => {
                error!("database error: {:?}", other);
                AppError::InternalError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::InternalError, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(AppError::bad_request("title is required"), StatusCode::BAD_REQUEST)]
    #[case(AppError::not_found("party not found"), StatusCode::NOT_FOUND)]
    #[case(AppError::Conflict("username taken".into()), StatusCode::CONFLICT)]
    #[case(AppError::Unauthorized, StatusCode::UNAUTHORIZED)]
    #[case(AppError::Forbidden, StatusCode::FORBIDDEN)]
    fn maps_to_status(#[case] err: AppError, #[case] expected: StatusCode) {
        assert_eq!(err.status_code(), expected);
        assert_eq!(err.error_response().status(), expected);
    }

    #[test]
    fn message_is_carried_verbatim() {
        assert_eq!(AppError::bad_request("title is required").to_string(), "title is required");
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err, AppError::not_found("not found"));
    }

    #[derive(Debug)]
    struct UniqueViolation;

    impl std::fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint \"users_username_key\"")
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl sqlx::error::DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err = sqlx::Error::Database(Box::new(UniqueViolation));
        assert_eq!(
            AppError::conflict_on_unique(err, "username 'anna' is already taken"),
            AppError::Conflict("username 'anna' is already taken".into())
        );
    }

    #[test]
    fn conflict_mapping_leaves_other_errors_alone() {
        assert_eq!(
            AppError::conflict_on_unique(sqlx::Error::PoolTimedOut, "taken"),
            AppError::InternalError
        );
        assert_eq!(
            AppError::conflict_on_unique(sqlx::Error::RowNotFound, "taken"),
            AppError::not_found("not found")
        );
    }

    #[test]
    fn other_store_errors_are_internal() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err, AppError::InternalError);
    }
}
