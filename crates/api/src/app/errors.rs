use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use stockroom_core::DomainError;

use crate::app::views;

/// Map a domain failure to an HTML error page.
///
/// Store failures are logged in full but rendered generically.
pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::NotFound => html_error(StatusCode::NOT_FOUND, "Not found", "product not found"),
        DomainError::Conflict(msg) => {
            tracing::warn!(%msg, "write conflict");
            html_error(
                StatusCode::CONFLICT,
                "Conflict",
                "the product was changed by someone else; reload and try again",
            )
        }
        DomainError::Persistence(msg) => {
            tracing::error!(%msg, "store failure");
            html_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server error",
                "something went wrong, please try again later",
            )
        }
        e @ (DomainError::Validation(_)
        | DomainError::InvalidQuantity(_)
        | DomainError::InsufficientStock { .. }) => {
            html_error(StatusCode::UNPROCESSABLE_ENTITY, "Invalid input", e.to_string())
        }
    }
}

pub fn html_error(status: StatusCode, title: &str, message: impl Into<String>) -> Response {
    (status, Html(views::error_page(title, &message.into()))).into_response()
}

pub fn not_found() -> Response {
    html_error(StatusCode::NOT_FOUND, "Not found", "product not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn conflict_is_409_html() {
        let res = domain_error_to_response(DomainError::Conflict("stale version".to_string()));
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert!(
            res.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
    }

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            domain_error_to_response(DomainError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            domain_error_to_response(DomainError::Persistence("disk full".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            domain_error_to_response(DomainError::InvalidQuantity(0)).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
