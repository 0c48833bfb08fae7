//! HTTP mapping for [`AppError`].
//!
//! Status codes are the contract; the rendered message is only a courtesy.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use askama::Template;
use hb_core::error::AppError;
use hb_ui::ErrorTemplate;

#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    Render(askama::Error),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::App(err)
    }
}

impl From<askama::Error> for ApiError {
    fn from(err: askama::Error) -> Self {
        ApiError::Render(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::App(err) => write!(f, "{err}"),
            ApiError::Render(err) => write!(f, "template error: {err}"),
        }
    }
}

impl ApiError {
    /// Text shown to the user. Internal failures stay vague.
    fn public_message(&self) -> String {
        match self {
            ApiError::App(AppError::Validation(msg)) => msg.clone(),
            ApiError::App(AppError::DuplicateName(name)) => {
                format!("House name {name:?} is already taken")
            }
            ApiError::App(AppError::NotFound(kind, _)) => format!("{kind} not found"),
            ApiError::App(AppError::Store(_)) | ApiError::Render(_) => {
                "Something went wrong, please try again later".to_string()
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::App(AppError::Validation(_)) | ApiError::App(AppError::DuplicateName(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::App(AppError::NotFound(..)) => StatusCode::NOT_FOUND,
            ApiError::App(AppError::Store(_)) | ApiError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("request failed: {self}");
        } else {
            log::debug!("request rejected: {self}");
        }

        let message = self.public_message();
        let page = ErrorTemplate { status: status.as_u16(), message: &message };
        match page.render() {
            Ok(html) => HttpResponse::build(status)
                .content_type("text/html; charset=utf-8")
                .body(html),
            Err(err) => {
                log::error!("error page failed to render: {err}");
                HttpResponse::build(status).body(message)
            }
        }
    }
}
