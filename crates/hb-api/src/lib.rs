//! # hb-api
//!
//! The web routing and orchestration layer for Houseboard.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;
use hb_core::validate::{MAX_CONTENT_LEN, MAX_HOUSE_NAME_LEN, MAX_NICKNAME_LEN, MAX_TITLE_LEN};

pub use error::ApiError;
pub use handlers::AppState;

/// Largest url-encoded form body accepted. A character is at most 4 UTF-8
/// bytes and each byte at most 3 once percent-encoded; 1 KiB covers field
/// names, separators and a tripcode.
pub const MAX_FORM_BYTES: usize =
    (MAX_CONTENT_LEN + MAX_TITLE_LEN + MAX_NICKNAME_LEN + MAX_HOUSE_NAME_LEN) * 4 * 3 + 1024;

/// Configures the routes for the forum.
///
/// `/house/new` is registered before `/house/{house_id}` so the literal path wins.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().limit(MAX_FORM_BYTES))
        // House list
        .route("/", web::get().to(handlers::index))
        // New house form and submission
        .service(
            web::resource("/house/new")
                .route(web::get().to(handlers::new_house_form))
                .route(web::post().to(handlers::create_house)),
        )
        // House view with its threads
        .route("/house/{house_id}", web::get().to(handlers::view_house))
        // New thread form and submission
        .service(
            web::resource("/house/{house_id}/thread/new")
                .route(web::get().to(handlers::new_thread_form))
                .route(web::post().to(handlers::create_thread)),
        )
        // Thread view: opening post, replies, reply form
        .route("/thread/{thread_id}", web::get().to(handlers::view_thread))
        // Reply endpoint
        .route("/post/{post_id}/reply", web::post().to(handlers::create_reply));
}
