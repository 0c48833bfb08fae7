//! houseboard/crates/hb-api/src/middleware.rs Middleware
//!
//! Request logging, CORS and security headers wrapped around every route.

use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};

/// Returns a standard request logger for the Houseboard API.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

/// Configures CORS (Cross-Origin Resource Sharing).
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .max_age(3600)
}

/// Headers added to every response.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
        .add(("Content-Security-Policy", "default-src 'self'"))
        .add(("X-Frame-Options", "DENY"))
}
