use std::path::PathBuf;

use axum::{
    Router,
    http::{HeaderValue, header},
    middleware,
    routing::{get, post},
};
use time::Duration;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, TraceLayer};
use tower_sessions::{Expiry, SessionManagerLayer, cookie::SameSite};
use tracing::Level;

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{account, messages, threads};

const SESSION_LIFETIME: Duration = Duration::hours(12);

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com";

/// Settings for the HTTP layer that do not belong in [`AppState`].
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub static_dir: PathBuf,
    pub secure_cookies: bool,
}

/// Builds the complete application router.
pub fn app(state: AppState, config: &WebConfig) -> Router {
    let session_layer = SessionManagerLayer::new(state.sessions.clone())
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(SESSION_LIFETIME));

    let public_routes = Router::new()
        .route("/", get(threads::home))
        .route(
            "/account/create",
            get(account::create_form).post(account::create),
        )
        .route(
            "/account/login",
            get(account::login_form).post(account::login),
        )
        .route("/thread/view/{id}", get(threads::view));

    let protected_routes = Router::new()
        .route("/account/view/{id}", get(account::view))
        .route("/account/logout", post(account::logout))
        .route(
            "/thread/create",
            get(threads::create_form).post(threads::create),
        )
        .route(
            "/thread/view/{id}/message/create",
            get(messages::create_form).post(messages::create),
        )
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(session_layer)
        .with_state(state)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("deny"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("0"),
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO)),
        )
}
