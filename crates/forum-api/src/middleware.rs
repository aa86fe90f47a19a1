use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::session::{CurrentUser, authenticated_user};

/// Sends anonymous visitors to the login page. Logged-in requests get the
/// user id as a [`CurrentUser`] extension and an uncacheable response.
pub async fn require_auth(
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(user_id) = authenticated_user(&session).await? else {
        return Ok(Redirect::to("/account/login").into_response());
    };

    req.extensions_mut().insert(CurrentUser(user_id));

    let mut res = next.run(req).await;
    res.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(res)
}
